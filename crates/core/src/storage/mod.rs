pub mod format;
pub mod history;
pub mod manager;
pub mod seed;
pub mod traits;
