pub mod chart;
pub mod crypto;
pub mod history;
pub mod report;
pub mod settings;
