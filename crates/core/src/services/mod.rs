pub mod catalog;
pub mod chart_service;
pub mod refresh;
pub mod report_service;
