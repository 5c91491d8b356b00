pub mod config;
pub mod error;
pub mod report;
pub mod telemetry;
pub mod workbook;
