pub mod config;
pub mod domain;
pub mod file_record_sink;
pub mod telemetry;
