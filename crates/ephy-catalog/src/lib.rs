pub mod catalog;
pub mod config;
pub mod database;
pub mod enrichment;
pub mod error;
pub mod telemetry;
