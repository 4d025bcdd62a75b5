pub mod config;
pub mod eligibility;
pub mod error;
pub mod records;
pub mod telemetry;
