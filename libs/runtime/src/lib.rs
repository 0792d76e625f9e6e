//! Process-level plumbing shared by the listings binaries: layered
//! configuration and logging initialization.

pub mod config;
pub mod logging;

pub use config::{AppConfig, CliArgs, DatabaseConfig, LoggingConfig, Section};
pub use logging::init_logging_from_config;
