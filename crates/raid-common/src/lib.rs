//! # raid-common
//!
//! Shared utilities including configuration, error handling, and telemetry.

pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{
    parse_channel_bindings, AppConfig, AppSettings, ConfigError, Environment, RaidSettings,
};
pub use error::{AppError, AppResult, GENERIC_FAILURE_REPLY};
pub use telemetry::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    TracingConfig, TracingError,
};
