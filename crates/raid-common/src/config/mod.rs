//! Configuration structs

mod app_config;

pub use app_config::{
    parse_channel_bindings, AppConfig, AppSettings, ConfigError, Environment, RaidSettings,
};
