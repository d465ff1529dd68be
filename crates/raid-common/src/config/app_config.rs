//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use raid_core::{ChannelBinding, RaidPolicy, Snowflake};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub raid: RaidSettings,
    /// Sub-spaces where raids are announced
    pub channels: Vec<ChannelBinding>,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Raid engine tuning
#[derive(Debug, Clone)]
pub struct RaidSettings {
    /// Zone raid times are entered and displayed in
    pub timezone: Tz,
    pub sweep_interval: Duration,
    pub immediate_lifetime_hours: i64,
    /// How far back recovery looks in channels that allow scheduled raids
    pub scheduled_lookback_days: i64,
    /// How far ahead a scheduled raid may be announced
    pub scheduled_horizon_days: i64,
    pub recent_message_limit: usize,
    pub reaction_fetch_limit: usize,
    pub capacity_warning: usize,
    pub team_grouping_threshold: usize,
    pub orange_window_minutes: i64,
    /// Sequential lanes inbound events are spread over
    pub dispatch_lanes: usize,
    /// Capacity of the inbound event queue
    pub event_buffer: usize,
}

impl Default for RaidSettings {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            sweep_interval: Duration::from_secs(default_sweep_interval_secs()),
            immediate_lifetime_hours: default_immediate_lifetime_hours(),
            scheduled_lookback_days: default_scheduled_days(),
            scheduled_horizon_days: default_scheduled_days(),
            recent_message_limit: default_fetch_limit(),
            reaction_fetch_limit: default_fetch_limit(),
            capacity_warning: default_roster_threshold(),
            team_grouping_threshold: default_roster_threshold(),
            orange_window_minutes: default_orange_window_minutes(),
            dispatch_lanes: default_dispatch_lanes(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl RaidSettings {
    /// Display and expiry policy derived from these settings
    #[must_use]
    pub fn policy(&self) -> RaidPolicy {
        RaidPolicy {
            immediate_lifetime: chrono::Duration::hours(self.immediate_lifetime_hours),
            orange_window: chrono::Duration::minutes(self.orange_window_minutes),
            capacity_warning: self.capacity_warning,
            team_grouping_threshold: self.team_grouping_threshold,
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "raid-engine".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_timezone() -> Tz {
    chrono_tz::Europe::Prague
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_immediate_lifetime_hours() -> i64 {
    3
}

fn default_scheduled_days() -> i64 {
    14
}

fn default_fetch_limit() -> usize {
    100
}

fn default_roster_threshold() -> usize {
    10
}

fn default_orange_window_minutes() -> i64 {
    15
}

fn default_dispatch_lanes() -> usize {
    16
}

fn default_event_buffer() -> usize {
    1024
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is set to a value that cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Unset keys fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app = AppSettings {
            name: lookup("APP_NAME").unwrap_or_else(default_app_name),
            env: match lookup("APP_ENV") {
                Some(value) => Environment::parse(&value)
                    .ok_or(ConfigError::InvalidValue("APP_ENV", value))?,
                None => default_env(),
            },
        };

        let timezone = match lookup("RAID_TIMEZONE") {
            Some(value) => Tz::from_str(value.trim())
                .map_err(|_| ConfigError::InvalidValue("RAID_TIMEZONE", value))?,
            None => default_timezone(),
        };

        let raid = RaidSettings {
            timezone,
            sweep_interval: Duration::from_secs(parse_or(
                &lookup,
                "RAID_SWEEP_INTERVAL_SECS",
                default_sweep_interval_secs,
            )?),
            immediate_lifetime_hours: parse_or(
                &lookup,
                "RAID_IMMEDIATE_LIFETIME_HOURS",
                default_immediate_lifetime_hours,
            )?,
            scheduled_lookback_days: parse_or(
                &lookup,
                "RAID_SCHEDULED_LOOKBACK_DAYS",
                default_scheduled_days,
            )?,
            scheduled_horizon_days: parse_or(
                &lookup,
                "RAID_SCHEDULED_HORIZON_DAYS",
                default_scheduled_days,
            )?,
            recent_message_limit: parse_or(
                &lookup,
                "RAID_RECENT_MESSAGE_LIMIT",
                default_fetch_limit,
            )?,
            reaction_fetch_limit: parse_or(
                &lookup,
                "RAID_REACTION_FETCH_LIMIT",
                default_fetch_limit,
            )?,
            capacity_warning: parse_or(&lookup, "RAID_CAPACITY_WARNING", default_roster_threshold)?,
            team_grouping_threshold: parse_or(
                &lookup,
                "RAID_TEAM_GROUPING_THRESHOLD",
                default_roster_threshold,
            )?,
            orange_window_minutes: parse_or(
                &lookup,
                "RAID_ORANGE_WINDOW_MINUTES",
                default_orange_window_minutes,
            )?,
            dispatch_lanes: parse_or(&lookup, "RAID_DISPATCH_LANES", default_dispatch_lanes)?,
            event_buffer: parse_or(&lookup, "RAID_EVENT_BUFFER", default_event_buffer)?,
        };

        for (key, is_zero) in [
            ("RAID_SWEEP_INTERVAL_SECS", raid.sweep_interval.is_zero()),
            ("RAID_DISPATCH_LANES", raid.dispatch_lanes == 0),
            ("RAID_EVENT_BUFFER", raid.event_buffer == 0),
        ] {
            if is_zero {
                return Err(ConfigError::InvalidValue(key, "0".to_string()));
            }
        }

        let channels = match lookup("RAID_CHANNELS") {
            Some(value) => parse_channel_bindings(&value)?,
            None => Vec::new(),
        };

        Ok(Self {
            app,
            raid,
            channels,
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: fn() -> T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, value)),
        None => Ok(default()),
    }
}

/// Parse `space:sub[:scheduled]` entries separated by commas
///
/// # Errors
/// Returns `InvalidValue` naming the offending entry
pub fn parse_channel_bindings(value: &str) -> Result<Vec<ChannelBinding>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let invalid = || ConfigError::InvalidValue("RAID_CHANNELS", entry.to_string());
            let mut parts = entry.split(':').map(str::trim);

            let space_id = parts
                .next()
                .and_then(|s| Snowflake::parse(s).ok())
                .ok_or_else(invalid)?;
            let sub_space_id = parts
                .next()
                .and_then(|s| Snowflake::parse(s).ok())
                .ok_or_else(invalid)?;
            let allow_scheduled = match parts.next() {
                None => false,
                Some(flag) if flag.eq_ignore_ascii_case("scheduled") => true,
                Some(_) => return Err(invalid()),
            };
            if parts.next().is_some() {
                return Err(invalid());
            }

            Ok(ChannelBinding::new(space_id, sub_space_id, allow_scheduled))
        })
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
