//! Domain errors - error types for the raid domain
//!
//! The `Display` text doubles as the short message shown to the person who issued
//! the rejected command.

use thiserror::Error;

use crate::traits::TransportError;
use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Raid not found: {0}")]
    RaidNotFound(Snowflake),

    #[error("No raid at position {0}")]
    PositionOutOfRange(usize),

    #[error("Channel {0} is not set up for raids")]
    ChannelNotBound(Snowflake),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Time is in the past")]
    TimeInPast,

    #[error("Raid time must be today")]
    NotToday,

    #[error("Raid can be scheduled at most {days} days ahead")]
    BeyondHorizon { days: i64 },

    #[error("Scheduled raids are not allowed in this channel")]
    ScheduledNotAllowed,

    #[error("Raid has already expired")]
    RaidExpired,

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Get an error code string for logs and replies
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::RaidNotFound(_) => "UNKNOWN_RAID",
            Self::PositionOutOfRange(_) => "UNKNOWN_POSITION",
            Self::ChannelNotBound(_) => "UNKNOWN_CHANNEL",

            // Validation
            Self::EmptyField(_) => "EMPTY_FIELD",
            Self::InvalidTime(_) => "INVALID_TIME",
            Self::TimeInPast => "TIME_IN_PAST",
            Self::NotToday => "NOT_TODAY",
            Self::BeyondHorizon { .. } => "BEYOND_HORIZON",
            Self::ScheduledNotAllowed => "SCHEDULED_NOT_ALLOWED",
            Self::RaidExpired => "RAID_EXPIRED",

            // Infrastructure
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::RaidNotFound(_) | Self::PositionOutOfRange(_) | Self::ChannelNotBound(_)
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyField(_)
                | Self::InvalidTime(_)
                | Self::TimeInPast
                | Self::NotToday
                | Self::BeyondHorizon { .. }
                | Self::ScheduledNotAllowed
                | Self::RaidExpired
        )
    }

    /// Check if the error should be reported back to the user rather than logged
    pub fn is_user_facing(&self) -> bool {
        self.is_not_found() || self.is_validation()
    }
}
