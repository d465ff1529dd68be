//! Application error types
//!
//! Unified error handling for the runtime and the command surface.

use std::fmt;

use raid_core::{DomainError, TransportError};

use crate::config::ConfigError;
use crate::telemetry::TracingError;

/// Reply sent for failures the issuer cannot act on
pub const GENERIC_FAILURE_REPLY: &str = "Something went wrong, please try again later";

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Startup errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TracingError),

    #[error("Validation error: {0}")]
    Validation(String),

    // Chat platform errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Background task errors
    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl AppError {
    /// Get error code for logs and replies
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Telemetry(_) => "TELEMETRY_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::TaskFailed(_) => "TASK_FAILED",
            Self::Domain(e) => e.code(),
        }
    }

    /// Check if the issuer of a command caused this (bad input, unknown raid)
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_user_facing())
    }

    /// Short text to reply with when a command fails
    #[must_use]
    pub fn user_message(&self) -> String {
        if self.is_user_facing() {
            self.to_string()
        } else {
            GENERIC_FAILURE_REPLY.to_string()
        }
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(msg: impl fmt::Display) -> Self {
        Self::Validation(msg.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
