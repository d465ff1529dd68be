//! Raid events - notifications delivered by the chat transport
//!
//! The transport may redeliver or drop any of these; handlers are idempotent.

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// All notifications the engine reacts to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RaidEvent {
    // =========================================================================
    // Reaction Events
    // =========================================================================
    ReactionAdded(ReactionEvent),
    ReactionRemoved(ReactionEvent),

    // =========================================================================
    // Message Events
    // =========================================================================
    MessageDeleted(MessageDeletedEvent),

    // =========================================================================
    // Space / Connection Events
    // =========================================================================
    SpaceAvailable(SpaceAvailableEvent),
    Connected,
    Disconnected,
}

impl RaidEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ReactionAdded(_) => "REACTION_ADDED",
            Self::ReactionRemoved(_) => "REACTION_REMOVED",
            Self::MessageDeleted(_) => "MESSAGE_DELETED",
            Self::SpaceAvailable(_) => "SPACE_AVAILABLE",
            Self::Connected => "CONNECTED",
            Self::Disconnected => "DISCONNECTED",
        }
    }

    /// The space this event belongs to, if any
    pub fn space_id(&self) -> Option<Snowflake> {
        match self {
            Self::ReactionAdded(e) | Self::ReactionRemoved(e) => Some(e.space_id),
            Self::MessageDeleted(e) => Some(e.space_id),
            Self::SpaceAvailable(e) => Some(e.space_id),
            Self::Connected | Self::Disconnected => None,
        }
    }

    pub fn reaction_added(
        space_id: Snowflake,
        sub_space_id: Snowflake,
        message_id: Snowflake,
        symbol: impl Into<String>,
        user_id: Snowflake,
    ) -> Self {
        Self::ReactionAdded(ReactionEvent::new(
            space_id,
            sub_space_id,
            message_id,
            symbol,
            user_id,
        ))
    }

    pub fn reaction_removed(
        space_id: Snowflake,
        sub_space_id: Snowflake,
        message_id: Snowflake,
        symbol: impl Into<String>,
        user_id: Snowflake,
    ) -> Self {
        Self::ReactionRemoved(ReactionEvent::new(
            space_id,
            sub_space_id,
            message_id,
            symbol,
            user_id,
        ))
    }

    pub fn message_deleted(
        space_id: Snowflake,
        sub_space_id: Snowflake,
        message_id: Snowflake,
    ) -> Self {
        Self::MessageDeleted(MessageDeletedEvent {
            space_id,
            sub_space_id,
            message_id,
        })
    }

    pub fn space_available(space_id: Snowflake) -> Self {
        Self::SpaceAvailable(SpaceAvailableEvent { space_id })
    }
}

// ============================================================================
// Event Payloads
// ============================================================================

/// A reaction added to or removed from a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionEvent {
    pub space_id: Snowflake,
    pub sub_space_id: Snowflake,
    pub message_id: Snowflake,
    /// Raw symbol as delivered; may be anything, including custom emoji
    pub symbol: String,
    pub user_id: Snowflake,
}

impl ReactionEvent {
    pub fn new(
        space_id: Snowflake,
        sub_space_id: Snowflake,
        message_id: Snowflake,
        symbol: impl Into<String>,
        user_id: Snowflake,
    ) -> Self {
        Self {
            space_id,
            sub_space_id,
            message_id,
            symbol: symbol.into(),
            user_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDeletedEvent {
    pub space_id: Snowflake,
    pub sub_space_id: Snowflake,
    pub message_id: Snowflake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceAvailableEvent {
    pub space_id: Snowflake,
}
