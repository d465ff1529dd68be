//! Chat transport port

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::render::RenderedRaid;
use crate::value_objects::Snowflake;

/// Errors reported by a transport implementation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("message or channel not found")]
    NotFound,

    #[error("request timed out")]
    Timeout,

    #[error("transport is disconnected")]
    Disconnected,

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("{0}")]
    Other(String),
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// A message as fetched from a channel's history
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMessage {
    pub id: Snowflake,
    pub author_id: Snowflake,
    pub created_at: DateTime<Utc>,
    pub content: RenderedRaid,
    /// Distinct reaction symbols currently present on the message
    pub reactions: Vec<String>,
}

/// A user holding a reaction on a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReactionUser {
    pub id: Snowflake,
    pub bot: bool,
}

impl ReactionUser {
    pub fn human(id: Snowflake) -> Self {
        Self { id, bot: false }
    }

    pub fn bot(id: Snowflake) -> Self {
        Self { id, bot: true }
    }
}

/// Capabilities the engine consumes from the chat platform
///
/// Every call is best-effort: implementations report failures, the engine logs them
/// and relies on the next sweep to re-push rendered state.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// The account the engine acts as
    fn self_id(&self) -> Snowflake;

    /// Post a new message and return its id
    async fn send_message(
        &self,
        sub_space_id: Snowflake,
        text: &str,
        content: &RenderedRaid,
    ) -> TransportResult<Snowflake>;

    /// Replace a message's rendered content
    async fn edit_message(
        &self,
        sub_space_id: Snowflake,
        message_id: Snowflake,
        content: &RenderedRaid,
    ) -> TransportResult<()>;

    /// Add a reaction as the engine's own account
    async fn add_reaction(
        &self,
        sub_space_id: Snowflake,
        message_id: Snowflake,
        symbol: &str,
    ) -> TransportResult<()>;

    /// Remove one user's reaction
    async fn delete_reaction(
        &self,
        sub_space_id: Snowflake,
        message_id: Snowflake,
        symbol: &str,
        user_id: Snowflake,
    ) -> TransportResult<()>;

    /// Remove a symbol from a message for every user
    async fn clear_reaction(
        &self,
        sub_space_id: Snowflake,
        message_id: Snowflake,
        symbol: &str,
    ) -> TransportResult<()>;

    /// Fetch up to `limit` most recent messages, newest first
    async fn fetch_recent_messages(
        &self,
        sub_space_id: Snowflake,
        limit: usize,
    ) -> TransportResult<Vec<ChannelMessage>>;

    /// Fetch up to `limit` users currently holding `symbol` on a message
    async fn fetch_reaction_holders(
        &self,
        sub_space_id: Snowflake,
        message_id: Snowflake,
        symbol: &str,
        limit: usize,
    ) -> TransportResult<Vec<ReactionUser>>;

    /// Send a direct notification to a user
    async fn notify_user(&self, user_id: Snowflake, text: &str) -> TransportResult<()>;
}
