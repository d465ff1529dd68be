//! Raid engine
//!
//! Turns inbound notifications into roster changes, re-renders the affected
//! message after every change, rebuilds state from posted messages, and retires
//! expired raids.
//!
//! Every change to a raid happens while holding that raid's slot lock, from the
//! read of its rosters through the outbound edit.

mod commands;
mod reactions;
mod recovery;
mod sweep;

use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use raid_common::{AppError, AppResult, RaidSettings};
use raid_core::{
    render, ChannelRegistry, ChatTransport, PlayerDirectory, PlayerInfo, RaidEvent, RaidPolicy,
    RaidRecord, Snowflake, TimeService, TransportError, TransportResult,
};
use tracing::warn;

use crate::store::{RaidKey, RaidStore};

pub use commands::{Adjustment, RaidRequest, RaidTarget};
pub use recovery::RecoveryReport;
pub use sweep::SweepReport;

/// Engine tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub policy: RaidPolicy,
    /// Recovery lookback in sub-spaces that allow scheduled raids
    pub scheduled_lookback: Duration,
    /// Furthest a scheduled raid may be announced ahead
    pub scheduled_horizon: Duration,
    pub recent_message_limit: usize,
    pub reaction_fetch_limit: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&RaidSettings::default())
    }
}

impl From<&RaidSettings> for EngineSettings {
    fn from(settings: &RaidSettings) -> Self {
        Self {
            policy: settings.policy(),
            scheduled_lookback: Duration::days(settings.scheduled_lookback_days),
            scheduled_horizon: Duration::days(settings.scheduled_horizon_days),
            recent_message_limit: settings.recent_message_limit,
            reaction_fetch_limit: settings.reaction_fetch_limit,
        }
    }
}

/// The raid engine
pub struct RaidEngine {
    store: Arc<RaidStore>,
    transport: Arc<dyn ChatTransport>,
    directory: Arc<dyn PlayerDirectory>,
    time: TimeService,
    channels: ChannelRegistry,
    settings: EngineSettings,
}

impl RaidEngine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    // === Accessors ===

    pub fn store(&self) -> &Arc<RaidStore> {
        &self.store
    }

    pub fn time(&self) -> &TimeService {
        &self.time
    }

    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn policy(&self) -> &RaidPolicy {
        &self.settings.policy
    }

    // === Dispatch ===

    /// Route one inbound notification to its handler
    ///
    /// Connection state changes are the runtime's concern and are ignored here.
    pub async fn handle(&self, event: RaidEvent) {
        match event {
            RaidEvent::ReactionAdded(e) => self.on_reaction_added(&e).await,
            RaidEvent::ReactionRemoved(e) => self.on_reaction_removed(&e).await,
            RaidEvent::MessageDeleted(e) => {
                self.on_message_deleted(e.space_id, e.sub_space_id, e.message_id);
            }
            RaidEvent::SpaceAvailable(e) => {
                self.on_available(e.space_id).await;
            }
            RaidEvent::Connected | RaidEvent::Disconnected => {}
        }
    }

    // === Shared helpers ===

    fn is_self(&self, user_id: Snowflake) -> bool {
        user_id == self.transport.self_id()
    }

    /// Best-effort player lookup; unknown players get a placeholder name
    async fn enrich(&self, space_id: Snowflake, user_id: Snowflake) -> PlayerInfo {
        match self.directory.lookup(space_id, user_id).await {
            Ok(player) => player,
            Err(e) => {
                warn!(
                    space_id = %space_id,
                    user_id = %user_id,
                    error = %e,
                    "Player lookup failed, using placeholder"
                );
                PlayerInfo::unknown(user_id)
            }
        }
    }

    /// Render a raid and write it to the message it was published to
    ///
    /// Failures are logged and returned; in-memory state is kept either way.
    async fn push(&self, key: RaidKey, record: &RaidRecord) -> TransportResult<()> {
        let result = match record.message() {
            Some(message) => {
                let content = render(record, &self.time, &self.settings.policy);
                self.transport
                    .edit_message(message.sub_space_id, message.message_id, &content)
                    .await
            }
            None => Err(TransportError::NotFound),
        };

        if let Err(e) = &result {
            warn!(raid = %key, error = %e, "Failed to push raid message");
        }

        result
    }

    /// Remove one user's reaction, logging failures
    async fn strip_reaction(&self, key: RaidKey, symbol: &str, user_id: Snowflake) {
        if let Err(e) = self
            .transport
            .delete_reaction(key.sub_space_id, key.message_id, symbol, user_id)
            .await
        {
            warn!(
                raid = %key,
                symbol = %symbol,
                user_id = %user_id,
                error = %e,
                "Failed to remove reaction"
            );
        }
    }
}

impl fmt::Debug for RaidEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RaidEngine")
            .field("store", &self.store)
            .field("time", &self.time)
            .field("channels", &self.channels.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Builder for creating a `RaidEngine`
#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Arc<RaidStore>>,
    transport: Option<Arc<dyn ChatTransport>>,
    directory: Option<Arc<dyn PlayerDirectory>>,
    time: Option<TimeService>,
    channels: Option<ChannelRegistry>,
    settings: Option<EngineSettings>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share an existing store; a fresh one is created otherwise
    pub fn store(mut self, store: Arc<RaidStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn ChatTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn directory(mut self, directory: Arc<dyn PlayerDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn time(mut self, time: TimeService) -> Self {
        self.time = Some(time);
        self
    }

    pub fn channels(mut self, channels: ChannelRegistry) -> Self {
        self.channels = Some(channels);
        self
    }

    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Build the engine
    ///
    /// # Errors
    /// Returns `AppError::Validation` if the transport, directory or time service
    /// is missing
    pub fn build(self) -> AppResult<RaidEngine> {
        Ok(RaidEngine {
            store: self.store.unwrap_or_else(RaidStore::new_shared),
            transport: self
                .transport
                .ok_or_else(|| AppError::validation("transport is required"))?,
            directory: self
                .directory
                .ok_or_else(|| AppError::validation("directory is required"))?,
            time: self
                .time
                .ok_or_else(|| AppError::validation("time service is required"))?,
            channels: self.channels.unwrap_or_default(),
            settings: self.settings.unwrap_or_default(),
        })
    }
}
