//! Reaction and deletion handlers

use raid_core::events::ReactionEvent;
use raid_core::{ReactionSymbol, Snowflake};
use tracing::{debug, info, instrument};

use super::RaidEngine;
use crate::store::RaidKey;

impl RaidEngine {
    /// Apply a reaction added to a raid message
    ///
    /// Roster symbols overwrite the user's entry and evict them from the sibling
    /// rosters, stripping the sibling reaction so the message's icons match.
    /// Unknown symbols are stripped. Duplicate deliveries are harmless.
    #[instrument(
        skip(self, event),
        fields(message_id = %event.message_id, symbol = %event.symbol, user_id = %event.user_id)
    )]
    pub async fn on_reaction_added(&self, event: &ReactionEvent) {
        if self.is_self(event.user_id) {
            return;
        }

        let key = RaidKey::new(event.space_id, event.sub_space_id, event.message_id);
        let Some(slot) = self.store.get(key) else {
            return;
        };

        let mut record = slot.lock().await;
        if record.is_expired(self.time.now(), &self.settings.policy) {
            debug!("Reaction on expired raid ignored");
            return;
        }

        let Some(symbol) = ReactionSymbol::parse(&event.symbol) else {
            drop(record);
            debug!("Stripping unrecognized reaction");
            self.strip_reaction(key, &event.symbol, event.user_id).await;
            return;
        };

        let evicted = match symbol {
            ReactionSymbol::Roster(kind) => {
                let player = self.enrich(event.space_id, event.user_id).await;
                record.rosters_mut().join(kind, player)
            }
            ReactionSymbol::Extra(headcount) => {
                if !record.rosters_mut().add_extra(event.user_id, headcount) {
                    return;
                }
                Vec::new()
            }
        };

        // Transport failures are logged in push; the next sweep re-renders
        let _ = self.push(key, &record).await;

        for sibling in evicted {
            self.strip_reaction(key, ReactionSymbol::Roster(sibling).emoji(), event.user_id)
                .await;
        }
    }

    /// Apply a reaction removed from a raid message
    ///
    /// Removing something that is not on the roster is a no-op.
    #[instrument(
        skip(self, event),
        fields(message_id = %event.message_id, symbol = %event.symbol, user_id = %event.user_id)
    )]
    pub async fn on_reaction_removed(&self, event: &ReactionEvent) {
        if self.is_self(event.user_id) {
            return;
        }
        let Some(symbol) = ReactionSymbol::parse(&event.symbol) else {
            return;
        };

        let key = RaidKey::new(event.space_id, event.sub_space_id, event.message_id);
        let Some(slot) = self.store.get(key) else {
            return;
        };

        let mut record = slot.lock().await;
        if record.is_expired(self.time.now(), &self.settings.policy) {
            return;
        }

        let changed = match symbol {
            ReactionSymbol::Roster(kind) => record.rosters_mut().leave(kind, event.user_id),
            ReactionSymbol::Extra(headcount) => {
                record.rosters_mut().remove_extra(event.user_id, headcount)
            }
        };

        if changed {
            let _ = self.push(key, &record).await;
        }
    }

    /// Forget a raid whose message was deleted
    #[instrument(skip(self))]
    pub fn on_message_deleted(
        &self,
        space_id: Snowflake,
        sub_space_id: Snowflake,
        message_id: Snowflake,
    ) {
        if self
            .store
            .remove(RaidKey::new(space_id, sub_space_id, message_id))
        {
            info!("Raid message deleted, raid dropped");
        }
    }
}
