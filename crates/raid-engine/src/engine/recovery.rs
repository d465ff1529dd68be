//! Rebuilding raids from posted messages

use std::collections::HashMap;

use raid_core::{
    parse, ChannelBinding, ChannelMessage, MessageRef, PlayerInfo, RaidRecord, ReactionSymbol,
    Rosters, Snowflake, TransportResult,
};
use tracing::{debug, info, instrument, warn};

use super::RaidEngine;
use crate::store::RaidKey;

/// Outcome of a recovery pass over one space
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Raids stored or re-synchronised
    pub recovered: usize,
    /// Raid messages skipped because they had expired
    pub expired: usize,
    /// Sub-spaces whose history could not be fetched
    pub failed_channels: usize,
    /// Raids whose reactions could not be read; their rosters were left as they were
    pub incomplete: usize,
}

impl RaidEngine {
    /// Rebuild every raid still live in a space's raid channels
    ///
    /// Rosters come from the reactions currently on each message, not from its
    /// text. A raid already in memory is re-synchronised in place.
    #[instrument(skip(self))]
    pub async fn on_available(&self, space_id: Snowflake) -> RecoveryReport {
        let mut report = RecoveryReport::default();

        for binding in self.channels.channels(space_id) {
            match self
                .transport
                .fetch_recent_messages(binding.sub_space_id, self.settings.recent_message_limit)
                .await
            {
                Ok(messages) => self.recover_channel(binding, messages, &mut report).await,
                Err(e) => {
                    warn!(
                        sub_space_id = %binding.sub_space_id,
                        error = %e,
                        "Failed to fetch channel history"
                    );
                    report.failed_channels += 1;
                }
            }
        }

        info!(
            recovered = report.recovered,
            expired = report.expired,
            failed_channels = report.failed_channels,
            incomplete = report.incomplete,
            "Recovery finished"
        );

        report
    }

    async fn recover_channel(
        &self,
        binding: &ChannelBinding,
        messages: Vec<ChannelMessage>,
        report: &mut RecoveryReport,
    ) {
        let now = self.time.now();
        let cutoff = if binding.allow_scheduled {
            now - self.settings.scheduled_lookback
        } else {
            self.time
                .start_of_day(self.time.local_date(now))
                .unwrap_or(now - chrono::Duration::days(1))
        };
        let self_id = self.transport.self_id();

        for message in messages {
            if message.created_at < cutoff || message.author_id != self_id {
                continue;
            }

            let Some(parsed) = parse(&message.content, message.created_at, &self.time) else {
                debug!(message_id = %message.id, "Message is not a raid");
                continue;
            };
            let mut record = match parsed.into_record(message.created_at) {
                Ok(record) => record,
                Err(e) => {
                    debug!(message_id = %message.id, error = %e, "Unusable raid message");
                    continue;
                }
            };
            if record.is_expired(now, &self.settings.policy) {
                report.expired += 1;
                continue;
            }

            let key = RaidKey::new(binding.space_id, binding.sub_space_id, message.id);
            record.publish(MessageRef {
                sub_space_id: key.sub_space_id,
                message_id: key.message_id,
            });

            let (slot, inserted) = self.store.get_or_put(key, record);
            let mut record = slot.lock().await;
            if self.replay(key, &mut record, &message.reactions).await.is_err() {
                // A raid new to memory is only kept once its rosters are known
                if inserted {
                    self.store.remove_slot(&slot);
                }
                warn!(raid = %key, inserted, "Replay aborted, rosters left unchanged");
                report.incomplete += 1;
                continue;
            }
            let _ = self.push(key, &record).await;
            drop(record);

            debug!(raid = %key, inserted, "Raid recovered");
            report.recovered += 1;
        }
    }

    /// Reset rosters to the reactions currently on the message
    ///
    /// All holder lists are read before anything changes; if one cannot be
    /// fetched the record is left untouched and the error returned.
    async fn replay(
        &self,
        key: RaidKey,
        record: &mut RaidRecord,
        present: &[String],
    ) -> TransportResult<()> {
        let self_id = self.transport.self_id();
        let mut rosters = Rosters::new();
        let mut players: HashMap<Snowflake, PlayerInfo> = HashMap::new();
        let mut stale = Vec::new();

        for symbol in ReactionSymbol::all() {
            let holders = match self
                .transport
                .fetch_reaction_holders(
                    key.sub_space_id,
                    key.message_id,
                    symbol.emoji(),
                    self.settings.reaction_fetch_limit,
                )
                .await
            {
                Ok(holders) => holders,
                Err(e) => {
                    warn!(
                        raid = %key,
                        symbol = %symbol,
                        error = %e,
                        "Failed to fetch reaction holders"
                    );
                    return Err(e);
                }
            };

            for holder in holders {
                if holder.bot || holder.id == self_id {
                    continue;
                }
                match symbol {
                    ReactionSymbol::Roster(kind) => {
                        let player = match players.get(&holder.id) {
                            Some(player) => player.clone(),
                            None => {
                                let player = self.enrich(key.space_id, holder.id).await;
                                players.insert(holder.id, player.clone());
                                player
                            }
                        };
                        // Later symbols win; earlier ones are stripped below
                        for sibling in rosters.join(kind, player) {
                            stale.push((ReactionSymbol::Roster(sibling), holder.id));
                        }
                    }
                    ReactionSymbol::Extra(headcount) => {
                        rosters.add_extra(holder.id, headcount);
                    }
                }
            }
        }

        *record.rosters_mut() = rosters;

        for (symbol, user_id) in stale {
            self.strip_reaction(key, symbol.emoji(), user_id).await;
        }

        for raw in present.iter().filter(|raw| !ReactionSymbol::is_recognized(raw)) {
            if let Err(e) = self
                .transport
                .clear_reaction(key.sub_space_id, key.message_id, raw)
                .await
            {
                warn!(raid = %key, symbol = %raw, error = %e, "Failed to clear reaction");
            }
        }

        Ok(())
    }
}
