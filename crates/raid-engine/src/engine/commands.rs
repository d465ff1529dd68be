//! Operator commands: announcing raids and changing their time or boss

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use raid_core::time::truncate_to_minute;
use raid_core::{
    render, DomainError, DomainResult, MessageRef, RaidCategory, RaidRecord, ReactionSymbol,
    Snowflake,
};
use tracing::{info, instrument, warn};

use super::RaidEngine;
use crate::store::{RaidKey, RaidSlot};

/// Which raid of a sub-space a command addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaidTarget {
    /// By message id
    Id(Snowflake),
    /// The n-th most recently created raid, 0 being the newest
    Recent(usize),
}

/// A new raid announcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaidRequest {
    pub boss_name: String,
    pub location: String,
    /// `HH:MM` for today or `DD.MM.YYYY HH:MM`
    pub time: String,
    /// Plain text posted alongside the raid, such as a role mention
    pub announcement: Option<String>,
}

impl RaidRequest {
    pub fn new(
        boss_name: impl Into<String>,
        location: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            boss_name: boss_name.into(),
            location: location.into(),
            time: time.into(),
            announcement: None,
        }
    }

    pub fn with_announcement(mut self, text: impl Into<String>) -> Self {
        self.announcement = Some(text.into());
        self
    }
}

/// Result of a time or boss change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjustment {
    pub message_id: Snowflake,
    /// Users notified successfully
    pub notified: usize,
    /// Users whose notification failed
    pub failed: usize,
}

impl RaidEngine {
    /// Announce a new raid and start tracking it
    ///
    /// Returns the id of the posted message.
    #[instrument(skip(self))]
    pub async fn create_raid(
        &self,
        space_id: Snowflake,
        sub_space_id: Snowflake,
        request: RaidRequest,
    ) -> DomainResult<Snowflake> {
        let binding = self
            .channels
            .binding(space_id, sub_space_id)
            .ok_or(DomainError::ChannelNotBound(sub_space_id))?;

        let now = self.time.now();
        let (category, event_time) = self.time.parse_token(&request.time)?;
        let mut record = RaidRecord::new(
            category,
            &request.boss_name,
            &request.location,
            event_time,
            now,
        )?;

        if category == RaidCategory::Scheduled && !binding.allow_scheduled {
            return Err(DomainError::ScheduledNotAllowed);
        }
        self.validate_event_time(category, record.event_time(), now)?;

        let content = render(&record, &self.time, &self.settings.policy);
        let text = request.announcement.as_deref().unwrap_or_default();
        let message_id = self
            .transport
            .send_message(sub_space_id, text, &content)
            .await?;

        record.publish(MessageRef {
            sub_space_id,
            message_id,
        });
        let key = RaidKey::new(space_id, sub_space_id, message_id);
        self.store.put(key, record);

        info!(raid = %key, category = ?category, "Raid announced");

        // Seed the legend so users only have to click
        for symbol in ReactionSymbol::all() {
            if let Err(e) = self
                .transport
                .add_reaction(sub_space_id, message_id, symbol.emoji())
                .await
            {
                warn!(raid = %key, symbol = %symbol, error = %e, "Failed to seed reaction");
            }
        }

        Ok(message_id)
    }

    /// Move a raid to a new time and tell everyone signed up
    #[instrument(skip(self))]
    pub async fn adjust_time(
        &self,
        space_id: Snowflake,
        sub_space_id: Snowflake,
        target: RaidTarget,
        token: &str,
    ) -> DomainResult<Adjustment> {
        let slot = self.resolve_target(space_id, sub_space_id, target)?;
        let key = slot.key();

        let mut record = slot.lock().await;
        let now = self.time.now();
        if record.is_expired(now, &self.settings.policy) {
            return Err(DomainError::RaidExpired);
        }

        let event_time = self.resolve_new_time(&record, token)?;
        self.validate_event_time(record.category(), event_time, now)?;
        record.set_event_time(event_time);

        let _ = self.push(key, &record).await;
        let text = format!(
            "Raid {} ({}) byl přesunut na {}.",
            record.boss_name(),
            record.location(),
            self.time.format_for(record.category(), record.event_time())
        );
        let members = record.rosters().members();
        drop(record);

        info!(raid = %key, "Raid time changed");
        Ok(self.notify_all(key, members, &text).await)
    }

    /// Change the boss of a raid and tell everyone signed up
    #[instrument(skip(self))]
    pub async fn adjust_boss(
        &self,
        space_id: Snowflake,
        sub_space_id: Snowflake,
        target: RaidTarget,
        boss_name: &str,
    ) -> DomainResult<Adjustment> {
        let slot = self.resolve_target(space_id, sub_space_id, target)?;
        let key = slot.key();

        let mut record = slot.lock().await;
        if record.is_expired(self.time.now(), &self.settings.policy) {
            return Err(DomainError::RaidExpired);
        }

        let previous = record.boss_name().to_string();
        record.set_boss_name(boss_name)?;

        let _ = self.push(key, &record).await;
        let text = format!(
            "Boss raidu v {} ({}) se změnil z {} na {}.",
            record.location(),
            self.time.format_for(record.category(), record.event_time()),
            previous,
            record.boss_name()
        );
        let members = record.rosters().members();
        drop(record);

        info!(raid = %key, "Raid boss changed");
        Ok(self.notify_all(key, members, &text).await)
    }

    fn resolve_target(
        &self,
        space_id: Snowflake,
        sub_space_id: Snowflake,
        target: RaidTarget,
    ) -> DomainResult<Arc<RaidSlot>> {
        match target {
            RaidTarget::Id(message_id) => self
                .store
                .get(RaidKey::new(space_id, sub_space_id, message_id))
                .ok_or(DomainError::RaidNotFound(message_id)),
            RaidTarget::Recent(skip) => self
                .store
                .get_most_recent(space_id, sub_space_id, skip)
                .ok_or(DomainError::PositionOutOfRange(skip)),
        }
    }

    /// Interpret a new time for an existing raid
    ///
    /// Immediate raids stay on their creation day. For scheduled raids a bare
    /// `HH:MM` keeps the current date.
    fn resolve_new_time(&self, record: &RaidRecord, token: &str) -> DomainResult<DateTime<Utc>> {
        let day = match record.category() {
            RaidCategory::Immediate => self.time.local_date(record.created_at()),
            RaidCategory::Scheduled => self.time.local_date(record.event_time()),
        };

        match self.time.parse_date_time(token) {
            Ok(instant)
                if record.category() == RaidCategory::Immediate
                    && self.time.local_date(instant) != day =>
            {
                Err(DomainError::NotToday)
            }
            Ok(instant) => Ok(instant),
            Err(_) => self.time.parse_time_on(token, day),
        }
    }

    fn validate_event_time(
        &self,
        category: RaidCategory,
        event_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if event_time < truncate_to_minute(now) {
            return Err(DomainError::TimeInPast);
        }
        if category == RaidCategory::Scheduled
            && event_time - now > self.settings.scheduled_horizon
        {
            return Err(DomainError::BeyondHorizon {
                days: self.settings.scheduled_horizon.num_days(),
            });
        }
        Ok(())
    }

    /// Notify each user independently; one failure never stops the rest
    async fn notify_all(
        &self,
        key: RaidKey,
        members: BTreeSet<Snowflake>,
        text: &str,
    ) -> Adjustment {
        let self_id = self.transport.self_id();
        let results = join_all(
            members
                .into_iter()
                .filter(|user_id| *user_id != self_id)
                .map(|user_id| async move {
                    let result = self.transport.notify_user(user_id, text).await;
                    if let Err(e) = &result {
                        warn!(raid = %key, user_id = %user_id, error = %e, "Failed to notify user");
                    }
                    result
                }),
        )
        .await;

        let failed = results.iter().filter(|result| result.is_err()).count();
        Adjustment {
            message_id: key.message_id,
            notified: results.len() - failed,
            failed,
        }
    }
}
