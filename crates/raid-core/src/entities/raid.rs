//! Raid entity - one announced raid and its participants

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::roster::Rosters;
use crate::error::{DomainError, DomainResult};
use crate::time::truncate_to_minute;
use crate::value_objects::{RosterKind, Snowflake};

/// How a raid's time was announced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaidCategory {
    /// Later the same local day, announced as `HH:MM`
    Immediate,
    /// A specific date and time, possibly days out
    Scheduled,
}

/// Display colour of a rendered raid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaidColor {
    Green,
    Orange,
    Red,
}

/// Thresholds that drive expiry and presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaidPolicy {
    /// How long an immediate raid lives after creation
    pub immediate_lifetime: Duration,
    /// Time left before the event at which the colour turns orange
    pub orange_window: Duration,
    /// remote + invited above this switches the title to a warning
    pub capacity_warning: usize,
    /// going roster size from which names are grouped by team
    pub team_grouping_threshold: usize,
}

impl Default for RaidPolicy {
    fn default() -> Self {
        Self {
            immediate_lifetime: Duration::hours(3),
            orange_window: Duration::minutes(15),
            capacity_warning: 10,
            team_grouping_threshold: 10,
        }
    }
}

/// Where a published raid lives on the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub sub_space_id: Snowflake,
    pub message_id: Snowflake,
}

/// Raid entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaidRecord {
    category: RaidCategory,
    boss_name: String,
    location: String,
    event_time: DateTime<Utc>,
    created_at: DateTime<Utc>,
    rosters: Rosters,
    message: Option<MessageRef>,
}

impl RaidRecord {
    /// Create a raid with empty rosters
    ///
    /// Text fields are collapsed onto a single line and the event time is truncated
    /// to whole minutes, which is all the rendered form can carry.
    pub fn new(
        category: RaidCategory,
        boss_name: &str,
        location: &str,
        event_time: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            category,
            boss_name: normalize_field(boss_name, "Boss")?,
            location: normalize_field(location, "Location")?,
            event_time: truncate_to_minute(event_time),
            created_at,
            rosters: Rosters::new(),
            message: None,
        })
    }

    #[inline]
    pub fn category(&self) -> RaidCategory {
        self.category
    }

    #[inline]
    pub fn boss_name(&self) -> &str {
        &self.boss_name
    }

    #[inline]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[inline]
    pub fn event_time(&self) -> DateTime<Utc> {
        self.event_time
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    pub fn rosters(&self) -> &Rosters {
        &self.rosters
    }

    #[inline]
    pub fn rosters_mut(&mut self) -> &mut Rosters {
        &mut self.rosters
    }

    #[inline]
    pub fn message(&self) -> Option<MessageRef> {
        self.message
    }

    /// Bind the raid to the message that displays it
    pub fn publish(&mut self, message: MessageRef) {
        self.message = Some(message);
    }

    pub fn set_event_time(&mut self, event_time: DateTime<Utc>) {
        self.event_time = truncate_to_minute(event_time);
    }

    pub fn set_boss_name(&mut self, boss_name: &str) -> DomainResult<()> {
        self.boss_name = normalize_field(boss_name, "Boss")?;
        Ok(())
    }

    /// Whether the raid is over at `now`
    ///
    /// Immediate raids live for a fixed window after creation regardless of their
    /// event time; scheduled raids end once the event time has passed.
    pub fn is_expired(&self, now: DateTime<Utc>, policy: &RaidPolicy) -> bool {
        match self.category {
            RaidCategory::Immediate => now > self.created_at + policy.immediate_lifetime,
            RaidCategory::Scheduled => now > self.event_time,
        }
    }

    pub fn color(&self, now: DateTime<Utc>, policy: &RaidPolicy) -> RaidColor {
        match self.category {
            RaidCategory::Immediate => {
                let remaining = self.event_time - now;
                if remaining <= Duration::zero() {
                    RaidColor::Red
                } else if remaining <= policy.orange_window {
                    RaidColor::Orange
                } else {
                    RaidColor::Green
                }
            }
            RaidCategory::Scheduled if self.is_expired(now, policy) => RaidColor::Red,
            RaidCategory::Scheduled => RaidColor::Green,
        }
    }

    /// remote + invited exceeds what the organisers can absorb
    pub fn over_capacity(&self, policy: &RaidPolicy) -> bool {
        self.rosters.count(RosterKind::Remote) + self.rosters.count(RosterKind::Invited)
            > policy.capacity_warning
    }
}

fn normalize_field(value: &str, field: &'static str) -> DomainResult<String> {
    let normalized = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return Err(DomainError::EmptyField(field));
    }
    Ok(normalized)
}
