//! Recovering a raid from rendered content

use chrono::{DateTime, Utc};

use super::labels::{
    BOSS_LABEL, DATE_LABEL, LEGACY_BOSS_FIELD, LEGACY_DATE_FIELD, LEGACY_LOCATION_FIELD,
    LEGACY_TIME_FIELD, LOCATION_LABEL, TIME_LABEL,
};
use super::{EmbedField, RenderedRaid};
use crate::entities::{RaidCategory, RaidRecord};
use crate::error::DomainResult;
use crate::time::TimeService;

/// Identity, place and time of a raid as read back from a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRaid {
    pub category: RaidCategory,
    pub boss_name: String,
    pub location: String,
    pub event_time: DateTime<Utc>,
}

impl ParsedRaid {
    /// Turn into a record with empty rosters
    pub fn into_record(self, created_at: DateTime<Utc>) -> DomainResult<RaidRecord> {
        RaidRecord::new(
            self.category,
            &self.boss_name,
            &self.location,
            self.event_time,
            created_at,
        )
    }
}

/// Parse rendered content, trying the description layout before the legacy fields
///
/// `created_at` is the message's creation instant; a bare `HH:MM` resolves on its
/// local day. Returns `None` when the content is not a raid.
pub fn parse(
    content: &RenderedRaid,
    created_at: DateTime<Utc>,
    time: &TimeService,
) -> Option<ParsedRaid> {
    parse_description(&content.description, created_at, time)
        .or_else(|| parse_legacy_fields(&content.fields, created_at, time))
}

fn parse_description(
    description: &str,
    created_at: DateTime<Utc>,
    time: &TimeService,
) -> Option<ParsedRaid> {
    let mut lines = description.lines().map(str::trim);
    let boss = lines.next()?.strip_prefix(BOSS_LABEL)?;
    let location = lines.next()?.strip_prefix(LOCATION_LABEL)?;
    let when = lines.next()?;

    let (category, event_time) = if let Some(token) = when.strip_prefix(TIME_LABEL) {
        let day = time.local_date(created_at);
        (RaidCategory::Immediate, time.parse_time_on(token, day).ok()?)
    } else if let Some(token) = when.strip_prefix(DATE_LABEL) {
        (RaidCategory::Scheduled, time.parse_date_time(token).ok()?)
    } else {
        return None;
    };

    build(category, boss, location, event_time)
}

fn parse_legacy_fields(
    fields: &[EmbedField],
    created_at: DateTime<Utc>,
    time: &TimeService,
) -> Option<ParsedRaid> {
    let field = |name: &str| {
        fields
            .iter()
            .find(|field| field.name.trim().trim_end_matches(':').eq_ignore_ascii_case(name))
            .map(|field| field.value.as_str())
    };

    let boss = field(LEGACY_BOSS_FIELD)?;
    let location = field(LEGACY_LOCATION_FIELD)?;
    let (category, event_time) = match (field(LEGACY_TIME_FIELD), field(LEGACY_DATE_FIELD)) {
        (Some(token), None) => {
            let day = time.local_date(created_at);
            (RaidCategory::Immediate, time.parse_time_on(token, day).ok()?)
        }
        (None, Some(token)) => (RaidCategory::Scheduled, time.parse_date_time(token).ok()?),
        // Neither, or both: not something we wrote
        _ => return None,
    };

    build(category, boss, location, event_time)
}

fn build(
    category: RaidCategory,
    boss: &str,
    location: &str,
    event_time: DateTime<Utc>,
) -> Option<ParsedRaid> {
    let boss_name = boss.trim();
    let location = location.trim();
    if boss_name.is_empty() || location.is_empty() {
        return None;
    }
    Some(ParsedRaid {
        category,
        boss_name: boss_name.to_string(),
        location: location.to_string(),
        event_time,
    })
}
