//! Test fixtures and data generators
//!
//! Provides the ids, players and instants shared by the integration tests.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use raid_core::{ChannelBinding, PlayerInfo, Snowflake, Team};

/// The engine's own account
pub const BOT_ID: Snowflake = Snowflake::new(1);

/// The space all tests run in
pub const SPACE_ID: Snowflake = Snowflake::new(100);

/// A raid channel for same-day raids only
pub const RAID_SUB_ID: Snowflake = Snowflake::new(200);

/// A raid channel that also accepts scheduled raids
pub const SCHEDULED_SUB_ID: Snowflake = Snowflake::new(201);

/// A channel that is not set up for raids
pub const CHAT_SUB_ID: Snowflake = Snowflake::new(299);

/// Counter for unique user ids
static USER_COUNTER: AtomicI64 = AtomicI64::new(10_000);

/// Get a unique user id
pub fn unique_user() -> Snowflake {
    Snowflake::new(USER_COUNTER.fetch_add(1, Ordering::SeqCst))
}

/// Tuesday 10:00 in Prague
pub fn base_time() -> DateTime<Utc> {
    at("2026-03-10T09:00:00Z")
}

/// Parse an RFC 3339 instant
pub fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| panic!("bad fixture instant {rfc3339}: {e}"))
}

/// Channel bindings of the test space
pub fn bindings() -> Vec<ChannelBinding> {
    vec![
        ChannelBinding::new(SPACE_ID, RAID_SUB_ID, false),
        ChannelBinding::new(SPACE_ID, SCHEDULED_SUB_ID, true),
    ]
}

pub fn player(id: i64, name: &str, team: Option<Team>, level: Option<u8>) -> PlayerInfo {
    let mut player = PlayerInfo::new(Snowflake::new(id), name);
    player.team = team;
    player.level = level;
    player
}

pub fn ash() -> PlayerInfo {
    player(11, "Ash", Some(Team::Valor), Some(40))
}

pub fn misty() -> PlayerInfo {
    player(12, "Misty", Some(Team::Mystic), Some(38))
}

pub fn brock() -> PlayerInfo {
    player(13, "Brock", Some(Team::Instinct), None)
}

/// Players every harness directory knows
pub fn known_players() -> Vec<PlayerInfo> {
    vec![ash(), misty(), brock()]
}
