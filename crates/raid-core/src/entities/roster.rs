//! Rosters - who takes part in a raid, and how

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::value_objects::{Headcount, RosterKind, Snowflake, Team};

/// What the roster shows about a participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub user_id: Snowflake,
    pub display_name: String,
    pub team: Option<Team>,
    pub level: Option<u8>,
}

impl PlayerInfo {
    pub fn new(user_id: Snowflake, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            team: None,
            level: None,
        }
    }

    /// Placeholder used when the directory lookup fails
    pub fn unknown(user_id: Snowflake) -> Self {
        Self::new(user_id, format!("user-{user_id}"))
    }

    pub fn with_team(mut self, team: Team) -> Self {
        self.team = Some(team);
        self
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }
}

/// The participation rosters of one raid
///
/// A user sits in at most one of going/remote/invited. Extra headcounts are kept
/// apart since a user may bring several groups at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rosters {
    going: BTreeMap<Snowflake, PlayerInfo>,
    remote: BTreeMap<Snowflake, PlayerInfo>,
    invited: BTreeMap<Snowflake, PlayerInfo>,
    extra: BTreeSet<(Snowflake, Headcount)>,
}

impl Rosters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roster(&self, kind: RosterKind) -> &BTreeMap<Snowflake, PlayerInfo> {
        match kind {
            RosterKind::Going => &self.going,
            RosterKind::Remote => &self.remote,
            RosterKind::Invited => &self.invited,
        }
    }

    fn roster_mut(&mut self, kind: RosterKind) -> &mut BTreeMap<Snowflake, PlayerInfo> {
        match kind {
            RosterKind::Going => &mut self.going,
            RosterKind::Remote => &mut self.remote,
            RosterKind::Invited => &mut self.invited,
        }
    }

    /// Put a player on a roster, replacing any previous entry for them
    ///
    /// Returns the sibling rosters the player was evicted from.
    pub fn join(&mut self, kind: RosterKind, player: PlayerInfo) -> Vec<RosterKind> {
        let user_id = player.user_id;
        let evicted = kind
            .siblings()
            .filter(|sibling| self.roster_mut(*sibling).remove(&user_id).is_some())
            .collect();
        self.roster_mut(kind).insert(user_id, player);
        evicted
    }

    /// Take a user off a roster; `false` if they were not on it
    pub fn leave(&mut self, kind: RosterKind, user_id: Snowflake) -> bool {
        self.roster_mut(kind).remove(&user_id).is_some()
    }

    pub fn contains(&self, kind: RosterKind, user_id: Snowflake) -> bool {
        self.roster(kind).contains_key(&user_id)
    }

    /// The single-valued roster a user is on, if any
    pub fn kind_of(&self, user_id: Snowflake) -> Option<RosterKind> {
        RosterKind::ALL
            .into_iter()
            .find(|kind| self.contains(*kind, user_id))
    }

    /// Record an extra group; `false` if already present
    pub fn add_extra(&mut self, user_id: Snowflake, headcount: Headcount) -> bool {
        self.extra.insert((user_id, headcount))
    }

    pub fn remove_extra(&mut self, user_id: Snowflake, headcount: Headcount) -> bool {
        self.extra.remove(&(user_id, headcount))
    }

    /// Headcounts a user currently brings, ascending
    pub fn extras_of(&self, user_id: Snowflake) -> impl Iterator<Item = Headcount> + '_ {
        self.extra
            .iter()
            .filter(move |(user, _)| *user == user_id)
            .map(|(_, headcount)| *headcount)
    }

    pub fn extras(&self) -> impl Iterator<Item = (Snowflake, Headcount)> + '_ {
        self.extra.iter().copied()
    }

    /// Total number of extra people across all users
    pub fn extra_total(&self) -> u32 {
        self.extra
            .iter()
            .map(|(_, headcount)| u32::from(headcount.get()))
            .sum()
    }

    pub fn count(&self, kind: RosterKind) -> usize {
        self.roster(kind).len()
    }

    /// Every user with any kind of entry
    pub fn members(&self) -> BTreeSet<Snowflake> {
        RosterKind::ALL
            .into_iter()
            .flat_map(|kind| self.roster(kind).keys().copied())
            .chain(self.extra.iter().map(|(user, _)| *user))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.going.is_empty()
            && self.remote.is_empty()
            && self.invited.is_empty()
            && self.extra.is_empty()
    }
}
