//! Reaction legend
//!
//! The fixed, small table of reaction symbols the engine understands. Every other
//! symbol placed on a raid message is noise and gets stripped.
//!
//! | Symbol      | Target                  |
//! |-------------|-------------------------|
//! | 👍          | going                   |
//! | 🏠          | remote                  |
//! | 🤝          | invited                 |
//! | 1️⃣ … 9️⃣     | extra, headcount 1 … 9  |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest headcount a single extra symbol can express
pub const MAX_HEADCOUNT: u8 = 9;

const GOING: &str = "👍";
const REMOTE: &str = "🏠";
const INVITED: &str = "🤝";

const KEYCAPS: [&str; MAX_HEADCOUNT as usize] = [
    "1\u{fe0f}\u{20e3}",
    "2\u{fe0f}\u{20e3}",
    "3\u{fe0f}\u{20e3}",
    "4\u{fe0f}\u{20e3}",
    "5\u{fe0f}\u{20e3}",
    "6\u{fe0f}\u{20e3}",
    "7\u{fe0f}\u{20e3}",
    "8\u{fe0f}\u{20e3}",
    "9\u{fe0f}\u{20e3}",
];

/// Number of additional people a user brings along (1-9)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Headcount(u8);

impl Headcount {
    /// Create a headcount, `None` outside 1..=9
    pub const fn new(count: u8) -> Option<Self> {
        if count >= 1 && count <= MAX_HEADCOUNT {
            Some(Self(count))
        } else {
            None
        }
    }

    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// All representable headcounts in ascending order
    pub fn all() -> impl Iterator<Item = Headcount> {
        (1..=MAX_HEADCOUNT).map(Headcount)
    }
}

impl TryFrom<u8> for Headcount {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("headcount out of range: {value}"))
    }
}

impl From<Headcount> for u8 {
    fn from(value: Headcount) -> Self {
        value.0
    }
}

impl fmt::Display for Headcount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The mutually exclusive single-valued rosters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RosterKind {
    Going,
    Remote,
    Invited,
}

impl RosterKind {
    pub const ALL: [RosterKind; 3] = [Self::Going, Self::Remote, Self::Invited];

    /// The other two rosters a user is evicted from when joining this one
    pub fn siblings(self) -> impl Iterator<Item = RosterKind> {
        Self::ALL.into_iter().filter(move |kind| *kind != self)
    }
}

/// A recognised reaction symbol and the roster it targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactionSymbol {
    Roster(RosterKind),
    Extra(Headcount),
}

impl ReactionSymbol {
    /// Map a raw emoji to its legend entry
    ///
    /// Keycaps are accepted with or without the U+FE0F variation selector since
    /// clients disagree on whether to send it.
    pub fn parse(emoji: &str) -> Option<Self> {
        match emoji {
            GOING => return Some(Self::Roster(RosterKind::Going)),
            REMOTE => return Some(Self::Roster(RosterKind::Remote)),
            INVITED => return Some(Self::Roster(RosterKind::Invited)),
            _ => {}
        }

        let mut chars = emoji.chars().filter(|c| *c != '\u{fe0f}');
        let digit = chars.next()?.to_digit(10)?;
        if chars.next() != Some('\u{20e3}') || chars.next().is_some() {
            return None;
        }
        Headcount::new(digit as u8).map(Self::Extra)
    }

    /// Canonical emoji used when seeding or querying reactions
    pub fn emoji(self) -> &'static str {
        match self {
            Self::Roster(RosterKind::Going) => GOING,
            Self::Roster(RosterKind::Remote) => REMOTE,
            Self::Roster(RosterKind::Invited) => INVITED,
            Self::Extra(count) => KEYCAPS[usize::from(count.get() - 1)],
        }
    }

    /// Whole legend in display order
    pub fn all() -> impl Iterator<Item = ReactionSymbol> {
        RosterKind::ALL
            .into_iter()
            .map(Self::Roster)
            .chain(Headcount::all().map(Self::Extra))
    }

    #[inline]
    pub fn is_recognized(emoji: &str) -> bool {
        Self::parse(emoji).is_some()
    }
}

impl fmt::Display for ReactionSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.emoji())
    }
}
