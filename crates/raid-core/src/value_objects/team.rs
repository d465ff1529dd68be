//! Team affiliation of a player

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Team a player belongs to
///
/// Declaration order is the order teams are listed in grouped rosters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Mystic,
    Valor,
    Instinct,
}

impl Team {
    pub const ALL: [Team; 3] = [Self::Mystic, Self::Valor, Self::Instinct];

    pub fn name(self) -> &'static str {
        match self {
            Self::Mystic => "Mystic",
            Self::Valor => "Valor",
            Self::Instinct => "Instinct",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Team {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|team| team.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown team: {s}"))
    }
}
