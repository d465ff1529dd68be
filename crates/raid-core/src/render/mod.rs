//! Render/parse round trip
//!
//! A raid message is self-describing: its first three description lines carry the
//! boss, the location and the time, each behind a fixed label. Parsing those back is
//! how the engine recovers its state after a restart. Rosters are rendered for
//! people to read but never parsed; they are rebuilt from live reactions.

mod labels;
mod parse;
mod render;

use serde::{Deserialize, Serialize};

use crate::entities::RaidColor;

pub use labels::*;
pub use parse::{parse, ParsedRaid};
pub use render::render;

/// A named field of the legacy message layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

impl EmbedField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The rich content of a raid message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedRaid {
    pub title: String,
    pub description: String,
    pub color: RaidColor,
    /// Only populated by messages written in the legacy layout
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

impl RenderedRaid {
    /// Whether a roster section with the given label is present
    pub fn has_section(&self, label: &str) -> bool {
        let prefix = format!("**{label} (");
        self.description.lines().any(|line| line.starts_with(&prefix))
    }

    /// The description line of a roster section
    pub fn section(&self, label: &str) -> Option<&str> {
        let prefix = format!("**{label} (");
        self.description
            .lines()
            .find(|line| line.starts_with(&prefix))
    }
}
