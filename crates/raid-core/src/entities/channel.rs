//! Channel bindings - which sub-spaces host raids

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// A sub-space (channel) where raids are announced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelBinding {
    pub space_id: Snowflake,
    pub sub_space_id: Snowflake,
    /// Whether raids days ahead may be announced here
    pub allow_scheduled: bool,
}

impl ChannelBinding {
    pub fn new(space_id: Snowflake, sub_space_id: Snowflake, allow_scheduled: bool) -> Self {
        Self {
            space_id,
            sub_space_id,
            allow_scheduled,
        }
    }
}

/// Lookup of raid channels by space
#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    by_space: HashMap<Snowflake, Vec<ChannelBinding>>,
}

impl ChannelRegistry {
    pub fn new(bindings: impl IntoIterator<Item = ChannelBinding>) -> Self {
        let mut by_space: HashMap<Snowflake, Vec<ChannelBinding>> = HashMap::new();
        for binding in bindings {
            let channels = by_space.entry(binding.space_id).or_default();
            // Last binding for a sub-space wins
            channels.retain(|existing| existing.sub_space_id != binding.sub_space_id);
            channels.push(binding);
        }
        Self { by_space }
    }

    /// All raid channels of a space
    pub fn channels(&self, space_id: Snowflake) -> &[ChannelBinding] {
        self.by_space
            .get(&space_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn binding(&self, space_id: Snowflake, sub_space_id: Snowflake) -> Option<ChannelBinding> {
        self.channels(space_id)
            .iter()
            .find(|binding| binding.sub_space_id == sub_space_id)
            .copied()
    }

    pub fn len(&self) -> usize {
        self.by_space.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_space.is_empty()
    }
}
