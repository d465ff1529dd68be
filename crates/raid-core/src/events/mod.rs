//! Inbound notifications consumed by the engine

mod raid_event;

pub use raid_event::*;
