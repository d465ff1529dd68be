//! # raid-core
//!
//! Domain layer for raid coordination: raid records and their rosters, the reaction
//! legend, local time handling, the render/parse round trip, inbound events, and the
//! ports (traits) the engine uses to talk to the chat platform.
//! This crate has no dependency on any runtime or transport.

pub mod entities;
pub mod error;
pub mod events;
pub mod render;
pub mod time;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    ChannelBinding, ChannelRegistry, MessageRef, PlayerInfo, RaidCategory, RaidColor, RaidPolicy,
    RaidRecord, Rosters,
};
pub use error::{DomainError, DomainResult};
pub use events::RaidEvent;
pub use render::{parse, render, EmbedField, ParsedRaid, RenderedRaid};
pub use time::{Clock, SystemClock, TimeService};
pub use traits::{
    ChannelMessage, ChatTransport, PlayerDirectory, ReactionUser, TransportError, TransportResult,
};
pub use value_objects::{
    Headcount, ReactionSymbol, RosterKind, Snowflake, SnowflakeParseError, Team, MAX_HEADCOUNT,
};
