//! Domain entities - core business objects

mod channel;
mod raid;
mod roster;

pub use channel::{ChannelBinding, ChannelRegistry};
pub use raid::{MessageRef, RaidCategory, RaidColor, RaidPolicy, RaidRecord};
pub use roster::{PlayerInfo, Rosters};
