//! Value objects - immutable types that represent domain concepts

mod snowflake;
mod symbol;
mod team;

pub use snowflake::{Snowflake, SnowflakeParseError};
pub use symbol::{Headcount, ReactionSymbol, RosterKind, MAX_HEADCOUNT};
pub use team::Team;
