//! Player enrichment port

use async_trait::async_trait;

use super::transport::TransportResult;
use crate::entities::PlayerInfo;
use crate::value_objects::Snowflake;

/// Resolves a raw user id into the details shown in rosters
///
/// How team and level are derived (roles, nickname suffixes, ...) is up to the
/// implementation.
#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    async fn lookup(&self, space_id: Snowflake, user_id: Snowflake) -> TransportResult<PlayerInfo>;
}
