//! # raid-engine
//!
//! The raid-state engine: a concurrent store of active raids, reconciliation of
//! reaction notifications into rosters, recovery from posted messages, and the
//! periodic refresh/expiry sweep, plus the runtime that drives them.

pub mod dispatch;
pub mod engine;
pub mod runtime;
pub mod store;
pub mod sweeper;

// Re-export commonly used types at crate root
pub use dispatch::{DispatcherConfig, EventDispatcher};
pub use engine::{
    Adjustment, EngineBuilder, EngineSettings, RaidEngine, RaidRequest, RaidTarget,
    RecoveryReport, SweepReport,
};
pub use runtime::RaidRuntime;
pub use store::{RaidKey, RaidSlot, RaidStore};
