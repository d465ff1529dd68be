//! Integration test utilities for the raid engine
//!
//! This crate provides an in-memory chat platform, a player directory and a
//! controllable clock for running the engine end to end.

pub mod fixtures;

pub use fixtures::*;
pub use helpers::*;
