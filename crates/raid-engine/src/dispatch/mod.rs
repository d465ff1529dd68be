//! Inbound event dispatch

mod dispatcher;

pub use dispatcher::{DispatcherConfig, EventDispatcher};
