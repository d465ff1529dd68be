//! Ports - what the raid domain needs from the outside world
//!
//! The engine owns no connection to the chat platform. It talks to it through
//! [`ChatTransport`] and resolves who a reacting user is through
//! [`PlayerDirectory`]; the hosting process provides the implementations.

mod directory;
mod transport;

pub use directory::PlayerDirectory;
pub use transport::{ChannelMessage, ChatTransport, ReactionUser, TransportError, TransportResult};
