//! relayircd core
//!
//! Connection multiplexer and protocol engine for a single-reactor IRC-style
//! chat relay: line framing, command parsing, the registration state machine,
//! channels and their modes, and the event loop that ties sockets to them.

pub mod channel;
mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod event_loop;
pub mod framer;
pub mod message;
pub mod numeric;
pub mod registry;
pub mod server;
pub mod session;
pub mod utils;

pub use channel::{Channel, ChannelMember, ChannelMode, JoinRefusal};
pub use config::Config;
pub use error::{Error, FrameError, Result};
pub use event_loop::EventLoop;
pub use framer::LineCodec;
pub use message::{Message, MessageType, Prefix};
pub use numeric::NumericReply;
pub use registry::{Registry, RegistryError};
pub use server::{CommandResult, Server};
pub use session::{ClientId, Outbox, Session};

/// Re-exports for convenience
pub use tracing::{debug, error, info, warn};
