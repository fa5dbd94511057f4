//! Connection management for the live preview stream.
//!
//! A [`ConnectionManager`] owns the single link to the geometry engine. It
//! runs a supervisor task that connects through a [`Connector`], forwards
//! inbound binary frames in receipt order, and reconnects with exponential
//! backoff until a retry ceiling is reached.
//!
//! Sends never queue: [`ConnectionManager::send`] reports whether the link
//! was open at call time.

pub mod config;
pub mod error;
pub mod link;
pub mod manager;
pub mod state;
pub mod ws;

pub use config::ConnectionConfig;
pub use error::{Result, TransportError};
pub use link::{Connector, Link, LinkEvent, LinkPeer};
pub use manager::{ConnectionManager, InboundFrames};
pub use state::{ConnectionState, ConnectionStatus};
pub use ws::WsConnector;
