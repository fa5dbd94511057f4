use std::future::Future;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::Result;

/// Something that can open a link to the geometry engine.
///
/// The supervisor calls `connect` at most once at a time and never while a
/// previous call is still pending.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self) -> impl Future<Output = Result<Link>> + Send;
}

/// Event surfaced by an open link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// One complete binary message.
    Binary(Bytes),
    /// The remote side closed, or the link failed.
    Closed { reason: Option<String> },
}

/// The manager's side of an open link.
#[derive(Debug)]
pub struct Link {
    /// Outbound JSON text messages. Dropping it closes the link.
    pub outbound: mpsc::UnboundedSender<String>,
    /// Inbound events in receipt order. End of stream counts as a close.
    pub inbound: mpsc::UnboundedReceiver<LinkEvent>,
}

/// The wire side of a link: whatever pumps bytes to and from the engine.
#[derive(Debug)]
pub struct LinkPeer {
    /// Messages the manager sent.
    pub sent: mpsc::UnboundedReceiver<String>,
    /// Events to deliver to the manager.
    pub events: mpsc::UnboundedSender<LinkEvent>,
}

impl Link {
    /// Create a connected link/peer pair.
    pub fn pair() -> (Link, LinkPeer) {
        let (outbound, sent) = mpsc::unbounded_channel();
        let (events, inbound) = mpsc::unbounded_channel();
        (Link { outbound, inbound }, LinkPeer { sent, events })
    }
}

impl LinkPeer {
    /// Deliver a binary frame to the manager. Returns false once the manager
    /// side is gone.
    pub fn deliver(&self, frame: impl Into<Bytes>) -> bool {
        self.events.send(LinkEvent::Binary(frame.into())).is_ok()
    }

    /// Report a close to the manager.
    pub fn close(&self, reason: Option<String>) {
        let _ = self.events.send(LinkEvent::Closed { reason });
    }
}
