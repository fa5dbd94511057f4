use std::fmt;

use serde::Serialize;

/// Lifecycle of the engine link.
///
/// ```text
/// connecting ──open──▶ connected ──unexpected close──▶ reconnecting
///     ▲                                                     │
///     └──────────────── backoff elapsed ◀───────────────────┘
///
/// reconnecting ──retry ceiling reached──▶ disconnected
/// any state ──intentional close──▶ disconnected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Connected,
    Reconnecting,
    Disconnected,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Disconnected => "disconnected",
        }
    }

    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable connection status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// Retries scheduled since the last successful connect.
    pub reconnect_attempts: u32,
    /// Most recent connect failure or close reason.
    pub last_error: Option<String>,
    /// Successful opens so far. Every new link gets the next number, so two
    /// `connected` statuses with different ids are different links.
    pub link_id: u64,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self {
            state: ConnectionState::Connecting,
            reconnect_attempts: 0,
            last_error: None,
            link_id: 0,
        }
    }
}
