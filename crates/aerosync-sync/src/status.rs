use std::time::Duration;

use aerosync_transport::ConnectionState;
use tokio::time::Instant;

/// Tracks whether the engine is working on a snapshot we sent.
///
/// The flag only goes up for a send the transport accepted, and comes down
/// on any frame, on a decode failure, when the link leaves `connected`, or
/// when the watchdog expires.
#[derive(Debug)]
pub struct GenerationStatus {
    generating: bool,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
}

impl GenerationStatus {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            generating: false,
            timeout,
            deadline: None,
        }
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    /// Record the outcome of a send. Returns the new flag.
    pub fn mark_sent(&mut self, delivered: bool, now: Instant) -> bool {
        if delivered {
            self.generating = true;
            self.deadline = self.timeout.map(|timeout| now + timeout);
        } else {
            self.clear();
        }
        self.generating
    }

    /// A frame (or an undecodable frame) arrived. Returns whether the flag
    /// was up.
    pub fn settle(&mut self) -> bool {
        let was = self.generating;
        self.clear();
        was
    }

    pub fn on_connection(&mut self, state: ConnectionState) {
        if !state.is_connected() {
            self.clear();
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Clear the flag if the watchdog deadline has passed.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.clear();
                true
            }
            _ => false,
        }
    }

    fn clear(&mut self) {
        self.generating = false;
        self.deadline = None;
    }
}
