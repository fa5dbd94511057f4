//! Send-rate policies as plain state machines.
//!
//! Neither type owns a timer. The engine asks for [`Throttle::deadline`] /
//! [`Debounce::deadline`], sleeps until then, and calls `fire` with the
//! current time. Values are passed in explicitly on every edit so a fired
//! timer never sees stale state.

use std::time::Duration;

use tokio::time::Instant;

/// Leading-edge send, then at most one trailing send per window carrying
/// the latest value seen while the window was open.
#[derive(Debug)]
pub struct Throttle<T> {
    window: Duration,
    open_until: Option<Instant>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            open_until: None,
            pending: None,
        }
    }

    /// Offer a value. Returns it back if it should be sent now.
    pub fn offer(&mut self, value: T, now: Instant) -> Option<T> {
        match self.open_until {
            Some(until) if now < until => {
                self.pending = Some(value);
                None
            }
            _ => {
                self.open_until = Some(now + self.window);
                self.pending = None;
                Some(value)
            }
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.open_until
    }

    /// Close the window if it has elapsed. A held value is returned for the
    /// trailing send and starts a fresh window.
    pub fn fire(&mut self, now: Instant) -> Option<T> {
        match self.open_until {
            Some(until) if now >= until => match self.pending.take() {
                Some(value) => {
                    self.open_until = Some(now + self.window);
                    Some(value)
                }
                None => {
                    self.open_until = None;
                    None
                }
            },
            _ => None,
        }
    }

    /// Drop the held value if `stale` says it was already covered.
    pub fn discard_if(&mut self, stale: impl FnOnce(&T) -> bool) {
        if self.pending.as_ref().is_some_and(stale) {
            self.pending = None;
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.open_until = None;
        self.pending = None;
    }
}

/// Send once the input has been quiet for a fixed period.
#[derive(Debug)]
pub struct Debounce<T> {
    quiet: Duration,
    deadline: Option<Instant>,
    pending: Option<T>,
}

impl<T> Debounce<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
            pending: None,
        }
    }

    /// Replace the held value and restart the quiet period.
    pub fn offer(&mut self, value: T, now: Instant) {
        self.pending = Some(value);
        self.deadline = Some(now + self.quiet);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn fire(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    pub fn discard_if(&mut self, stale: impl FnOnce(&T) -> bool) {
        if self.pending.as_ref().is_some_and(stale) {
            self.pending = None;
            self.deadline = None;
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
        self.pending = None;
    }
}
