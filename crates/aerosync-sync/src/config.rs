use std::time::Duration;

use aerosync_design::DEFAULT_HISTORY_CAPACITY;
use aerosync_frame::FrameConfig;

/// Timing and bookkeeping knobs for the sync engine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Window after a leading `drag` send during which further drag edits
    /// are held back.
    pub throttle_window: Duration,
    /// Quiet period a `text` edit must survive before it is sent.
    pub debounce_quiet: Duration,
    /// Clear the generating flag if no frame arrives within this long of a
    /// delivered send. `None` waits forever.
    pub generation_timeout: Option<Duration>,
    /// Undo steps kept behind the present.
    pub history_capacity: usize,
    /// Send the current design whenever the link (re)opens.
    pub resync_on_connect: bool,
    pub frame: FrameConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            throttle_window: Duration::from_millis(100),
            debounce_quiet: Duration::from_millis(300),
            generation_timeout: Some(Duration::from_secs(30)),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            resync_on_connect: true,
            frame: FrameConfig::default(),
        }
    }
}
