use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

use crate::config::ConnectionConfig;
use crate::link::{Connector, Link, LinkEvent};
use crate::state::{ConnectionState, ConnectionStatus};

/// Inbound binary frames, in receipt order.
pub type InboundFrames = mpsc::UnboundedReceiver<Bytes>;

/// Handle to the single engine link.
///
/// Cloning the handle shares the same link. The transport itself is owned by
/// the supervisor task; handles can only send, observe and close. Dropping
/// the last handle closes the link.
#[derive(Clone)]
pub struct ConnectionManager {
    shared: Arc<Shared>,
    _guard: Arc<DropGuard>,
}

struct Shared {
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    status: watch::Sender<ConnectionStatus>,
    cancel: CancellationToken,
    rearm: Notify,
    task: Mutex<Option<JoinHandle<()>>>,
}

enum LinkEnd {
    Cancelled,
    Closed(Option<String>),
}

impl ConnectionManager {
    /// Start the supervisor task. Must be called from within a tokio runtime.
    pub fn spawn<C: Connector>(connector: C, config: ConnectionConfig) -> (Self, InboundFrames) {
        let (status, _) = watch::channel(ConnectionStatus::default());
        let shared = Arc::new(Shared {
            outbound: Mutex::new(None),
            status,
            cancel: CancellationToken::new(),
            rearm: Notify::new(),
            task: Mutex::new(None),
        });
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();

        let guard = Arc::new(shared.cancel.clone().drop_guard());
        let handle = tokio::spawn(supervise(connector, config, Arc::clone(&shared), frames_tx));
        *lock(&shared.task) = Some(handle);

        (
            Self {
                shared,
                _guard: guard,
            },
            frames_rx,
        )
    }

    /// Send one snapshot payload.
    ///
    /// Returns true only if the link was open at call time and accepted the
    /// message. Nothing is queued for later delivery.
    pub fn send(&self, payload: String) -> bool {
        if !self.shared.status.borrow().state.is_connected() {
            return false;
        }
        match lock(&self.shared.outbound).as_ref() {
            Some(tx) => tx.send(payload).is_ok(),
            None => false,
        }
    }

    /// Current status.
    pub fn status(&self) -> ConnectionStatus {
        self.shared.status.borrow().clone()
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }

    /// Re-arm the supervisor after the retry ceiling was exhausted.
    ///
    /// Returns false if the link is not in the exhausted `disconnected`
    /// state, or was closed intentionally.
    pub fn reconnect(&self) -> bool {
        if self.shared.cancel.is_cancelled() {
            return false;
        }
        if self.shared.status.borrow().state != ConnectionState::Disconnected {
            return false;
        }
        info!("manual reconnect requested");
        self.shared.rearm.notify_one();
        true
    }

    /// Close the link intentionally. No retries are scheduled afterwards.
    pub fn close(&self) {
        if self.shared.cancel.is_cancelled() {
            return;
        }
        self.shared.cancel.cancel();
        lock(&self.shared.outbound).take();
        self.shared.set(ConnectionState::Disconnected, 0, None);
    }

    /// Close the link and wait for the supervisor task to finish.
    pub async fn shutdown(&self) {
        self.close();
        let task = lock(&self.shared.task).take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    /// True once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }
}

impl Shared {
    fn set(&self, state: ConnectionState, attempts: u32, last_error: Option<String>) {
        let link_id = self.status.borrow().link_id;
        let previous = self.status.send_replace(ConnectionStatus {
            state,
            reconnect_attempts: attempts,
            last_error,
            link_id,
        });
        if previous.state != state {
            info!(from = %previous.state, to = %state, attempts, "connection state changed");
        }
    }

    /// Publish `connected` for a freshly opened link.
    fn open(&self) -> u64 {
        let link_id = self.status.borrow().link_id + 1;
        let previous = self.status.send_replace(ConnectionStatus {
            state: ConnectionState::Connected,
            reconnect_attempts: 0,
            last_error: None,
            link_id,
        });
        info!(from = %previous.state, link_id, "connection open");
        link_id
    }

    fn last_error(&self) -> Option<String> {
        self.status.borrow().last_error.clone()
    }
}

async fn supervise<C: Connector>(
    connector: C,
    config: ConnectionConfig,
    shared: Arc<Shared>,
    frames: mpsc::UnboundedSender<Bytes>,
) {
    let mut attempts: u32 = 0;

    loop {
        shared.set(ConnectionState::Connecting, attempts, shared.last_error());

        let outcome = tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => break,
            outcome = connector.connect() => outcome,
        };
        if shared.cancel.is_cancelled() {
            break;
        }

        let last_error = match outcome {
            Ok(link) => {
                attempts = 0;
                match run_link(link, &shared, &frames).await {
                    LinkEnd::Cancelled => break,
                    LinkEnd::Closed(reason) => {
                        warn!(reason = reason.as_deref().unwrap_or("none"), "connection closed");
                        reason.or_else(|| Some("connection closed".to_string()))
                    }
                }
            }
            Err(err) => {
                warn!(attempt = attempts, error = %err, "connect failed");
                Some(err.to_string())
            }
        };

        // The ceiling gates whether another attempt is scheduled, using the
        // count left by the attempt that just finished.
        if attempts >= config.max_retries {
            error!(attempts, "retry ceiling reached; giving up");
            shared.set(ConnectionState::Disconnected, attempts, last_error);
            tokio::select! {
                biased;
                _ = shared.cancel.cancelled() => break,
                _ = shared.rearm.notified() => {
                    attempts = 0;
                    continue;
                }
            }
        }

        attempts += 1;
        let delay = config.backoff_delay(attempts);
        shared.set(ConnectionState::Reconnecting, attempts, last_error);
        debug!(attempt = attempts, delay_ms = delay.as_millis() as u64, "scheduling reconnect");

        tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    lock(&shared.outbound).take();
    shared.set(ConnectionState::Disconnected, 0, None);
    debug!("connection supervisor stopped");
}

async fn run_link(link: Link, shared: &Shared, frames: &mpsc::UnboundedSender<Bytes>) -> LinkEnd {
    let Link {
        outbound,
        mut inbound,
    } = link;

    *lock(&shared.outbound) = Some(outbound);
    let link_id = shared.open();

    let end = loop {
        tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => break LinkEnd::Cancelled,
            event = inbound.recv() => match event {
                Some(LinkEvent::Binary(frame)) => {
                    debug!(link_id, len = frame.len(), "frame received");
                    if frames.send(frame).is_err() {
                        debug!("frame consumer gone; dropping frame");
                    }
                }
                Some(LinkEvent::Closed { reason }) => break LinkEnd::Closed(reason),
                None => break LinkEnd::Closed(None),
            }
        }
    };

    lock(&shared.outbound).take();
    end
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
