use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use aerosync_design::{ChangeSource, DesignSnapshot, FieldValue, Offer};
use aerosync_frame::{decode_frame_with_config, Frame};
use aerosync_transport::{
    ConnectionConfig, ConnectionManager, ConnectionStatus, Connector, InboundFrames,
};
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::status::GenerationStatus;
use crate::store::{Commit, DesignStore};
use crate::timing::{Debounce, Throttle};
use crate::view::SyncView;

/// Handle to a running sync engine.
///
/// The engine task owns the design store and is the only caller of
/// [`ConnectionManager::send`]. Handles submit edits and observe the
/// published [`SyncView`]. Every edit method resolves once the engine has
/// applied it.
#[derive(Clone)]
pub struct SyncHandle {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<SyncView>,
    connection: ConnectionManager,
    cancel: CancellationToken,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

#[derive(Debug, Clone, Copy)]
enum HistoryMove {
    Undo(usize),
    Redo(usize),
    JumpTo(usize),
}

enum Command {
    SetField {
        name: String,
        value: FieldValue,
        source: ChangeSource,
        reply: oneshot::Sender<Result<bool>>,
    },
    BeginDrag {
        reply: oneshot::Sender<()>,
    },
    EndDrag {
        reply: oneshot::Sender<bool>,
    },
    Load {
        snapshot: DesignSnapshot,
        label: String,
        reply: oneshot::Sender<()>,
    },
    Rename {
        name: String,
        reply: oneshot::Sender<()>,
    },
    History {
        step: HistoryMove,
        reply: oneshot::Sender<bool>,
    },
    ClearHistory {
        reply: oneshot::Sender<()>,
    },
}

impl SyncHandle {
    /// Connect through `connector` and start the engine on `initial`.
    /// Must be called from within a tokio runtime.
    pub fn spawn<C: Connector>(
        connector: C,
        connection: ConnectionConfig,
        config: SyncConfig,
        initial: DesignSnapshot,
    ) -> Self {
        let (manager, frames) = ConnectionManager::spawn(connector, connection);
        Self::attach(manager, frames, config, initial)
    }

    /// Start the engine on an existing connection.
    pub fn attach(
        connection: ConnectionManager,
        frames: InboundFrames,
        config: SyncConfig,
        initial: DesignSnapshot,
    ) -> Self {
        let store = DesignStore::new(initial, config.history_capacity);
        let link = connection.status();
        let (view_tx, view_rx) = watch::channel(store.view(link.clone(), false));
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let engine = Engine {
            generation: GenerationStatus::new(config.generation_timeout),
            throttle: Throttle::new(config.throttle_window),
            debounce: Debounce::new(config.debounce_quiet),
            connection: connection.clone(),
            store,
            link,
            synced_link: None,
            last_sent: None,
            view: view_tx,
            config,
        };
        let status = connection.subscribe();
        let task = tokio::spawn(engine.run(commands_rx, frames, status, cancel.clone()));

        Self {
            commands: commands_tx,
            view: view_rx,
            connection,
            cancel,
            task: Arc::new(Mutex::new(Some(task))),
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(command(reply))
            .map_err(|_| SyncError::Closed)?;
        rx.await.map_err(|_| SyncError::Closed)
    }

    /// Apply one field edit and send it according to `source`. Returns
    /// whether the design changed.
    pub async fn set_field(
        &self,
        name: &str,
        value: impl Into<FieldValue>,
        source: ChangeSource,
    ) -> Result<bool> {
        let name = name.to_string();
        let value = value.into();
        self.request(|reply| Command::SetField {
            name,
            value,
            source,
            reply,
        })
        .await?
    }

    /// Pause history recording for a drag gesture.
    pub async fn begin_drag(&self) -> Result<()> {
        self.request(|reply| Command::BeginDrag { reply }).await
    }

    /// Resume history recording with the gesture's end state. Returns
    /// whether an entry was recorded.
    pub async fn end_drag(&self) -> Result<bool> {
        self.request(|reply| Command::EndDrag { reply }).await
    }

    /// Replace the whole design, e.g. with a preset. Sent immediately.
    pub async fn load(&self, snapshot: DesignSnapshot, label: impl Into<String>) -> Result<()> {
        let label = label.into();
        self.request(|reply| Command::Load {
            snapshot,
            label,
            reply,
        })
        .await
    }

    /// Rename the design. Neither recorded nor sent.
    pub async fn rename(&self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.request(|reply| Command::Rename { name, reply }).await
    }

    /// Undo up to `steps` entries. Returns whether anything moved.
    pub async fn undo(&self, steps: usize) -> Result<bool> {
        self.history(HistoryMove::Undo(steps)).await
    }

    pub async fn redo(&self, steps: usize) -> Result<bool> {
        self.history(HistoryMove::Redo(steps)).await
    }

    /// Jump to `index` in the displayed history list.
    pub async fn jump_to(&self, index: usize) -> Result<bool> {
        self.history(HistoryMove::JumpTo(index)).await
    }

    async fn history(&self, step: HistoryMove) -> Result<bool> {
        self.request(|reply| Command::History { step, reply }).await
    }

    pub async fn clear_history(&self) -> Result<()> {
        self.request(|reply| Command::ClearHistory { reply }).await
    }

    /// Re-arm the connection after the retry ceiling was reached.
    pub fn reconnect(&self) -> bool {
        self.connection.reconnect()
    }

    /// Latest published view.
    pub fn view(&self) -> SyncView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncView> {
        self.view.clone()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    /// Stop the engine, clear pending timers and close the connection.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let task = lock(&self.task).take();
        if let Some(task) = task {
            let _ = task.await;
        }
        self.connection.shutdown().await;
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// A design waiting in a send policy.
#[derive(Debug, Clone)]
struct Pending {
    revision: u64,
    snapshot: Arc<DesignSnapshot>,
}

impl From<Commit> for Pending {
    fn from(commit: Commit) -> Self {
        Self {
            revision: commit.revision,
            snapshot: commit.snapshot,
        }
    }
}

struct Engine {
    config: SyncConfig,
    connection: ConnectionManager,
    store: DesignStore,
    generation: GenerationStatus,
    throttle: Throttle<Pending>,
    debounce: Debounce<Pending>,
    /// Last design the transport accepted.
    last_sent: Option<Arc<DesignSnapshot>>,
    link: ConnectionStatus,
    /// Link the current design was last pushed to on open.
    synced_link: Option<u64>,
    view: watch::Sender<SyncView>,
}

impl Engine {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut frames: InboundFrames,
        mut status: watch::Receiver<ConnectionStatus>,
        cancel: CancellationToken,
    ) {
        let initial = status.borrow_and_update().clone();
        self.on_connection(initial);
        self.publish();

        loop {
            let throttle_at = self.throttle.deadline();
            let debounce_at = self.debounce.deadline();
            let watchdog_at = self.generation.deadline();

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(frame) = frames.recv() => self.on_frame(frame),
                Ok(()) = status.changed() => {
                    let current = status.borrow_and_update().clone();
                    self.on_connection(current);
                }
                command = commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
                _ = wait_until(throttle_at) => self.on_throttle(),
                _ = wait_until(debounce_at) => self.on_debounce(),
                _ = wait_until(watchdog_at) => self.on_watchdog(),
            }

            if cancel.is_cancelled() {
                break;
            }
            self.publish();
        }

        self.teardown();
    }

    fn on_frame(&mut self, frame: Bytes) {
        match decode_frame_with_config(frame, &self.config.frame) {
            Ok(Frame::Mesh(mesh)) => {
                debug!(
                    vertices = mesh.vertex_count,
                    faces = mesh.face_count,
                    warnings = mesh.validation.len(),
                    "mesh frame"
                );
                self.store.apply_mesh(mesh);
            }
            Ok(Frame::Error(error)) => {
                info!(
                    error = %error.error,
                    field = error.field.as_deref().unwrap_or("-"),
                    "engine rejected design"
                );
                self.store.apply_error(error);
            }
            Err(err) => warn!(error = %err, "dropping undecodable frame"),
        }
        self.generation.settle();
    }

    fn on_connection(&mut self, status: ConnectionStatus) {
        // A fast close and reopen can arrive as connected -> connected.
        let replaced = status.link_id != self.link.link_id;
        self.generation.on_connection(status.state);
        if replaced && self.generation.settle() {
            debug!(link_id = status.link_id, "link replaced; in-flight snapshot lost");
        }
        let connected = status.state.is_connected();
        let link_id = status.link_id;
        self.link = status;

        if connected && self.synced_link != Some(link_id) {
            self.synced_link = Some(link_id);
            if self.config.resync_on_connect {
                debug!(link_id, revision = self.store.revision(), "link open; resyncing design");
                let pending = self.current();
                self.transmit(pending, "resync");
            }
        }
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::SetField {
                name,
                value,
                source,
                reply,
            } => {
                let result = match self.store.set_field(&name, value) {
                    Ok(Some(commit)) => {
                        self.schedule(commit, source);
                        Ok(true)
                    }
                    Ok(None) => Ok(false),
                    Err(err) => {
                        debug!(field = %name, error = %err, "edit rejected");
                        Err(err.into())
                    }
                };
                self.respond(reply, result);
            }
            Command::BeginDrag { reply } => {
                self.store.begin_gesture();
                trace!("drag gesture started");
                self.respond(reply, ());
            }
            Command::EndDrag { reply } => {
                let offer = self.store.end_gesture();
                trace!(?offer, "drag gesture ended");
                self.respond(reply, offer == Offer::Recorded);
            }
            Command::Load {
                snapshot,
                label,
                reply,
            } => {
                let commit = self.store.commit(snapshot, label);
                self.schedule(commit, ChangeSource::Immediate);
                self.respond(reply, ());
            }
            Command::Rename { name, reply } => {
                self.store.rename(name);
                self.respond(reply, ());
            }
            Command::History { step, reply } => {
                let commit = match step {
                    HistoryMove::Undo(n) => self.store.undo(n),
                    HistoryMove::Redo(n) => self.store.redo(n),
                    HistoryMove::JumpTo(index) => self.store.jump_to(index),
                };
                let moved = commit.is_some();
                if let Some(commit) = commit {
                    self.schedule(commit, ChangeSource::Immediate);
                }
                self.respond(reply, moved);
            }
            Command::ClearHistory { reply } => {
                self.store.clear_history();
                self.respond(reply, ());
            }
        }
    }

    // Callers observe the view that reflects their command.
    fn respond<T>(&self, reply: oneshot::Sender<T>, value: T) {
        self.publish();
        let _ = reply.send(value);
    }

    fn schedule(&mut self, commit: Commit, source: ChangeSource) {
        let pending = Pending::from(commit);
        let now = Instant::now();
        match source {
            ChangeSource::Immediate => self.transmit(pending, "immediate"),
            ChangeSource::Drag => {
                if let Some(leading) = self.throttle.offer(pending, now) {
                    self.transmit(leading, "drag");
                }
            }
            ChangeSource::Text => self.debounce.offer(pending, now),
        }
    }

    fn on_throttle(&mut self) {
        let Some(trailing) = self.throttle.fire(Instant::now()) else {
            return;
        };
        let already_sent = self
            .last_sent
            .as_ref()
            .is_some_and(|sent| sent.same_design(&trailing.snapshot));
        if already_sent {
            trace!(revision = trailing.revision, "trailing drag value already sent");
            return;
        }
        self.transmit(trailing, "drag trailing");
    }

    fn on_debounce(&mut self) {
        if let Some(pending) = self.debounce.fire(Instant::now()) {
            self.transmit(pending, "text");
        }
    }

    fn on_watchdog(&mut self) {
        if self.generation.expire(Instant::now()) {
            warn!(
                timeout_ms = self
                    .config
                    .generation_timeout
                    .map_or(0, |timeout| timeout.as_millis() as u64),
                "no frame for last send; clearing generating flag"
            );
        }
    }

    fn current(&self) -> Pending {
        Pending {
            revision: self.store.revision(),
            snapshot: Arc::clone(self.store.current()),
        }
    }

    fn transmit(&mut self, pending: Pending, reason: &'static str) {
        let Pending { revision, snapshot } = pending;
        let delivered = match snapshot.to_json() {
            Ok(payload) => self.connection.send(payload),
            Err(err) => {
                warn!(error = %err, "failed to encode design");
                false
            }
        };
        let generating = self.generation.mark_sent(delivered, Instant::now());
        if delivered {
            self.last_sent = Some(snapshot);
        }

        // Anything held back that is no newer than this send is covered by it.
        self.throttle.discard_if(|held| held.revision <= revision);
        self.debounce.discard_if(|held| held.revision <= revision);

        debug!(reason, revision, delivered, generating, "design sent");
    }

    fn publish(&self) {
        self.view.send_replace(
            self.store
                .view(self.link.clone(), self.generation.is_generating()),
        );
    }

    fn teardown(&mut self) {
        self.throttle.cancel();
        self.debounce.cancel();
        self.generation.settle();
        self.connection.close();
        self.link = self.connection.status();
        self.publish();
        debug!("sync engine stopped");
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
