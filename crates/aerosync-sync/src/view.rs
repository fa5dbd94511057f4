use std::sync::Arc;

use aerosync_design::{DesignSnapshot, HistoryEntry};
use aerosync_frame::{DerivedValues, ErrorFrame, MeshFrame, ValidationWarning};
use aerosync_transport::ConnectionStatus;

/// Everything a presentation layer renders, published after each change.
#[derive(Debug, Clone)]
pub struct SyncView {
    pub design: Arc<DesignSnapshot>,
    /// Latest mesh, `None` before the first successful frame.
    pub mesh: Option<Arc<MeshFrame>>,
    pub derived: DerivedValues,
    pub validation: Vec<ValidationWarning>,
    /// Latest error reported by the engine, cleared by the next mesh.
    pub engine_error: Option<ErrorFrame>,
    pub connection: ConnectionStatus,
    pub is_generating: bool,
    /// Undo entries, oldest first.
    pub past: Vec<HistoryEntry>,
    pub present_label: String,
    /// Redo entries, nearest first.
    pub future: Vec<HistoryEntry>,
}

impl SyncView {
    /// Labels of the full history list with the index of the present entry.
    pub fn history_labels(&self) -> (Vec<&str>, usize) {
        let labels = self
            .past
            .iter()
            .map(|entry| entry.label.as_str())
            .chain(std::iter::once(self.present_label.as_str()))
            .chain(self.future.iter().map(|entry| entry.label.as_str()))
            .collect();
        (labels, self.past.len())
    }
}
