use std::sync::Arc;

use aerosync_design::{field, DesignError, DesignSnapshot, FieldValue, HistoryStore, Offer};
use aerosync_frame::{DerivedValues, ErrorFrame, MeshFrame, ValidationWarning};
use aerosync_transport::ConnectionStatus;

use crate::view::SyncView;

const GESTURE_LABEL: &str = "Drag";

/// A design change that went through [`DesignStore::commit`].
#[derive(Debug, Clone)]
pub struct Commit {
    /// Monotonic counter of design changes, used to order pending sends.
    pub revision: u64,
    pub snapshot: Arc<DesignSnapshot>,
    pub offer: Offer,
}

/// Owner of the current design, its history and the latest engine output.
///
/// Every design mutation funnels through [`DesignStore::commit`] or one of
/// the history moves, which swap the current snapshot in one assignment.
#[derive(Debug)]
pub struct DesignStore {
    current: Arc<DesignSnapshot>,
    revision: u64,
    history: HistoryStore,
    gesture_label: Option<String>,
    mesh: Option<Arc<MeshFrame>>,
    derived: DerivedValues,
    validation: Vec<ValidationWarning>,
    engine_error: Option<ErrorFrame>,
}

impl DesignStore {
    pub fn new(initial: DesignSnapshot, history_capacity: usize) -> Self {
        let current = Arc::new(initial);
        Self {
            history: HistoryStore::new(Arc::clone(&current), history_capacity),
            current,
            revision: 0,
            gesture_label: None,
            mesh: None,
            derived: DerivedValues::default(),
            validation: Vec::new(),
            engine_error: None,
        }
    }

    pub fn current(&self) -> &Arc<DesignSnapshot> {
        &self.current
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Replace the current design and offer it to the history.
    pub fn commit(&mut self, snapshot: DesignSnapshot, label: impl Into<String>) -> Commit {
        let label = label.into();
        let snapshot = self.replace(snapshot);
        if self.history.is_paused() {
            self.gesture_label = Some(label.clone());
        }
        let offer = self.history.offer(Arc::clone(&snapshot), label);
        Commit {
            revision: self.revision,
            snapshot,
            offer,
        }
    }

    /// Set one field on a copy of the current design and commit it. Returns
    /// `None` when the value is unchanged.
    pub fn set_field(&mut self, name: &str, value: FieldValue) -> Result<Option<Commit>, DesignError> {
        let spec = field(name).ok_or_else(|| DesignError::UnknownField(name.to_string()))?;
        let label = spec.set_label(&value);
        let mut next = DesignSnapshot::clone(&self.current);
        if !next.set_field(name, value)? {
            return Ok(None);
        }
        Ok(Some(self.commit(next, label)))
    }

    /// Change the design's name. No history entry, no revision bump.
    pub fn rename(&mut self, name: impl Into<String>) {
        let mut next = DesignSnapshot::clone(&self.current);
        next.rename(name);
        self.current = Arc::new(next);
    }

    pub fn begin_gesture(&mut self) {
        self.gesture_label = None;
        self.history.pause();
    }

    /// Record the end state of the gesture as one history entry.
    pub fn end_gesture(&mut self) -> Offer {
        let label = self
            .gesture_label
            .take()
            .unwrap_or_else(|| GESTURE_LABEL.to_string());
        self.history.resume(Arc::clone(&self.current), label)
    }

    pub fn undo(&mut self, n: usize) -> Option<Commit> {
        let target = self.history.undo(n).map(|entry| Arc::clone(&entry.snapshot))?;
        Some(self.restore(&target))
    }

    pub fn redo(&mut self, n: usize) -> Option<Commit> {
        let target = self.history.redo(n).map(|entry| Arc::clone(&entry.snapshot))?;
        Some(self.restore(&target))
    }

    pub fn jump_to(&mut self, index: usize) -> Option<Commit> {
        let target = self
            .history
            .jump_to(index)
            .map(|entry| Arc::clone(&entry.snapshot))?;
        Some(self.restore(&target))
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.gesture_label = None;
    }

    // History moves restore the design payload but keep the current meta.
    fn restore(&mut self, target: &DesignSnapshot) -> Commit {
        let restored = self.current.with_payload_of(target);
        let snapshot = self.replace(restored);
        Commit {
            revision: self.revision,
            snapshot,
            offer: Offer::Duplicate,
        }
    }

    fn replace(&mut self, snapshot: DesignSnapshot) -> Arc<DesignSnapshot> {
        self.revision += 1;
        self.current = Arc::new(snapshot);
        Arc::clone(&self.current)
    }

    /// Take a decoded mesh as the latest engine output.
    pub fn apply_mesh(&mut self, mesh: MeshFrame) {
        self.derived = mesh.derived.clone();
        self.validation = mesh.validation.clone();
        self.mesh = Some(Arc::new(mesh));
        self.engine_error = None;
    }

    /// Keep an engine-reported error until the next mesh.
    pub fn apply_error(&mut self, error: ErrorFrame) {
        self.engine_error = Some(error);
    }

    pub fn mesh(&self) -> Option<&Arc<MeshFrame>> {
        self.mesh.as_ref()
    }

    pub fn engine_error(&self) -> Option<&ErrorFrame> {
        self.engine_error.as_ref()
    }

    pub fn view(&self, connection: ConnectionStatus, is_generating: bool) -> SyncView {
        SyncView {
            design: Arc::clone(&self.current),
            mesh: self.mesh.clone(),
            derived: self.derived.clone(),
            validation: self.validation.clone(),
            engine_error: self.engine_error.clone(),
            connection,
            is_generating,
            past: self.history.past().cloned().collect(),
            present_label: self.history.present().label.clone(),
            future: self.history.future().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> DesignStore {
        DesignStore::new(DesignSnapshot::new("Test"), 100)
    }

    #[test]
    fn set_field_commits_with_catalog_label() {
        let mut store = store();
        let commit = store
            .set_field("wing_span", 1300.0.into())
            .unwrap()
            .expect("value changed");

        assert_eq!(commit.revision, 1);
        assert_eq!(commit.offer, Offer::Recorded);
        assert_eq!(store.history().present().label, "Set Wingspan to 1300");
        assert_eq!(store.current().number("wing_span"), Some(1300.0));
    }

    #[test]
    fn unchanged_value_is_not_committed() {
        let mut store = store();
        assert!(store.set_field("wing_span", 1200.0.into()).unwrap().is_none());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn relabelled_identical_design_keeps_one_entry() {
        let mut store = store();
        store.set_field("wing_span", 1300.0.into()).unwrap();
        let same = DesignSnapshot::clone(store.current());
        let commit = store.commit(same, "Load preset");

        assert_eq!(commit.offer, Offer::Duplicate);
        assert_eq!(store.history().entries().count(), 2);
    }

    #[test]
    fn gesture_records_one_entry_with_last_label() {
        let mut store = store();
        store.begin_gesture();
        for step in 1..=50 {
            let commit = store
                .set_field("wing_span", (1200.0 + step as f64).into())
                .unwrap()
                .unwrap();
            assert_eq!(commit.offer, Offer::Paused);
        }
        assert_eq!(store.end_gesture(), Offer::Recorded);

        assert_eq!(store.history().entries().count(), 2);
        assert_eq!(store.history().present().label, "Set Wingspan to 1250");
    }

    #[test]
    fn undo_restores_payload_and_keeps_meta() {
        let mut store = store();
        store.set_field("wing_span", 1300.0.into()).unwrap();
        store.rename("Renamed");
        assert_eq!(store.history().entries().count(), 2, "rename adds no entry");

        let commit = store.undo(1).expect("one step back");
        assert_eq!(commit.snapshot.number("wing_span"), Some(1200.0));
        assert_eq!(commit.snapshot.name(), "Renamed");
        assert!(store.history().can_redo());

        let commit = store.redo(1).expect("one step forward");
        assert_eq!(commit.snapshot.number("wing_span"), Some(1300.0));
    }

    #[test]
    fn mesh_clears_engine_error() {
        let mut store = store();
        store.apply_error(ErrorFrame {
            error: "invalid design".into(),
            detail: String::new(),
            field: Some("wing_span".into()),
        });
        assert!(store.engine_error().is_some());

        let mut buf = bytes::BytesMut::new();
        aerosync_frame::encode_mesh_frame(&[0.0; 3], &[0.0; 3], &[], None, &mut buf).unwrap();
        let aerosync_frame::Frame::Mesh(mesh) = aerosync_frame::decode_frame(buf.freeze()).unwrap()
        else {
            panic!("expected mesh frame");
        };
        store.apply_mesh(mesh);

        assert!(store.engine_error().is_none());
        assert!(store.mesh().is_some());
    }
}
