//! Bounded undo/redo history of design snapshots.
//!
//! The store keeps a linear timeline: `past` (oldest first), the `present`
//! entry, and `future` (nearest first). Recording a new snapshot clears the
//! future. Snapshots whose design payload equals the present are dropped.
//! While paused (during a drag gesture) offers are ignored; [`HistoryStore::resume`]
//! records the final state of the gesture as one entry.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::snapshot::DesignSnapshot;

/// Default number of entries kept behind the present.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

const INITIAL_LABEL: &str = "Initial design";

/// One point in the timeline.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub snapshot: Arc<DesignSnapshot>,
    pub label: String,
}

impl HistoryEntry {
    pub fn new(snapshot: Arc<DesignSnapshot>, label: impl Into<String>) -> Self {
        Self {
            snapshot,
            label: label.into(),
        }
    }
}

/// Outcome of offering a snapshot to the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Recorded,
    /// Same design as the present entry.
    Duplicate,
    /// Recording is paused.
    Paused,
}

#[derive(Debug)]
pub struct HistoryStore {
    past: VecDeque<HistoryEntry>,
    present: HistoryEntry,
    future: VecDeque<HistoryEntry>,
    capacity: usize,
    paused: bool,
}

impl HistoryStore {
    /// Start a timeline at `initial`. `capacity` bounds the past; zero keeps
    /// no undo steps at all.
    pub fn new(initial: Arc<DesignSnapshot>, capacity: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present: HistoryEntry::new(initial, INITIAL_LABEL),
            future: VecDeque::new(),
            capacity,
            paused: false,
        }
    }

    /// Offer a committed snapshot for recording.
    pub fn offer(&mut self, snapshot: Arc<DesignSnapshot>, label: impl Into<String>) -> Offer {
        if self.paused {
            return Offer::Paused;
        }
        self.record(snapshot, label.into())
    }

    fn record(&mut self, snapshot: Arc<DesignSnapshot>, label: String) -> Offer {
        if self.present.snapshot.same_design(&snapshot) {
            tracing::trace!(label = %label, "history: duplicate snapshot dropped");
            return Offer::Duplicate;
        }

        let previous = std::mem::replace(&mut self.present, HistoryEntry::new(snapshot, label));
        self.past.push_back(previous);
        self.future.clear();
        self.evict();

        tracing::trace!(
            label = %self.present.label,
            past = self.past.len(),
            "history: recorded"
        );
        Offer::Recorded
    }

    fn evict(&mut self) {
        while self.past.len() > self.capacity {
            self.past.pop_front();
        }
    }

    /// Stop recording until [`HistoryStore::resume`].
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Resume recording and record `snapshot` as the end state of the paused
    /// span. Still dropped when it matches the present.
    pub fn resume(&mut self, snapshot: Arc<DesignSnapshot>, label: impl Into<String>) -> Offer {
        self.paused = false;
        self.record(snapshot, label.into())
    }

    /// Step back up to `n` entries. Returns the new present, or `None` when
    /// nothing moved.
    pub fn undo(&mut self, n: usize) -> Option<&HistoryEntry> {
        let n = n.min(self.past.len());
        if n == 0 {
            return None;
        }

        // Entries after the target move to the future, nearest first.
        let mut moved = self.past.split_off(self.past.len() - n);
        let target = moved.pop_front()?;
        let previous = std::mem::replace(&mut self.present, target);
        moved.push_back(previous);
        for entry in moved.into_iter().rev() {
            self.future.push_front(entry);
        }

        tracing::trace!(
            steps = n,
            label = %self.present.label,
            past = self.past.len(),
            future = self.future.len(),
            "history: undo"
        );
        Some(&self.present)
    }

    /// Step forward up to `n` entries. Returns the new present, or `None`
    /// when nothing moved.
    pub fn redo(&mut self, n: usize) -> Option<&HistoryEntry> {
        let n = n.min(self.future.len());
        if n == 0 {
            return None;
        }

        let mut moved: VecDeque<HistoryEntry> = self.future.drain(..n).collect();
        let target = moved.pop_back()?;
        let previous = std::mem::replace(&mut self.present, target);
        self.past.push_back(previous);
        self.past.extend(moved);
        self.evict();

        tracing::trace!(
            steps = n,
            label = %self.present.label,
            past = self.past.len(),
            future = self.future.len(),
            "history: redo"
        );
        Some(&self.present)
    }

    /// Move to absolute `index` in [`HistoryStore::entries`] order.
    pub fn jump_to(&mut self, index: usize) -> Option<&HistoryEntry> {
        let position = self.position();
        if index < position {
            self.undo(position - index)
        } else if index > position && index - position <= self.future.len() {
            self.redo(index - position)
        } else {
            None
        }
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.past
            .iter()
            .chain(std::iter::once(&self.present))
            .chain(self.future.iter())
    }

    /// Index of the present entry in [`HistoryStore::entries`].
    pub fn position(&self) -> usize {
        self.past.len()
    }

    pub fn present(&self) -> &HistoryEntry {
        &self.present
    }

    /// Past entries, oldest first.
    pub fn past(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.past.iter()
    }

    /// Future entries, nearest first.
    pub fn future(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.future.iter()
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Drop past and future, keeping the present.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        self.paused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design(span: f64) -> Arc<DesignSnapshot> {
        let mut snapshot = DesignSnapshot::new("Test");
        snapshot
            .set_field("wing_span", span.into())
            .expect("wing_span is a number field");
        Arc::new(snapshot)
    }

    fn span(entry: &HistoryEntry) -> f64 {
        entry.snapshot.number("wing_span").unwrap()
    }

    fn store_with(spans: &[f64]) -> HistoryStore {
        let mut history = HistoryStore::new(design(spans[0]), DEFAULT_HISTORY_CAPACITY);
        for s in &spans[1..] {
            assert_eq!(history.offer(design(*s), format!("span {s}")), Offer::Recorded);
        }
        history
    }

    fn spans<'a>(entries: impl Iterator<Item = &'a HistoryEntry>) -> Vec<f64> {
        entries.map(span).collect()
    }

    #[test]
    fn duplicate_snapshots_are_not_recorded() {
        let mut history = store_with(&[1000.0]);
        assert_eq!(history.offer(design(1000.0), "same"), Offer::Duplicate);
        assert!(!history.can_undo());
    }

    #[test]
    fn undo_many_moves_entries_to_future() {
        // past [A, B, C], present D
        let mut history = store_with(&[1.0, 2.0, 3.0, 4.0]);

        let present = history.undo(2).map(span);
        assert_eq!(present, Some(2.0));
        assert_eq!(spans(history.past()), vec![1.0]);
        assert_eq!(spans(history.future()), vec![3.0, 4.0]);
    }

    #[test]
    fn redo_many_restores_order() {
        let mut history = store_with(&[1.0, 2.0, 3.0, 4.0]);
        history.undo(3);
        assert_eq!(span(history.present()), 1.0);

        let present = history.redo(2).map(span);
        assert_eq!(present, Some(3.0));
        assert_eq!(spans(history.past()), vec![1.0, 2.0]);
        assert_eq!(spans(history.future()), vec![4.0]);
    }

    #[test]
    fn undo_and_redo_clamp_to_available() {
        let mut history = store_with(&[1.0, 2.0, 3.0]);
        assert_eq!(history.undo(10).map(span), Some(1.0));
        assert!(history.undo(1).is_none());
        assert_eq!(history.redo(10).map(span), Some(3.0));
        assert!(history.redo(1).is_none());
        assert!(history.undo(0).is_none());
    }

    #[test]
    fn recording_clears_future() {
        let mut history = store_with(&[1.0, 2.0, 3.0]);
        history.undo(1);
        assert!(history.can_redo());

        history.offer(design(9.0), "branch");
        assert!(!history.can_redo());
        assert_eq!(spans(history.entries()), vec![1.0, 2.0, 9.0]);
    }

    #[test]
    fn paused_offers_collapse_into_one_entry() {
        let mut history = store_with(&[1000.0]);
        history.pause();
        for step in 1..=50 {
            let offer = history.offer(design(1000.0 + step as f64), "drag");
            assert_eq!(offer, Offer::Paused);
        }
        assert_eq!(history.resume(design(1050.0), "Set Wingspan to 1050"), Offer::Recorded);

        assert!(!history.is_paused());
        assert_eq!(spans(history.entries()), vec![1000.0, 1050.0]);
        assert_eq!(history.present().label, "Set Wingspan to 1050");
    }

    #[test]
    fn gesture_ending_where_it_started_records_nothing() {
        let mut history = store_with(&[1000.0]);
        history.pause();
        history.offer(design(1100.0), "drag");
        assert_eq!(history.resume(design(1000.0), "drag"), Offer::Duplicate);
        assert_eq!(history.entries().count(), 1);
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut history = HistoryStore::new(design(0.0), 2);
        for s in 1..=4 {
            history.offer(design(s as f64), "step");
        }
        assert_eq!(spans(history.entries()), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn jump_to_moves_in_either_direction() {
        let mut history = store_with(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(history.jump_to(0).map(span), Some(1.0));
        assert_eq!(history.jump_to(2).map(span), Some(3.0));
        assert_eq!(history.position(), 2);
        assert!(history.jump_to(2).is_none());
        assert!(history.jump_to(9).is_none());
    }

    #[test]
    fn clear_keeps_present() {
        let mut history = store_with(&[1.0, 2.0, 3.0]);
        history.undo(1);
        history.clear();
        assert_eq!(spans(history.entries()), vec![2.0]);
        assert_eq!(history.present().label, "span 2");
    }

    #[test]
    fn initial_entry_is_labelled() {
        let history = store_with(&[1.0]);
        assert_eq!(history.present().label, INITIAL_LABEL);
    }
}
