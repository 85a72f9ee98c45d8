//! Undo history of pre-stroke snapshots.
//!
//! Each entry pairs a surface snapshot with the emptiness flag at the time it
//! was taken, so undoing the only stroke leaves the pad empty again.

/// A saved surface state.
#[derive(Debug, Clone)]
pub struct HistoryEntry<S> {
    pub snapshot: S,
    pub was_empty: bool,
}

/// Stack of snapshots, optionally bounded (oldest dropped first).
#[derive(Debug, Clone)]
pub struct SnapshotHistory<S> {
    entries: Vec<HistoryEntry<S>>,
    max_depth: Option<usize>,
}

impl<S> SnapshotHistory<S> {
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            max_depth,
        }
    }

    pub fn push(&mut self, snapshot: S, was_empty: bool) {
        self.entries.push(HistoryEntry {
            snapshot,
            was_empty,
        });
        if let Some(max) = self.max_depth
            && self.entries.len() > max
        {
            self.entries.remove(0);
        }
    }

    pub fn pop(&mut self) -> Option<HistoryEntry<S>> {
        self.entries.pop()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }
}
