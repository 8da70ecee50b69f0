#![forbid(unsafe_code)]

//! Snapshot undo/redo history for published layout states.
//!
//! Every published state is already an `Arc<LayoutState>`, so the history
//! keeps the same `Arc`s the store hands to subscribers. Recording a step
//! costs one pointer clone.
//!
//! ```text
//! record(s3)            undo() x2              record(s4)
//! past:   [s0 s1 s2 s3] past:   [s0 s1]        past:   [s0 s1 s4]
//! future: []            future: [s3 s2]        future: []
//! ```
//!
//! The back of `past` is always the current state.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Default number of retained states, current included.
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

/// Bounded snapshot history.
///
/// # Invariants
///
/// 1. `past` is non-empty once seeded and never exceeds `max_depth`.
/// 2. `future` is cleared on every [`record`](Self::record).
pub struct SnapshotHistory<T> {
    past: VecDeque<Arc<T>>,
    future: Vec<Arc<T>>,
    max_depth: usize,
}

impl<T> fmt::Debug for SnapshotHistory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotHistory")
            .field("undo_depth", &self.past.len())
            .field("redo_depth", &self.future.len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl<T> SnapshotHistory<T> {
    /// Start a history at `initial`. A depth of 0 is treated as 1.
    #[must_use]
    pub fn new(initial: Arc<T>, max_depth: usize) -> Self {
        let mut past = VecDeque::new();
        past.push_back(initial);
        Self {
            past,
            future: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record a new current state. Starts a new branch: redo is lost.
    pub fn record(&mut self, state: Arc<T>) {
        self.future.clear();
        self.past.push_back(state);
        while self.past.len() > self.max_depth {
            self.past.pop_front();
        }
    }

    /// Step back. Returns the state that becomes current.
    pub fn undo(&mut self) -> Option<Arc<T>> {
        if self.past.len() < 2 {
            return None;
        }
        let current = self.past.pop_back()?;
        self.future.push(current);
        self.past.back().cloned()
    }

    /// Step forward. Returns the state that becomes current.
    pub fn redo(&mut self) -> Option<Arc<T>> {
        let next = self.future.pop()?;
        self.past.push_back(next);
        self.past.back().cloned()
    }

    #[must_use]
    pub fn current(&self) -> Option<&Arc<T>> {
        self.past.back()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.past.len() >= 2
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// States on the undo side, current included.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}
