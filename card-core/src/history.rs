//! Bounded undo/redo history.
//!
//! Snapshots are whole values (for the editor, the full element collection)
//! taken immediately before a mutation. The undo stack holds at most
//! `capacity` entries; pushing beyond that evicts the oldest.

use std::collections::VecDeque;

/// Default number of undo steps kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Two bounded stacks of snapshots.
#[derive(Debug, Clone)]
pub struct HistoryManager<T> {
    undo_stack: VecDeque<T>,
    redo_stack: Vec<T>,
    capacity: usize,
}

impl<T> Default for HistoryManager<T> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl<T> HistoryManager<T> {
    /// Create a history keeping at most `capacity` undo steps.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(capacity),
            redo_stack: Vec::new(),
            capacity,
        }
    }

    /// Record the state preceding a new mutation. Clears the redo stack.
    pub fn push(&mut self, snapshot: T) {
        self.push_undo(snapshot);
        self.redo_stack.clear();
    }

    fn push_undo(&mut self, snapshot: T) {
        if self.capacity == 0 {
            return;
        }
        if self.undo_stack.len() >= self.capacity {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(snapshot);
    }

    /// Step back: park `current` on the redo stack and return the most recent
    /// snapshot. Returns `None` (and drops nothing) when there is nothing to undo.
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.undo_stack.pop_back()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    /// Step forward: record `current` as an undo step and return the most
    /// recently undone state. Does not clear the redo stack.
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.redo_stack.pop()?;
        self.push_undo(current);
        Some(next)
    }

    /// Whether an undo step is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether a redo step is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo steps held.
    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redo steps held.
    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Maximum number of undo steps.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop both stacks.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_empty_is_noop() {
        let mut history: HistoryManager<u32> = HistoryManager::default();
        assert_eq!(history.undo(7), None);
        assert_eq!(history.redo_len(), 0);
    }

    #[test]
    fn test_undo_then_redo() {
        let mut history = HistoryManager::new(10);
        history.push(1);
        let restored = history.undo(2).expect("undo");
        assert_eq!(restored, 1);
        assert!(history.can_redo());
        let redone = history.redo(restored).expect("redo");
        assert_eq!(redone, 2);
        assert_eq!(history.undo_len(), 1);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_push_clears_redo() {
        let mut history = HistoryManager::new(10);
        history.push(1);
        let _ = history.undo(2);
        history.push(3);
        assert!(!history.can_redo());
        assert_eq!(history.redo(4), None);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = HistoryManager::new(3);
        for i in 0..5 {
            history.push(i);
        }
        assert_eq!(history.undo_len(), 3);
        assert_eq!(history.undo(99), Some(4));
        assert_eq!(history.undo(4), Some(3));
        assert_eq!(history.undo(3), Some(2));
        assert_eq!(history.undo(2), None);
    }

    #[test]
    fn test_zero_capacity_records_nothing() {
        let mut history = HistoryManager::new(0);
        history.push(1);
        assert!(!history.can_undo());
    }
}
