// Undo history
// Bounded stack of serialized editor values with a movable cursor

use chrono::Utc;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// A serialized editor value at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub value: String,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
}

impl HistoryEntry {
    pub fn new(value: String) -> Self {
        HistoryEntry {
            value,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// Bounded undo/redo stack of serialized values.
/// Boundary operations are no-ops; nothing here panics.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    current_index: Option<usize>,
    capacity: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        History {
            entries: Vec::new(),
            current_index: None,
            capacity: capacity.max(1),
        }
    }

    /// Record a new value.
    /// This clears any redo branch and adds the new entry
    pub fn push(&mut self, value: String) {
        // If we're in the middle of history, truncate everything after current position
        if let Some(idx) = self.current_index {
            self.entries.truncate(idx + 1);
        }

        self.entries.push(HistoryEntry::new(value));

        // Limit history size
        if self.entries.len() > self.capacity {
            let overflow = self.entries.len() - self.capacity;
            self.entries.drain(..overflow);
        }

        // Update current index to point to the new entry
        self.current_index = Some(self.entries.len() - 1);
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.current_index, Some(idx) if idx > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.current_index, Some(idx) if idx + 1 < self.entries.len())
    }

    /// Step back one entry
    /// Returns the value to restore, or None at the oldest entry
    pub fn undo(&mut self) -> Option<&str> {
        if let Some(idx) = self.current_index
            && idx > 0
        {
            self.current_index = Some(idx - 1);
            return self.entries.get(idx - 1).map(|e| e.value.as_str());
        }
        None
    }

    /// Step forward one entry
    /// Returns the value to restore, or None at the newest entry
    pub fn redo(&mut self) -> Option<&str> {
        if let Some(idx) = self.current_index
            && idx + 1 < self.entries.len()
        {
            self.current_index = Some(idx + 1);
            return self.entries.get(idx + 1).map(|e| e.value.as_str());
        }
        None
    }

    /// Get the current entry without navigating
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.current_index.and_then(|idx| self.entries.get(idx))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(history: &History) -> &str {
        history.current().map(|e| e.value.as_str()).unwrap_or_default()
    }

    #[test]
    fn test_push_and_navigate() {
        let mut history = History::new();

        history.push("one".to_string());
        history.push("two".to_string());
        history.push("three".to_string());

        assert_eq!(value(&history), "three");
        assert!(history.can_undo());
        assert!(!history.can_redo());

        assert_eq!(history.undo(), Some("two"));
        assert!(history.can_undo());
        assert!(history.can_redo());

        assert_eq!(history.redo(), Some("three"));
        assert_eq!(value(&history), "three");
    }

    #[test]
    fn test_push_clears_redo_branch() {
        let mut history = History::new();

        history.push("one".to_string());
        history.push("two".to_string());
        history.push("three".to_string());
        history.undo();
        history.undo();

        assert_eq!(value(&history), "one");

        history.push("four".to_string());
        assert_eq!(value(&history), "four");
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = History::new();

        for i in 0..75 {
            history.push(format!("v{}", i));
        }

        assert_eq!(history.len(), DEFAULT_HISTORY_CAPACITY);
        assert_eq!(history.current_index(), Some(DEFAULT_HISTORY_CAPACITY - 1));
        assert_eq!(value(&history), "v74");
        assert_eq!(history.entries()[0].value, "v25");

        let mut oldest = String::new();
        while let Some(v) = history.undo() {
            oldest = v.to_string();
        }
        assert_eq!(oldest, "v25");
    }

    #[test]
    fn test_edges_are_noops() {
        let mut empty = History::new();
        assert_eq!(empty.undo(), None);
        assert_eq!(empty.redo(), None);

        let mut history = History::with_capacity(0);
        assert_eq!(history.capacity(), 1);
        history.push("a".to_string());
        history.push("b".to_string());
        assert_eq!(history.len(), 1);
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), None);
        assert_eq!(value(&history), "b");
    }
}
