//! Bounded, most-recent-first history of completed exchanges

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

pub const MAX_HISTORY_ENTRIES: usize = 5;

/// One completed exchange. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Unique and strictly increasing in insertion order
    pub id: u64,
    pub prompt: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    next_id: u64,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY_ENTRIES)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
            next_id: 1,
        }
    }

    /// Insert at the front, dropping the oldest entry beyond capacity
    pub fn push(&mut self, prompt: impl Into<String>, answer: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.entries.push_front(HistoryEntry {
            id,
            prompt: prompt.into(),
            answer: answer.into(),
            created_at: Utc::now(),
        });
        self.entries.truncate(self.capacity);
        id
    }

    /// Empty the list; ids keep increasing afterwards
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries, most recent first
    #[must_use]
    pub fn list(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
