//! Fixed-capacity rolling history.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Ring buffer that keeps only the most recent `capacity` entries.
///
/// Pushing into a full history evicts the oldest entry. Restored histories
/// are trimmed to their capacity on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredHistory<T>")]
pub struct BoundedHistory<T> {
    capacity: usize,
    entries: VecDeque<T>,
}

/// Wire shape of a history, before the capacity is enforced.
#[derive(Deserialize)]
struct StoredHistory<T> {
    capacity: usize,
    entries: VecDeque<T>,
}

impl<T> From<StoredHistory<T>> for BoundedHistory<T> {
    fn from(stored: StoredHistory<T>) -> Self {
        let capacity = stored.capacity.max(1);
        let mut entries = stored.entries;
        let excess = entries.len().saturating_sub(capacity);
        entries.drain(..excess);
        Self { capacity, entries }
    }
}

impl<T> BoundedHistory<T> {
    /// Creates an empty history. A zero capacity is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends an entry, evicting the oldest when full.
    pub fn push(&mut self, entry: T) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Iterates oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.entries.iter()
    }

    /// The newest `n` entries, oldest first.
    pub fn last_n(&self, n: usize) -> impl Iterator<Item = &T> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip)
    }

    /// The newest entry.
    pub fn latest(&self) -> Option<&T> {
        self.entries.back()
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

    /// Drops every entry, keeping the capacity.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
