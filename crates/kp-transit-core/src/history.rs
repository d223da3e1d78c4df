//! Bounded history of recent calculation results.
//!
//! Newest first. Inserting into a full history evicts the oldest entry.
//! Interior `RwLock` so a shared reference can be handed to readers while a
//! single writer appends.

use std::collections::VecDeque;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::ResultDocument;

/// Entries kept when no capacity is configured.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

pub struct ResultHistory {
    capacity: usize,
    entries: RwLock<VecDeque<ResultDocument>>,
}

impl Default for ResultHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl ResultHistory {
    /// A history holding at most `capacity` documents (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // A poisoned lock still holds a consistent deque: every write is a
    // single push/pop pair.
    fn read(&self) -> RwLockReadGuard<'_, VecDeque<ResultDocument>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, VecDeque<ResultDocument>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert as the newest entry. Returns the evicted document, if any.
    pub fn push(&self, doc: ResultDocument) -> Option<ResultDocument> {
        let mut entries = self.write();
        entries.push_front(doc);
        if entries.len() > self.capacity {
            entries.pop_back()
        } else {
            None
        }
    }

    /// All retained documents, newest first.
    pub fn snapshot(&self) -> Vec<ResultDocument> {
        self.read().iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<ResultDocument> {
        self.read().front().cloned()
    }

    /// Most recent document for `date`.
    pub fn find_by_date(&self, date: &str) -> Option<ResultDocument> {
        self.read().iter().find(|d| d.date == date).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }
}
