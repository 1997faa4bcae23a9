//! Bounded record of already-forwarded message identifiers.

use crate::message::MessageId;
use std::collections::{HashSet, VecDeque};

/// Default number of identifiers remembered.
pub const DEFAULT_DEDUP_CAPACITY: usize = 1024;

/// Fixed-capacity set of recently processed message identifiers.
///
/// Once full, inserting a new identifier evicts the oldest one. The set lives
/// only for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct ProcessedIds {
    order: VecDeque<MessageId>,
    members: HashSet<MessageId>,
    capacity: usize,
}

impl ProcessedIds {
    /// Creates an empty set holding at most `capacity` identifiers (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns `true` if `id` has been recorded and not yet evicted.
    #[must_use]
    pub fn contains(&self, id: MessageId) -> bool {
        self.members.contains(&id)
    }

    /// Records `id`. Returns `false` if it was already present.
    pub fn insert(&mut self, id: MessageId) -> bool {
        if !self.members.insert(id) {
            return false;
        }
        self.order.push_back(id);
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.members.remove(&evicted);
            }
        }
        true
    }

    /// Number of identifiers currently remembered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Maximum number of identifiers remembered.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ProcessedIds {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut ids = ProcessedIds::new(4);
        assert!(ids.is_empty());
        assert!(ids.insert(MessageId(10)));
        assert!(ids.contains(MessageId(10)));
        assert!(!ids.contains(MessageId(11)));
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let mut ids = ProcessedIds::new(4);
        assert!(ids.insert(MessageId(10)));
        assert!(!ids.insert(MessageId(10)));
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_oldest_is_evicted_when_full() {
        let mut ids = ProcessedIds::new(3);
        for id in 1..=4 {
            ids.insert(MessageId(id));
        }
        assert_eq!(ids.len(), 3);
        assert!(!ids.contains(MessageId(1)));
        assert!(ids.contains(MessageId(2)));
        assert!(ids.contains(MessageId(4)));
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let mut ids = ProcessedIds::new(0);
        assert_eq!(ids.capacity(), 1);
        ids.insert(MessageId(1));
        ids.insert(MessageId(2));
        assert!(ids.contains(MessageId(2)));
        assert!(!ids.contains(MessageId(1)));
    }
}
