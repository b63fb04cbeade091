//! # Dedup Set
//! Bounded memory of item identifiers already accepted from one source.
//!
//! Identifiers are retained in insertion order up to a configurable cap;
//! the oldest key is forgotten first. Within the retention bound an already
//! seen identifier is never accepted twice.

use std::collections::{HashSet, VecDeque};

#[derive(Debug)]
pub struct DedupSet {
    seen: HashSet<String>,
    order: VecDeque<String>,
    retention: usize,
}

impl DedupSet {
    pub fn with_retention(retention: usize) -> Self {
        let retention = retention.max(1);
        Self {
            seen: HashSet::new(),
            order: VecDeque::with_capacity(retention.min(1024)),
            retention,
        }
    }

    /// Remember `key`; returns true when it was not seen before.
    pub fn insert(&mut self, key: &str) -> bool {
        if self.seen.contains(key) {
            return false;
        }
        if self.order.len() == self.retention {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.seen.insert(key.to_string());
        self.order.push_back(key.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
