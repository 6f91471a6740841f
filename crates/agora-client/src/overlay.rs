//! Short-lived presentation states layered over domain records.
//!
//! Arrival highlights, edit flashes and delete fades never live on the
//! records themselves; they are keyed by record id here and expire on
//! their own deadlines.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// A transient presentation state for a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transient {
    /// Just pushed in, briefly highlighted.
    Arriving,
    /// Just edited, briefly highlighted.
    Edited,
    /// Fading out ahead of removal.
    Fading,
}

#[derive(Debug)]
pub struct Overlay<K> {
    entries: HashMap<K, (Transient, Instant)>,
}

impl<K: Eq + Hash + Copy> Overlay<K> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Mark a record with a transient state expiring after `ttl`.
    /// A new mark replaces any existing one for the same record.
    pub fn mark(&mut self, key: K, transient: Transient, ttl: Duration, now: Instant) {
        self.entries.insert(key, (transient, now + ttl));
    }

    pub fn state(&self, key: K) -> Option<Transient> {
        self.entries.get(&key).map(|(transient, _)| *transient)
    }

    /// Remove and return every entry whose deadline has passed.
    pub fn take_expired(&mut self, now: Instant) -> Vec<(K, Transient)> {
        let expired: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, (_, deadline))| *deadline <= now)
            .map(|(key, _)| *key)
            .collect();
        expired
            .into_iter()
            .filter_map(|key| self.entries.remove(&key).map(|(t, _)| (key, t)))
            .collect()
    }
}

impl<K: Eq + Hash + Copy> Default for Overlay<K> {
    fn default() -> Self {
        Self::new()
    }
}
