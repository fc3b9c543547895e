use super::merge::supersedes;
use super::types::{Entry, Record, ReplicaId, Snapshot};

use std::collections::HashMap;
use std::collections::hash_map;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The node-local LWW-Map.
///
/// One instance is created at startup and shared (behind an `Arc`) by local ingestion, gossip intake and the
/// dissemination loop. Every operation takes the single store lock for its whole duration; the critical
/// sections are plain comparisons and assignments, so a coarse lock costs nothing noticeable.
#[derive(Debug, Default)]
pub struct LwwStore {
    entries: Mutex<HashMap<String, Record>>,
}

impl LwwStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `record` under `key` if the key is absent or the record supersedes the stored one.
    ///
    /// Returns whether the store changed.
    pub fn put(&self, key: impl Into<String>, record: Record) -> bool {
        let mut entries = self.lock();
        apply(&mut entries, key.into(), record)
    }

    /// Convenience form of [`LwwStore::put`] taking the record fields separately.
    pub fn put_value(
        &self,
        key: impl Into<String>,
        timestamp: i64,
        replica_id: ReplicaId,
        value: f64,
    ) -> bool {
        self.put(key, Record::new(timestamp, replica_id, value))
    }

    /// Applies a whole batch under one lock acquisition.
    ///
    /// Each entry is checked against the Merge Rule independently, so batch order does not change the result.
    /// Returns how many entries changed the store.
    pub fn merge<I>(&self, batch: I) -> usize
    where
        I: IntoIterator<Item = Entry>,
    {
        let mut entries = self.lock();
        batch
            .into_iter()
            .map(|entry| {
                let (key, record) = entry.into_parts();
                apply(&mut entries, key, record)
            })
            .filter(|changed| *changed)
            .count()
    }

    /// Returns an independent copy of the whole store.
    pub fn snapshot(&self) -> Snapshot {
        self.lock().clone()
    }

    pub fn get(&self, key: &str) -> Option<Record> {
        self.lock().get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave a torn record behind (records are `Copy` and written in one
    // assignment), so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Record>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn apply(entries: &mut HashMap<String, Record>, key: String, record: Record) -> bool {
    match entries.entry(key) {
        hash_map::Entry::Occupied(mut slot) => {
            if supersedes(&record, slot.get()) {
                slot.insert(record);
                true
            } else {
                false
            }
        }
        hash_map::Entry::Vacant(slot) => {
            slot.insert(record);
            true
        }
    }
}
