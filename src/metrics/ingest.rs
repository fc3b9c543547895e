use crate::crdt::store::LwwStore;
use crate::crdt::types::{Record, ReplicaId, now_ms};

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Stamps local values and writes them into the store.
///
/// Timestamps come from the wall clock but never repeat or go backwards on one node: two writes within the
/// same millisecond get consecutive timestamps, so a later local write always supersedes an earlier one.
pub struct LocalIngest {
    store: Arc<LwwStore>,
    replica_id: ReplicaId,
    last_timestamp: AtomicI64,
}

impl LocalIngest {
    pub fn new(store: Arc<LwwStore>, replica_id: ReplicaId) -> Arc<Self> {
        Arc::new(Self {
            store,
            replica_id,
            last_timestamp: AtomicI64::new(i64::MIN),
        })
    }

    pub fn replica_id(&self) -> ReplicaId {
        self.replica_id
    }

    pub fn store(&self) -> &Arc<LwwStore> {
        &self.store
    }

    /// Writes `value` under `key` stamped with the next local timestamp and returns the record.
    pub fn record(&self, key: impl Into<String>, value: f64) -> Record {
        let timestamp = self.next_timestamp();
        self.record_at(key, timestamp, value)
    }

    /// Writes with an explicit timestamp. The local clock moves up to `timestamp` so later
    /// [`LocalIngest::record`] calls still stamp after it.
    pub fn record_at(&self, key: impl Into<String>, timestamp: i64, value: f64) -> Record {
        self.last_timestamp.fetch_max(timestamp, Ordering::SeqCst);
        let key = key.into();
        let record = Record::new(timestamp, self.replica_id, value);
        self.store.put(key.as_str(), record);
        tracing::debug!(
            "[local] {} = {:.2} @ts={} nid={}",
            key,
            value,
            timestamp,
            self.replica_id
        );
        record
    }

    fn next_timestamp(&self) -> i64 {
        let now = now_ms();
        let previous = self
            .last_timestamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or(now);
        now.max(previous.saturating_add(1))
    }
}
