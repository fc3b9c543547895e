use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identity of the node that authored a write.
///
/// Only used as the tie-breaker of the Merge Rule, so it must be comparable and identical on every node
/// that talks about the same writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplicaId(pub u64);

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The value currently held for a key, together with the version that wrote it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Milliseconds since the epoch on the authoring node.
    pub timestamp: i64,
    pub replica_id: ReplicaId,
    pub value: f64,
}

impl Record {
    pub fn new(timestamp: i64, replica_id: ReplicaId, value: f64) -> Self {
        Self {
            timestamp,
            replica_id,
            value,
        }
    }

    /// The `(timestamp, replica_id)` pair the Merge Rule orders by.
    pub fn version(&self) -> (i64, ReplicaId) {
        (self.timestamp, self.replica_id)
    }
}

/// A keyed record, as carried inside a gossip batch.
///
/// Field names on the wire (`ts`, `node_id`) are shared with every other node implementation in the mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    #[serde(rename = "ts")]
    pub timestamp: i64,
    #[serde(rename = "node_id")]
    pub replica_id: ReplicaId,
    pub value: f64,
}

impl Entry {
    pub fn new(key: impl Into<String>, timestamp: i64, replica_id: ReplicaId, value: f64) -> Self {
        Self {
            key: key.into(),
            timestamp,
            replica_id,
            value,
        }
    }

    pub fn from_record(key: String, record: Record) -> Self {
        Self {
            key,
            timestamp: record.timestamp,
            replica_id: record.replica_id,
            value: record.value,
        }
    }

    pub fn record(&self) -> Record {
        Record::new(self.timestamp, self.replica_id, self.value)
    }

    pub fn into_parts(self) -> (String, Record) {
        let record = self.record();
        (self.key, record)
    }
}

/// An independent point-in-time copy of a store.
pub type Snapshot = HashMap<String, Record>;

/// Flattens a snapshot into entries ordered by key.
pub fn snapshot_entries(snapshot: Snapshot) -> Vec<Entry> {
    let mut entries: Vec<Entry> = snapshot
        .into_iter()
        .map(|(key, record)| Entry::from_record(key, record))
        .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key));
    entries
}

/// Current wall clock in milliseconds, the timestamp source for local writes.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
