//! The Merge Rule.
//!
//! Records for one key are totally ordered by `(timestamp, replica_id)`. A record replaces the stored one only
//! when it is strictly greater. Tie policy: when both fields are equal the stored record is kept, even if the
//! values differ. A single replica never authors two values at the same timestamp, so this only matters for
//! corrupted input, and keeping the existing value is what keeps merge idempotent.

use super::types::Record;

/// Returns `true` iff `incoming` should replace `current` for the same key.
pub fn supersedes(incoming: &Record, current: &Record) -> bool {
    incoming.timestamp > current.timestamp
        || (incoming.timestamp == current.timestamp && incoming.replica_id > current.replica_id)
}

