use serde::{Deserialize, Serialize};

use crate::crdt::types::ReplicaId;

/// Local write submitted by an external metric source.
#[derive(Debug, Serialize, Deserialize)]
pub struct PutRequest {
    /// `<device>:<metric>` by convention; any non-empty string is accepted.
    pub key: String,
    pub value: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PutResponse {
    pub ok: bool,
    /// Timestamp the write was stamped with.
    pub ts: Option<i64>,
    pub node_id: Option<ReplicaId>,
}
