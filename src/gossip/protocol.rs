//! Gossip Network Protocol
//!
//! Endpoints and DTOs shared by every node of the mesh. The JSON layout is the one used by the other
//! node implementations, so a Rust node can gossip with them directly.

use serde::{Deserialize, Deserializer, Serialize};

use super::error::GossipError;
use crate::crdt::types::{Entry, ReplicaId};

// --- API Endpoints ---

/// Inbound full-state push from a peer.
pub const ENDPOINT_GOSSIP: &str = "/gossip";
/// Liveness probe. Never touches the store.
pub const ENDPOINT_HEALTH: &str = "/healthz";
/// Read-only dump of the local store.
pub const ENDPOINT_STATE: &str = "/state";
/// Local write on behalf of an external metric source.
pub const ENDPOINT_PUT: &str = "/put";

// --- Data Transfer Objects ---

/// A full-state gossip batch.
///
/// `lww` may be omitted (empty batch). Entries are accepted either as objects
/// (`{"key", "ts", "node_id", "value"}`) or as `[key, ts, node_id, value]` arrays; they are always sent as
/// objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GossipMessage {
    #[serde(default, deserialize_with = "deserialize_entries")]
    pub lww: Vec<Entry>,
}

impl GossipMessage {
    pub fn new(lww: Vec<Entry>) -> Self {
        Self { lww }
    }

    pub fn len(&self) -> usize {
        self.lww.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lww.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireEntry {
    Object(Entry),
    Tuple(String, i64, ReplicaId, f64),
}

impl From<WireEntry> for Entry {
    fn from(wire: WireEntry) -> Self {
        match wire {
            WireEntry::Object(entry) => entry,
            WireEntry::Tuple(key, timestamp, replica_id, value) => {
                Entry::new(key, timestamp, replica_id, value)
            }
        }
    }
}

fn deserialize_entries<'de, D>(deserializer: D) -> Result<Vec<Entry>, D::Error>
where
    D: Deserializer<'de>,
{
    let wire = Vec::<WireEntry>::deserialize(deserializer)?;
    Ok(wire.into_iter().map(Entry::from).collect())
}

/// Decodes a raw request body into a batch. The whole body must be valid; there is no partial decode.
pub fn decode_gossip(body: &[u8]) -> Result<GossipMessage, GossipError> {
    Ok(serde_json::from_slice(body)?)
}

/// Response to a gossip push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GossipAck {
    pub ok: bool,
    /// Entries in the inbound batch.
    #[serde(default)]
    pub received: usize,
    /// Entries that changed the local store.
    #[serde(default)]
    pub applied: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GossipAck {
    pub fn accepted(received: usize, applied: usize) -> Self {
        Self {
            ok: true,
            received,
            applied,
            error: None,
        }
    }

    pub fn rejected(error: &GossipError) -> Self {
        Self {
            ok: false,
            received: 0,
            applied: 0,
            error: Some(error.to_string()),
        }
    }
}

/// Single-key read response.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetEntryResponse {
    /// `None` when the key is unknown to this node.
    pub entry: Option<Entry>,
}

/// Builds the gossip URL of a peer given as `host:port` or as a full base URL.
pub fn peer_gossip_url(peer: &str) -> String {
    if peer.starts_with("http://") || peer.starts_with("https://") {
        format!("{}{}", peer.trim_end_matches('/'), ENDPOINT_GOSSIP)
    } else {
        format!("http://{}{}", peer, ENDPOINT_GOSSIP)
    }
}
