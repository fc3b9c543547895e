use axum::{
    Json,
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
};
use std::sync::Arc;

use super::protocol::{GetEntryResponse, GossipAck, GossipMessage, decode_gossip};
use crate::crdt::store::LwwStore;
use crate::crdt::types::{Entry, snapshot_entries};
use crate::diagnostics::report::log_state;

/// Gossip intake: decode, merge the whole batch under one lock, respond.
///
/// The body is decoded in full before the store is touched, so a malformed batch leaves no trace.
pub async fn handle_gossip(
    Extension(store): Extension<Arc<LwwStore>>,
    body: Bytes,
) -> (StatusCode, Json<GossipAck>) {
    let message = match decode_gossip(&body) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Rejected gossip batch: {}", e);
            return (StatusCode::BAD_REQUEST, Json(GossipAck::rejected(&e)));
        }
    };

    let received = message.len();
    let applied = store.merge(message.lww);
    tracing::info!("Received {} entries, applied {}", received, applied);

    if applied > 0 {
        log_state(&store, "after remote merge");
    }

    (StatusCode::OK, Json(GossipAck::accepted(received, applied)))
}

pub async fn handle_health() -> &'static str {
    "ok"
}

/// Full dump of the local store, in the same shape as a gossip batch.
pub async fn handle_state(
    Extension(store): Extension<Arc<LwwStore>>,
) -> (StatusCode, Json<GossipMessage>) {
    let entries = snapshot_entries(store.snapshot());
    (StatusCode::OK, Json(GossipMessage::new(entries)))
}

pub async fn handle_get_entry(
    Extension(store): Extension<Arc<LwwStore>>,
    Path(key): Path<String>,
) -> (StatusCode, Json<GetEntryResponse>) {
    match store.get(&key) {
        Some(record) => (
            StatusCode::OK,
            Json(GetEntryResponse {
                entry: Some(Entry::from_record(key, record)),
            }),
        ),
        None => (StatusCode::NOT_FOUND, Json(GetEntryResponse { entry: None })),
    }
}
