use axum::{Extension, Json, http::StatusCode};
use std::sync::Arc;

use super::ingest::LocalIngest;
use super::types::{PutRequest, PutResponse};

/// Local write on behalf of an external metric source.
pub async fn handle_put(
    Extension(ingest): Extension<Arc<LocalIngest>>,
    Json(req): Json<PutRequest>,
) -> (StatusCode, Json<PutResponse>) {
    if req.key.is_empty() || !req.value.is_finite() {
        tracing::warn!("Rejected local put for key {:?}", req.key);
        return (
            StatusCode::BAD_REQUEST,
            Json(PutResponse {
                ok: false,
                ts: None,
                node_id: None,
            }),
        );
    }

    let record = ingest.record(req.key, req.value);

    (
        StatusCode::OK,
        Json(PutResponse {
            ok: true,
            ts: Some(record.timestamp),
            node_id: Some(record.replica_id),
        }),
    )
}
