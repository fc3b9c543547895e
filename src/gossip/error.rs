use thiserror::Error;

/// Failures at the gossip boundary. Store operations themselves never fail.
#[derive(Debug, Error)]
pub enum GossipError {
    /// The inbound batch could not be decoded. Nothing was merged.
    #[error("malformed gossip batch: {0}")]
    Decoding(#[from] serde_json::Error),

    /// The push never got a response (refused, reset, timed out).
    #[error("peer {peer} unreachable: {reason}")]
    PeerUnreachable { peer: String, reason: String },

    /// The peer answered with a non-success status.
    #[error("peer {peer} rejected gossip with status {status}")]
    PeerRejected { peer: String, status: u16 },
}
