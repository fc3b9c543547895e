//! Dissemination Loop
//!
//! Push-based, full-state gossip. Every round takes one snapshot, serializes it once and posts it to every
//! peer concurrently, each post bounded by the push timeout.
//!
//! ## Failure Policy
//! - A failed push is logged and counted against that peer only.
//! - There is no retry inside a round; the next round sends the complete state again.
//! - On shutdown the in-flight round is dropped, which aborts its outstanding requests.

use super::error::GossipError;
use super::protocol::{GossipMessage, peer_gossip_url};
use crate::crdt::store::LwwStore;
use crate::crdt::types::{now_ms, snapshot_entries};

use dashmap::DashMap;
use futures::future::join_all;
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_GOSSIP_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_PUSH_TIMEOUT: Duration = Duration::from_secs(3);

/// Push history of one peer, kept for diagnostics only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeerStatus {
    pub delivered: u64,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub last_success_ms: Option<i64>,
}

/// Outcome of a single round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundReport {
    /// Entries in the pushed snapshot.
    pub entries: usize,
    pub delivered: usize,
    pub failed: usize,
}

pub struct Disseminator {
    store: Arc<LwwStore>,
    peers: Vec<String>,
    http_client: reqwest::Client,
    interval: Duration,
    push_timeout: Duration,
    peer_status: DashMap<String, PeerStatus>,
}

impl Disseminator {
    pub fn new(
        store: Arc<LwwStore>,
        peers: Vec<String>,
        interval: Duration,
        push_timeout: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            peers,
            http_client: reqwest::Client::new(),
            interval,
            push_timeout,
            peer_status: DashMap::new(),
        })
    }

    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    pub fn peer_status(&self, peer: &str) -> Option<PeerStatus> {
        self.peer_status.get(peer).map(|status| status.value().clone())
    }

    /// Runs rounds on a fixed interval until `shutdown` is cancelled.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        tracing::info!(
            "Dissemination started: {} peer(s), every {:?}",
            self.peers.len(),
            self.interval
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                report = self.run_round() => {
                    tracing::debug!(
                        "Gossip round: {} entries, {} delivered, {} failed",
                        report.entries,
                        report.delivered,
                        report.failed
                    );
                }
            }
        }

        tracing::info!("Dissemination stopped");
    }

    /// Pushes the current snapshot to every peer once.
    pub async fn run_round(&self) -> RoundReport {
        if self.peers.is_empty() {
            return RoundReport::default();
        }

        let message = GossipMessage::new(snapshot_entries(self.store.snapshot()));
        let body = match serde_json::to_vec(&message) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Failed to serialize gossip snapshot: {}", e);
                return RoundReport {
                    entries: message.len(),
                    delivered: 0,
                    failed: self.peers.len(),
                };
            }
        };

        let results = join_all(self.peers.iter().map(|peer| self.push(peer, body.clone()))).await;

        let mut report = RoundReport {
            entries: message.len(),
            ..RoundReport::default()
        };
        for (peer, result) in self.peers.iter().zip(results) {
            match result {
                Ok(()) => {
                    report.delivered += 1;
                    self.record_success(peer);
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!("Gossip push to {} failed: {}", peer, e);
                    self.record_failure(peer, &e);
                }
            }
        }

        report
    }

    async fn push(&self, peer: &str, body: Vec<u8>) -> Result<(), GossipError> {
        let response = self
            .http_client
            .post(peer_gossip_url(peer))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .timeout(self.push_timeout)
            .send()
            .await
            .map_err(|e| GossipError::PeerUnreachable {
                peer: peer.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(GossipError::PeerRejected {
                peer: peer.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }

    fn record_success(&self, peer: &str) {
        let mut status = self.peer_status.entry(peer.to_string()).or_default();
        if status.consecutive_failures > 0 {
            tracing::info!(
                "Peer {} reachable again after {} failed push(es)",
                peer,
                status.consecutive_failures
            );
        }
        status.delivered += 1;
        status.consecutive_failures = 0;
        status.last_error = None;
        status.last_success_ms = Some(now_ms());
    }

    fn record_failure(&self, peer: &str, error: &GossipError) {
        let mut status = self.peer_status.entry(peer.to_string()).or_default();
        status.consecutive_failures += 1;
        status.last_error = Some(error.to_string());
    }
}
