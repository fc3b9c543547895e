//! Node Lifecycle Module
//!
//! Wires one `LwwStore` into every component of a node and owns their background tasks.
//!
//! ## Tasks
//! - **HTTP server**: gossip intake, health probe, state reads and local puts.
//! - **Dissemination loop**: periodic full-state push to the configured peers.
//! - **Metric generator** (optional): synthetic local writes.
//!
//! All tasks share one `CancellationToken`; `NodeHandle::shutdown` cancels it and waits for each task.

use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::NodeConfig;
use crate::crdt::store::LwwStore;
use crate::crdt::types::ReplicaId;
use crate::gossip::disseminator::Disseminator;
use crate::gossip::handlers::{handle_get_entry, handle_gossip, handle_health, handle_state};
use crate::gossip::protocol::{ENDPOINT_GOSSIP, ENDPOINT_HEALTH, ENDPOINT_PUT, ENDPOINT_STATE};
use crate::metrics::generator::MetricGenerator;
use crate::metrics::handlers::handle_put;
use crate::metrics::ingest::LocalIngest;


pub fn build_router(store: Arc<LwwStore>, ingest: Arc<LocalIngest>) -> Router {
    Router::new()
        .route(ENDPOINT_GOSSIP, post(handle_gossip))
        .route(ENDPOINT_HEALTH, get(handle_health))
        .route(ENDPOINT_STATE, get(handle_state))
        .route("/state/:key", get(handle_get_entry))
        .route(ENDPOINT_PUT, post(handle_put))
        .layer(Extension(store))
        .layer(Extension(ingest))
}

/// A running node.
pub struct NodeHandle {
    local_addr: SocketAddr,
    store: Arc<LwwStore>,
    ingest: Arc<LocalIngest>,
    disseminator: Arc<Disseminator>,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl NodeHandle {
    /// Binds the listener and spawns every background task.
    ///
    /// Failing to bind is fatal and returned to the caller.
    pub async fn start(config: NodeConfig) -> Result<Self> {
        config.validate()?;

        let listener = tokio::net::TcpListener::bind(config.bind_addr())
            .await
            .with_context(|| format!("failed to bind {}", config.bind_addr()))?;
        let local_addr = listener.local_addr()?;

        let replica_id = config.replica_id_for(local_addr.port());
        let peers = config.peer_list();
        tracing::info!("Starting node {} on {}", replica_id, local_addr);
        if peers.is_empty() {
            tracing::info!("No peers configured, running standalone");
        } else {
            tracing::info!("Peers: {:?}", peers);
        }

        let store = Arc::new(LwwStore::new());
        let ingest = LocalIngest::new(store.clone(), replica_id);
        let disseminator = Disseminator::new(
            store.clone(),
            peers,
            config.gossip_interval(),
            config.push_timeout(),
        );
        let shutdown = CancellationToken::new();
        let mut tasks = Vec::new();

        let app = build_router(store.clone(), ingest.clone());
        let server_shutdown = shutdown.clone();
        tasks.push(tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
                .await;
            if let Err(e) = result {
                tracing::error!("HTTP server failed: {}", e);
            }
            tracing::info!("HTTP server stopped");
        }));

        tasks.push(tokio::spawn(disseminator.clone().run(shutdown.clone())));

        if config.generate {
            let generator =
                MetricGenerator::new(ingest.clone(), config.devices, config.generate_interval());
            tasks.push(tokio::spawn(generator.run(shutdown.clone())));
        }

        Ok(Self {
            local_addr,
            store,
            ingest,
            disseminator,
            shutdown,
            tasks,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn replica_id(&self) -> ReplicaId {
        self.ingest.replica_id()
    }

    pub fn store(&self) -> &Arc<LwwStore> {
        &self.store
    }

    pub fn ingest(&self) -> &Arc<LocalIngest> {
        &self.ingest
    }

    pub fn disseminator(&self) -> &Arc<Disseminator> {
        &self.disseminator
    }

    /// Cancels every task and waits for them to finish.
    pub async fn shutdown(self) -> Result<()> {
        tracing::info!("Shutting down node {}", self.replica_id());
        self.shutdown.cancel();
        for task in self.tasks {
            task.await.context("node task panicked")?;
        }
        Ok(())
    }
}
