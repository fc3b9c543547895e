//! Replicated LWW Key-Value Node Library
//!
//! This library crate defines the modules that make up one node of the gossip mesh.
//! It serves as the foundation for the binary executable (`main.rs`).
//!
//! ## Architecture Modules
//! The node is composed of loosely coupled subsystems sharing one `LwwStore`:
//!
//! - **`crdt`**: The replicated state. An LWW-Map whose Merge Rule orders records by timestamp and then
//!   replica id, guarded by a single lock.
//! - **`gossip`**: Full-state dissemination to peers and the inbound intake path that merges their batches.
//! - **`metrics`**: The local write path. Stamps values produced on this node and writes them into the store.
//! - **`diagnostics`**: Grouped, human-readable state reports for the logs.
//! - **`config`**: Command-line / environment configuration and logging setup.
//! - **`node`**: Wiring, background tasks and graceful shutdown.

pub mod config;
pub mod crdt;
pub mod diagnostics;
pub mod gossip;
pub mod metrics;
pub mod node;
