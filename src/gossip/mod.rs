//! Gossip Module
//!
//! Keeps the LWW-Map of every node eventually consistent by pushing full state to peers.
//!
//! ## Core Mechanisms
//! - **Dissemination**: `Disseminator` snapshots the store on a fixed interval and pushes the whole snapshot to
//!   every configured peer. Rounds are best-effort; a lost round is repaired by the next one.
//! - **Intake**: `handle_gossip` decodes an inbound batch and merges it into the store in one locked step.
//!   Malformed batches are rejected before the store is touched.
//! - **Failure Handling**: a failed push is logged and tracked per peer; it never aborts the round or the loop.

pub mod disseminator;
pub mod error;
pub mod handlers;
pub mod protocol;
