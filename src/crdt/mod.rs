//! LWW-Map CRDT
//!
//! The replicated state of a node: a map from key to the latest-known `Record`.
//!
//! ## Core Concepts
//! - **Record**: `(timestamp, replica_id, value)`, the unit of replication for one key.
//! - **Merge Rule**: `supersedes` orders records by timestamp, then replica id. Equal versions never replace
//!   each other, which makes merging commutative, associative and idempotent.
//! - **Store**: `LwwStore` guards the whole map with one lock. `put`, `merge` and `snapshot` each hold it for
//!   the full operation, so a snapshot never observes a half-applied batch.

pub mod merge;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;
