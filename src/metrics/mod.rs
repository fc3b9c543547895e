//! Local Metrics Module
//!
//! The write path for values produced on this node.
//!
//! ## Workflow
//! 1. **Stamp**: `LocalIngest` tags a `(key, value)` pair with a per-node monotonic millisecond clock and this
//!    node's replica id.
//! 2. **Store**: the stamped record goes through `LwwStore::put`, the same Merge Rule as remote writes.
//! 3. **Sources**: values arrive from the built-in `MetricGenerator` or from external producers via `POST /put`.

pub mod generator;
pub mod handlers;
pub mod ingest;
pub mod types;
