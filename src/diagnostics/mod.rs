//! Diagnostics Module
//!
//! Human-readable state reports. Keys follow the `<device>:<metric>` convention; only this module looks at
//! that structure, the store treats keys as opaque strings.

pub mod report;
