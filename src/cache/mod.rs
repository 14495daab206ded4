//! Cache module for storing channel snapshots to disk
//!
//! This module provides a snapshot cache that persists a channel's
//! aggregated video list to the filesystem with a fixed TTL. Expired or
//! corrupt entries are treated as stale rather than as errors, and stale
//! entries remain readable so the request handler can serve them when a
//! refresh fails.

mod manager;

pub use manager::{cache_ttl, CacheError, SnapshotCache};
