//! In-memory caching layer for remote collections.
//!
//! This module provides a resource-agnostic caching mechanism that:
//! - Caches responses keyed by a hashed query key
//! - Shares one in-flight request between concurrent identical reads
//! - Invalidates by tag after mutations, so every page of a resource refreshes
//! - Serves the last known data when the network fails (offline mode)
//! - Evicts entries nobody has observed for a while

mod layer;
mod storage;
mod traits;

pub use layer::{CacheLayer, Observation};
pub use storage::{CacheStorage, MemoryStorage};
pub use traits::{CacheResult, CacheSource, Cacheable, QueryKey, Tag};

/// The cache instance shared by every view
pub type SharedCache = CacheLayer<MemoryStorage>;
