//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// Label attached to cached results so a mutation can invalidate every view
/// of a resource at once (e.g. "Jobs").
pub type Tag = &'static str;

/// Anything the cache can hold: shareable across tasks and stored as JSON.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {}

impl<T> Cacheable for T where T: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {}

/// Identifies one cached request.
pub trait QueryKey {
  /// Stable, fixed-length key for the storage map
  fn cache_hash(&self) -> String;

  /// Human-readable form for logs
  fn description(&self) -> String;

  /// Tags the cached result provides
  fn tags(&self) -> Vec<Tag>;
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Create a new cache result from cached data.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::CacheFresh,
      cached_at: Some(cached_at),
    }
  }

  /// Serve a stale entry because the network call failed.
  pub fn offline(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
      cached_at: Some(cached_at),
    }
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, still considered fresh
  CacheFresh,
  /// Network unavailable, serving the last known data
  Offline,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::{Job, Product, User};
  use crate::api::CollectionPage;

  fn assert_cacheable<T: Cacheable>() {}

  #[test]
  fn test_models_are_cacheable_without_opt_in() {
    assert_cacheable::<Job>();
    assert_cacheable::<User>();
    assert_cacheable::<CollectionPage<Product>>();
    assert_cacheable::<serde_json::Value>();
  }
}
