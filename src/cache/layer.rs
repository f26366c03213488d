//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::storage::{CacheStorage, StoredEntry};
use super::traits::{CacheResult, QueryKey, Tag};
use crate::error::ApiError;

type SharedFetch = Shared<BoxFuture<'static, Result<Value, ApiError>>>;

struct InFlight {
  generation: u64,
  tags: Vec<Tag>,
  fetch: SharedFetch,
}

#[derive(Default)]
struct ObserverSlot {
  count: usize,
  released_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct LayerState {
  inflight: HashMap<String, InFlight>,
  /// Last generation issued before each tag was invalidated
  tag_epochs: HashMap<Tag, u64>,
  observers: HashMap<String, ObserverSlot>,
}

fn lock(state: &Mutex<LayerState>) -> MutexGuard<'_, LayerState> {
  state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Cache layer that manages caching logic and network fetching.
///
/// One instance is created at start-up and cloned into every view; clones
/// share the same storage, in-flight table and invalidation state.
///
/// - identical keys share one in-flight request
/// - every request carries a generation; an older response never replaces a
///   newer one
/// - mutations invalidate by tag, marking every entry that provides the tag
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
  state: Arc<Mutex<LayerState>>,
  generation: Arc<AtomicU64>,
  version: Arc<watch::Sender<u64>>,
  /// How long before cached data is considered stale
  stale_time: Duration,
  /// How long an unobserved entry is kept
  gc_time: Duration,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S) -> Self {
    let (version, _) = watch::channel(0);
    Self {
      storage: Arc::new(storage),
      state: Arc::new(Mutex::new(LayerState::default())),
      generation: Arc::new(AtomicU64::new(0)),
      version: Arc::new(version),
      stale_time: Duration::minutes(1),
      gc_time: Duration::minutes(5),
    }
  }

  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  pub fn with_gc_time(mut self, gc_time: Duration) -> Self {
    self.gc_time = gc_time;
    self
  }

  /// Age after which cached data is refetched, for views that track it
  pub fn stale_time(&self) -> std::time::Duration {
    self.stale_time.to_std().unwrap_or_default()
  }

  fn state(&self) -> MutexGuard<'_, LayerState> {
    lock(&self.state)
  }

  /// Check if cached data is stale based on cached_at timestamp.
  fn is_stale(&self, cached_at: DateTime<Utc>) -> bool {
    Utc::now() - cached_at >= self.stale_time
  }

  /// Fetch with cache-first strategy.
  ///
  /// 1. Fresh, non-invalidated entry: return it without a network call
  /// 2. Otherwise join the in-flight request for this key, or start one
  /// 3. On network failure, fall back to the previous entry if there is one
  pub async fn fetch<K, T, F, Fut>(&self, key: &K, fetcher: F) -> Result<CacheResult<T>, ApiError>
  where
    K: QueryKey + ?Sized,
    T: Serialize + DeserializeOwned + Send + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    let hash = key.cache_hash();
    let cached = self.storage.get(&hash);

    if let Some(entry) = &cached {
      if !entry.invalidated && !self.is_stale(entry.cached_at) {
        match serde_json::from_value::<T>(entry.value.clone()) {
          Ok(data) => {
            debug!(key = %entry.description, "cache hit");
            return Ok(CacheResult::from_cache(data, entry.cached_at));
          }
          Err(e) => warn!(key = %entry.description, error = %e, "cached entry has wrong shape"),
        }
      }
    }

    let fetch = self.join_or_start(&hash, key, fetcher);

    match fetch.await {
      Ok(value) => {
        let data = serde_json::from_value(value)?;
        Ok(CacheResult::from_network(data))
      }
      Err(err) => {
        if let Some(entry) = cached {
          if let Ok(data) = serde_json::from_value::<T>(entry.value) {
            warn!(key = %entry.description, error = %err, "fetch failed, serving last known data");
            return Ok(CacheResult::offline(data, entry.cached_at));
          }
        }
        Err(err)
      }
    }
  }

  fn join_or_start<K, T, F, Fut>(&self, hash: &str, key: &K, fetcher: F) -> SharedFetch
  where
    K: QueryKey + ?Sized,
    T: Serialize + Send + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    let mut state = self.state();

    if let Some(existing) = state.inflight.get(hash) {
      debug!(key = %key.description(), "joining in-flight request");
      return existing.fetch.clone();
    }

    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
    let tags = key.tags();
    let description = key.description();
    debug!(key = %description, generation, "starting request");

    let request = fetcher();
    let layer = self.clone();
    let task_hash = hash.to_string();
    let task_tags = tags.clone();

    // Spawned so the response is committed even if every caller goes away
    let handle = tokio::spawn(async move {
      let result = match request.await {
        Ok(data) => serde_json::to_value(&data).map_err(ApiError::from),
        Err(e) => Err(e),
      };
      if let Ok(value) = &result {
        layer.commit(&task_hash, generation, task_tags, description, value.clone());
      }
      layer.finish(&task_hash, generation);
      result
    });

    let fetch = async move {
      handle
        .await
        .unwrap_or_else(|e| Err(ApiError::Transport(format!("fetch task failed: {}", e))))
    }
    .boxed()
    .shared();

    state.inflight.insert(
      hash.to_string(),
      InFlight {
        generation,
        tags,
        fetch: fetch.clone(),
      },
    );

    fetch
  }

  fn commit(&self, hash: &str, generation: u64, tags: Vec<Tag>, description: String, value: Value) {
    let state = self.state();
    // Started before a mutation on one of its tags: keep it, but refetch on next read
    let invalidated = tags.iter().any(|t| {
      state
        .tag_epochs
        .get(t)
        .is_some_and(|epoch| generation <= *epoch)
    });

    let stored = self.storage.store(
      hash,
      StoredEntry {
        value,
        description: description.clone(),
        tags,
        cached_at: Utc::now(),
        generation,
        invalidated,
      },
    );
    drop(state);

    if !stored {
      debug!(key = %description, generation, "discarding response superseded by a newer request");
    }
  }

  fn finish(&self, hash: &str, generation: u64) {
    let mut state = self.state();
    if state
      .inflight
      .get(hash)
      .is_some_and(|f| f.generation == generation)
    {
      state.inflight.remove(hash);
    }
  }

  /// Mark every entry providing one of `tags` as invalidated and notify
  /// subscribers. Returns the number of entries affected.
  pub fn invalidate_tags(&self, tags: &[Tag]) -> usize {
    let mut state = self.state();
    let epoch = self.generation.load(Ordering::SeqCst);
    for tag in tags {
      state.tag_epochs.insert(*tag, epoch);
    }
    // Requests already on the wire may predate the mutation; let the next
    // read start a fresh one instead of joining them.
    state
      .inflight
      .retain(|_, f| !f.tags.iter().any(|t| tags.contains(t)));
    let affected = self.storage.invalidate_tags(tags);
    drop(state);

    self.version.send_modify(|v| *v += 1);
    info!(tags = ?tags, entries = affected.len(), "invalidated cache tags");
    affected.len()
  }

  /// Whether the entry for `key` has been invalidated since it was stored.
  pub fn is_invalidated<K: QueryKey + ?Sized>(&self, key: &K) -> bool {
    self
      .storage
      .get(&key.cache_hash())
      .is_some_and(|e| e.invalidated)
  }

  /// Receiver that changes every time tags are invalidated.
  pub fn subscribe(&self) -> watch::Receiver<u64> {
    self.version.subscribe()
  }

  /// Register interest in `key`. The entry is kept while any observation is
  /// alive and becomes eligible for eviction `gc_time` after the last one drops.
  pub fn observe<K: QueryKey + ?Sized>(&self, key: &K) -> Observation {
    let hash = key.cache_hash();
    let mut state = self.state();
    let slot = state.observers.entry(hash.clone()).or_default();
    slot.count += 1;
    slot.released_at = None;
    Observation {
      state: Arc::clone(&self.state),
      hash,
    }
  }

  /// Evict unobserved entries past `gc_time`. Returns the number evicted.
  pub fn collect_garbage(&self) -> usize {
    self.collect_garbage_at(Utc::now())
  }

  pub fn collect_garbage_at(&self, now: DateTime<Utc>) -> usize {
    let mut state = self.state();
    let gc_time = self.gc_time;

    let observers = &state.observers;
    let removed = self.storage.retain(&mut |hash, entry| match observers.get(hash) {
      Some(slot) if slot.count > 0 => true,
      Some(slot) => now - slot.released_at.unwrap_or(entry.cached_at) < gc_time,
      None => now - entry.cached_at < gc_time,
    });

    state.observers.retain(|_, slot| {
      slot.count > 0 || slot.released_at.is_some_and(|t| now - t < gc_time)
    });
    drop(state);

    if removed > 0 {
      debug!(removed, "evicted unobserved cache entries");
    }
    removed
  }

  pub fn len(&self) -> usize {
    self.storage.len()
  }

  pub fn is_empty(&self) -> bool {
    self.storage.is_empty()
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      state: Arc::clone(&self.state),
      generation: Arc::clone(&self.generation),
      version: Arc::clone(&self.version),
      stale_time: self.stale_time,
      gc_time: self.gc_time,
    }
  }
}

/// Keeps a cache entry alive while a view displays it.
pub struct Observation {
  state: Arc<Mutex<LayerState>>,
  hash: String,
}

impl Drop for Observation {
  fn drop(&mut self) {
    let mut state = lock(&self.state);
    if let Some(slot) = state.observers.get_mut(&self.hash) {
      slot.count = slot.count.saturating_sub(1);
      if slot.count == 0 {
        slot.released_at = Some(Utc::now());
      }
    }
  }
}

impl std::fmt::Debug for Observation {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Observation")
      .field("hash", &self.hash)
      .finish()
  }
}
