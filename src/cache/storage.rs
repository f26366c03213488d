//! Cache storage trait and in-memory implementation.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::traits::Tag;

/// One cached response.
#[derive(Debug, Clone)]
pub struct StoredEntry {
  /// Serialized response body
  pub value: Value,
  pub description: String,
  pub tags: Vec<Tag>,
  pub cached_at: DateTime<Utc>,
  /// Generation of the request that produced this value
  pub generation: u64,
  /// Set by tag invalidation; the next read goes to the network
  pub invalidated: bool,
}

/// Trait for cache storage backends.
pub trait CacheStorage: Send + Sync + 'static {
  fn get(&self, key: &str) -> Option<StoredEntry>;

  /// Store an entry unless a newer generation is already present.
  /// Returns whether the entry was written.
  fn store(&self, key: &str, entry: StoredEntry) -> bool;

  /// Mark every entry providing one of `tags` as invalidated.
  /// Returns the affected keys.
  fn invalidate_tags(&self, tags: &[Tag]) -> Vec<String>;

  /// Keep only entries for which `keep` returns true. Returns the number removed.
  fn retain(&self, keep: &mut dyn FnMut(&str, &StoredEntry) -> bool) -> usize;

  fn len(&self) -> usize;

  fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Process-wide in-memory storage. Nothing is written to disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<String, StoredEntry>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  fn entries(&self) -> MutexGuard<'_, HashMap<String, StoredEntry>> {
    // A panic while holding the lock leaves the map itself intact
    self.entries.lock().unwrap_or_else(|e| e.into_inner())
  }
}

impl CacheStorage for MemoryStorage {
  fn get(&self, key: &str) -> Option<StoredEntry> {
    self.entries().get(key).cloned()
  }

  fn store(&self, key: &str, entry: StoredEntry) -> bool {
    let mut entries = self.entries();
    if let Some(existing) = entries.get(key) {
      if existing.generation > entry.generation {
        return false;
      }
    }
    entries.insert(key.to_string(), entry);
    true
  }

  fn invalidate_tags(&self, tags: &[Tag]) -> Vec<String> {
    let mut entries = self.entries();
    let mut affected = Vec::new();
    for (key, entry) in entries.iter_mut() {
      if entry.tags.iter().any(|t| tags.contains(t)) {
        entry.invalidated = true;
        affected.push(key.clone());
      }
    }
    affected
  }

  fn retain(&self, keep: &mut dyn FnMut(&str, &StoredEntry) -> bool) -> usize {
    let mut entries = self.entries();
    let before = entries.len();
    entries.retain(|k, e| keep(k, e));
    before - entries.len()
  }

  fn len(&self) -> usize {
    self.entries().len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn entry(generation: u64, tags: Vec<Tag>) -> StoredEntry {
    StoredEntry {
      value: json!({ "generation": generation }),
      description: "test".to_string(),
      tags,
      cached_at: Utc::now(),
      generation,
      invalidated: false,
    }
  }

  #[test]
  fn test_older_generation_does_not_overwrite() {
    let storage = MemoryStorage::new();
    assert!(storage.store("k", entry(5, vec!["Jobs"])));
    assert!(!storage.store("k", entry(3, vec!["Jobs"])));
    assert_eq!(storage.get("k").unwrap().generation, 5);
    assert!(storage.store("k", entry(6, vec!["Jobs"])));
    assert_eq!(storage.get("k").unwrap().generation, 6);
  }

  #[test]
  fn test_invalidate_by_tag() {
    let storage = MemoryStorage::new();
    storage.store("jobs-1", entry(1, vec!["Jobs"]));
    storage.store("jobs-2", entry(2, vec!["Jobs"]));
    storage.store("users-1", entry(3, vec!["Users"]));

    let mut affected = storage.invalidate_tags(&["Jobs"]);
    affected.sort();
    assert_eq!(affected, vec!["jobs-1".to_string(), "jobs-2".to_string()]);
    assert!(storage.get("jobs-1").unwrap().invalidated);
    assert!(!storage.get("users-1").unwrap().invalidated);
  }

  #[test]
  fn test_retain() {
    let storage = MemoryStorage::new();
    storage.store("a", entry(1, vec![]));
    storage.store("b", entry(2, vec![]));
    let removed = storage.retain(&mut |key, _| key == "a");
    assert_eq!(removed, 1);
    assert_eq!(storage.len(), 1);
    assert!(storage.get("b").is_none());
  }
}
