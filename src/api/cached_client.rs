//! API client with transparent caching.

use tokio::sync::watch;

use crate::cache::{CacheResult, Observation, SharedCache, Tag};
use crate::error::ApiError;
use crate::list_query::ListQuery;

use super::api_types::CollectionPage;
use super::client::ApiClient;
use super::keys::ResourceKey;
use super::resource::Resource;

/// Wraps `ApiClient` reads in the shared cache.
///
/// Cloning is cheap; every view holds its own copy of the same cache.
#[derive(Clone)]
pub struct CachedApi {
  inner: ApiClient,
  cache: SharedCache,
}

impl CachedApi {
  pub fn new(inner: ApiClient, cache: SharedCache) -> Self {
    Self { inner, cache }
  }

  pub fn client(&self) -> &ApiClient {
    &self.inner
  }

  pub fn cache(&self) -> &SharedCache {
    &self.cache
  }

  /// One page of `R`, from cache when fresh
  pub async fn list<R: Resource>(
    &self,
    query: &ListQuery,
  ) -> Result<CacheResult<CollectionPage<R>>, ApiError> {
    let key = ResourceKey::list::<R>(query);
    let inner = self.inner.clone();
    let query = query.clone();
    self
      .cache
      .fetch(&key, move || async move {
        inner.list::<R>(R::PATH, &query).await
      })
      .await
  }

  /// A single record of `R`
  pub async fn get<R: Resource>(&self, id: &str) -> Result<CacheResult<R>, ApiError> {
    let key = ResourceKey::detail::<R>(id);
    let inner = self.inner.clone();
    let id = id.to_string();
    self
      .cache
      .fetch(&key, move || async move { inner.get::<R>(R::PATH, &id).await })
      .await
  }

  /// Keep the cached page alive while a view shows it
  pub fn observe_list<R: Resource>(&self, query: &ListQuery) -> Observation {
    self.cache.observe(&ResourceKey::list::<R>(query))
  }

  pub fn observe_detail<R: Resource>(&self, id: &str) -> Observation {
    self.cache.observe(&ResourceKey::detail::<R>(id))
  }

  /// Whether the cached page was invalidated by a mutation since it was fetched
  pub fn is_list_invalidated<R: Resource>(&self, query: &ListQuery) -> bool {
    self.cache.is_invalidated(&ResourceKey::list::<R>(query))
  }

  pub fn is_detail_invalidated<R: Resource>(&self, id: &str) -> bool {
    self.cache.is_invalidated(&ResourceKey::detail::<R>(id))
  }

  pub fn invalidate(&self, tags: &[Tag]) -> usize {
    self.cache.invalidate_tags(tags)
  }

  pub fn stale_time(&self) -> std::time::Duration {
    self.cache.stale_time()
  }

  /// Version counter bumped on every invalidation
  pub fn subscribe(&self) -> watch::Receiver<u64> {
    self.cache.subscribe()
  }
}
