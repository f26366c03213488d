//! Cache keys for backend requests.

use sha2::{Digest, Sha256};

use crate::cache::{QueryKey, Tag};
use crate::list_query::ListQuery;

use super::resource::Resource;

/// One request against a resource collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceKey {
  /// A page of the collection
  List {
    path: &'static str,
    tag: Tag,
    query: ListQuery,
  },
  /// A single record
  Detail {
    path: &'static str,
    tag: Tag,
    id: String,
  },
}

impl ResourceKey {
  pub fn list<R: Resource>(query: &ListQuery) -> Self {
    Self::List {
      path: R::PATH,
      tag: R::TAG,
      query: query.clone(),
    }
  }

  pub fn detail<R: Resource>(id: &str) -> Self {
    Self::Detail {
      path: R::PATH,
      tag: R::TAG,
      id: id.to_string(),
    }
  }
}

impl QueryKey for ResourceKey {
  fn cache_hash(&self) -> String {
    let input = match self {
      Self::List { path, query, .. } => format!("list:{}:{}", path, query_string(query)),
      Self::Detail { path, id, .. } => format!("detail:{}:{}", path, id),
    };

    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }

  fn description(&self) -> String {
    match self {
      Self::List { tag, query, .. } => {
        let mut desc = format!(
          "{} page {} ({} {})",
          tag, query.page, query.sort_field, query.sort_order
        );
        if !query.search.is_empty() {
          desc.push_str(&format!(" search '{}'", query.search));
        }
        desc
      }
      Self::Detail { tag, id, .. } => format!("{} {}", tag, id),
    }
  }

  fn tags(&self) -> Vec<Tag> {
    match self {
      Self::List { tag, .. } | Self::Detail { tag, .. } => vec![tag],
    }
  }
}

/// The query exactly as it goes on the wire
fn query_string(query: &ListQuery) -> String {
  query
    .to_params()
    .into_iter()
    .map(|(k, v)| format!("{}={}", k, v))
    .collect::<Vec<_>>()
    .join("&")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::{Job, Product, User};
  use crate::list_query::SortOrder;

  fn query() -> ListQuery {
    ListQuery::new("createdAt", SortOrder::Desc, 10)
  }

  #[test]
  fn test_hash_is_stable_and_fixed_length() {
    let a = ResourceKey::list::<Job>(&query());
    let b = ResourceKey::list::<Job>(&query());
    assert_eq!(a.cache_hash(), b.cache_hash());
    assert_eq!(a.cache_hash().len(), 64);
  }

  #[test]
  fn test_every_query_field_is_part_of_the_key() {
    let base = ResourceKey::list::<Job>(&query()).cache_hash();

    let mut q = query();
    q.page = 2;
    assert_ne!(ResourceKey::list::<Job>(&q).cache_hash(), base);

    let mut q = query();
    q.search = "dev".to_string();
    assert_ne!(ResourceKey::list::<Job>(&q).cache_hash(), base);

    let mut q = query();
    q.sort_order = SortOrder::Asc;
    assert_ne!(ResourceKey::list::<Job>(&q).cache_hash(), base);

    assert_ne!(ResourceKey::list::<Product>(&query()).cache_hash(), base);
  }

  #[test]
  fn test_key_matches_the_request_sent() {
    // Anything that changes the request changes the key
    let mut a = query();
    a.search = "dev".to_string();
    let mut b = query();
    b.search = "dev ".to_string();
    assert_ne!(
      ResourceKey::list::<Job>(&a).cache_hash(),
      ResourceKey::list::<Job>(&b).cache_hash()
    );
  }

  #[test]
  fn test_list_and_detail_share_the_resource_tag() {
    assert_eq!(ResourceKey::list::<User>(&query()).tags(), vec!["Users"]);
    assert_eq!(ResourceKey::detail::<User>("u1").tags(), vec!["Users"]);
  }

  #[test]
  fn test_description() {
    let mut q = query();
    q.search = "dev".to_string();
    assert_eq!(
      ResourceKey::list::<Job>(&q).description(),
      "Jobs page 1 (createdAt desc) search 'dev'"
    );
    assert_eq!(ResourceKey::detail::<Job>("j1").description(), "Jobs j1");
  }
}
