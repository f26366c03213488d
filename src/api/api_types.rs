//! Serde types matching the backend's response envelopes.
//!
//! These are kept apart from the resource DTOs so the envelope quirks stay in
//! one place.

use serde::{Deserialize, Serialize};
use tracing::warn;

fn default_true() -> bool {
  true
}

/// `{ success, data, message }` wrapper used by every endpoint
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
  #[serde(default = "default_true")]
  pub success: bool,
  pub data: Option<T>,
  pub message: Option<String>,
}

/// Body of a failed request; the backend uses either key
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
  pub message: Option<String>,
  pub error: Option<String>,
}

impl ApiErrorBody {
  pub fn into_message(self) -> Option<String> {
    self.message.or(self.error)
  }
}

/// One page of a resource collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPage<T> {
  #[serde(default = "Vec::new")]
  pub items: Vec<T>,
  #[serde(default)]
  pub current_page: u32,
  #[serde(default)]
  pub total_pages: u32,
  #[serde(default)]
  pub total_items: u64,
}

impl<T> Default for CollectionPage<T> {
  fn default() -> Self {
    Self {
      items: Vec::new(),
      current_page: 1,
      total_pages: 0,
      total_items: 0,
    }
  }
}

impl<T> CollectionPage<T> {
  /// Repair pages that break `current_page <= total_pages` or return more
  /// rows than requested.
  pub fn normalized(mut self, limit: u32) -> Self {
    if self.current_page == 0 {
      self.current_page = 1;
    }
    if self.total_pages > 0 && self.current_page > self.total_pages {
      warn!(
        current = self.current_page,
        total = self.total_pages,
        "server returned a page past the end"
      );
      self.current_page = self.total_pages;
    }
    let limit = limit.max(1) as usize;
    if self.items.len() > limit {
      warn!(
        returned = self.items.len(),
        limit, "server returned more items than requested"
      );
      self.items.truncate(limit);
    }
    self
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

#[derive(Debug, Deserialize)]
pub struct FileDetails {
  pub url: String,
}

/// `data` of the upload endpoint. The current shape is `fileDetails.url`;
/// older call sites still answer with `imageUrl` or `urls`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UploadData {
  FileDetails {
    #[serde(rename = "fileDetails")]
    file_details: FileDetails,
  },
  ImageUrl {
    #[serde(rename = "imageUrl")]
    image_url: String,
  },
  Urls {
    urls: Vec<String>,
  },
}

impl UploadData {
  pub fn into_url(self) -> Option<String> {
    match self {
      UploadData::FileDetails { file_details } => Some(file_details.url),
      UploadData::ImageUrl { image_url } => Some(image_url),
      UploadData::Urls { urls } => urls.into_iter().next(),
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct UploadResponse {
  pub data: UploadData,
}
