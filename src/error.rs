//! Typed errors for remote calls.
//!
//! These stay `Clone` so a single in-flight request can hand the same failure
//! to every caller sharing it.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
  /// The request never completed (connection refused, timeout, TLS, ...)
  #[error("network error: {0}")]
  Transport(String),

  /// The server answered with a non-2xx status or `success: false`
  #[error("server error ({status}): {}", message.as_deref().unwrap_or("no message"))]
  Server { status: u16, message: Option<String> },

  /// 404 on a single-resource fetch
  #[error("not found")]
  NotFound,

  /// The body did not match the expected envelope
  #[error("unexpected response: {0}")]
  Decode(String),
}

impl ApiError {
  /// Message suitable for a toast: the server's own text when it sent one,
  /// otherwise the given fallback.
  pub fn user_message(&self, fallback: &str) -> String {
    match self {
      ApiError::Server {
        message: Some(m), ..
      } if !m.trim().is_empty() => m.clone(),
      _ => fallback.to_string(),
    }
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, ApiError::NotFound)
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() {
      ApiError::Decode(e.to_string())
    } else {
      ApiError::Transport(e.to_string())
    }
  }
}

impl From<serde_json::Error> for ApiError {
  fn from(e: serde_json::Error) -> Self {
    ApiError::Decode(e.to_string())
  }
}
