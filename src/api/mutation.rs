//! Create, update and delete requests followed by cache invalidation.

use std::marker::PhantomData;
use std::path::PathBuf;

use reqwest::Method;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use validator::Validate;

use crate::error::ApiError;

use super::cached_client::CachedApi;
use super::forms::{self, FieldErrors, FormValues};
use super::resource::{Editable, Resource};

/// A local file uploaded before the mutation; its URL lands in `field`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
  pub field: &'static str,
  pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
  #[error("{} field(s) are invalid", .0.len())]
  Validation(FieldErrors),
  #[error("upload failed: {0}")]
  Upload(ApiError),
  #[error("request failed: {0}")]
  Mutation(ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
  Create,
  Update,
  Delete,
  Status,
}

impl MutationKind {
  pub fn verb(self) -> &'static str {
    match self {
      MutationKind::Create => "create",
      MutationKind::Update => "update",
      MutationKind::Delete => "delete",
      MutationKind::Status => "update status of",
    }
  }

  /// Toast shown on success, e.g. "Job created successfully"
  pub fn success_message(self, label: &str) -> String {
    match self {
      MutationKind::Create => format!("{} created successfully", label),
      MutationKind::Update => format!("{} updated successfully", label),
      MutationKind::Delete => format!("{} deleted successfully", label),
      MutationKind::Status => "Status updated successfully".to_string(),
    }
  }
}

impl MutationError {
  /// Toast shown on failure; the server's message wins when it sent one
  pub fn toast_message(&self, kind: MutationKind, label: &str) -> String {
    match self {
      MutationError::Validation(_) => "Please fix the highlighted fields".to_string(),
      MutationError::Upload(e) => e.user_message("Failed to upload file"),
      MutationError::Mutation(e) => e.user_message(&format!("Failed to {} {}", kind.verb(), label)),
    }
  }

  pub fn field_errors(&self) -> Option<&FieldErrors> {
    match self {
      MutationError::Validation(errors) => Some(errors),
      _ => None,
    }
  }
}

/// Sends mutations for one resource type.
///
/// Every successful mutation invalidates `R::TAG`, so all cached pages of the
/// resource refetch. Failures leave the cache untouched and are never retried.
pub struct MutationDispatcher<R> {
  api: CachedApi,
  _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for MutationDispatcher<R> {
  fn clone(&self) -> Self {
    Self {
      api: self.api.clone(),
      _resource: PhantomData,
    }
  }
}

impl<R: Resource> MutationDispatcher<R> {
  pub fn new(api: CachedApi) -> Self {
    Self {
      api,
      _resource: PhantomData,
    }
  }

  fn invalidate(&self) {
    self.api.invalidate(&[R::TAG]);
  }

  /// Delete a record. Returns the server's message, if any.
  pub async fn delete(&self, id: &str) -> Result<Option<String>, MutationError> {
    if !R::DELETABLE {
      return Err(MutationError::Mutation(ApiError::Server {
        status: 405,
        message: Some(format!("{} cannot be deleted", R::PLURAL)),
      }));
    }

    match self.api.client().delete(R::PATH, id).await {
      Ok(message) => {
        info!(resource = R::TAG, id, "deleted");
        self.invalidate();
        Ok(message)
      }
      Err(e) => {
        warn!(resource = R::TAG, id, error = %e, "delete failed");
        Err(MutationError::Mutation(e))
      }
    }
  }

  /// PATCH the resource's status field
  pub async fn update_status(&self, id: &str, status: &str) -> Result<(), MutationError> {
    let Some((field, allowed)) = R::STATUS else {
      return Err(MutationError::Mutation(ApiError::Server {
        status: 405,
        message: Some(format!("{} have no status", R::PLURAL)),
      }));
    };
    if !allowed.contains(&status) {
      let mut errors = FieldErrors::new();
      errors.insert(field.to_string(), format!("'{}' is not a valid status", status));
      return Err(MutationError::Validation(errors));
    }

    let mut body = serde_json::Map::new();
    body.insert(field.to_string(), Value::from(status));
    self
      .api
      .client()
      .update::<_, Value>(Method::PATCH, R::PATH, id, &body)
      .await
      .map_err(|e| {
        warn!(resource = R::TAG, id, error = %e, "status update failed");
        MutationError::Mutation(e)
      })?;

    info!(resource = R::TAG, id, status, "status updated");
    self.invalidate();
    Ok(())
  }
}

impl<R: Editable> MutationDispatcher<R> {
  /// Turn raw form values into a validated payload and an optional upload.
  /// No network call happens here.
  pub fn prepare(values: &FormValues) -> Result<(R::Payload, Option<PendingUpload>), MutationError> {
    let mut errors = FieldErrors::new();
    let payload = R::payload_from_form(values, &mut errors);
    if let Err(e) = payload.validate() {
      // A parse error says more than a rule failing on its placeholder
      for (field, message) in forms::from_validation(&e) {
        errors.entry(field).or_insert(message);
      }
    }
    if !errors.is_empty() {
      return Err(MutationError::Validation(errors));
    }

    let upload = R::UPLOAD_FIELD.and_then(|field| {
      forms::optional_text(values, field)
        .filter(|v| !forms::is_remote_url(v))
        .map(|path| PendingUpload {
          field,
          path: PathBuf::from(path),
        })
    });

    Ok((payload, upload))
  }

  async fn apply_upload(
    &self,
    payload: &mut R::Payload,
    upload: Option<PendingUpload>,
  ) -> Result<(), MutationError> {
    if let Some(upload) = upload {
      let url = self
        .api
        .client()
        .upload_file(&upload.path)
        .await
        .map_err(|e| {
          warn!(resource = R::TAG, file = %upload.path.display(), error = %e, "upload failed");
          MutationError::Upload(e)
        })?;
      R::attach_upload(payload, url);
    }
    Ok(())
  }

  pub async fn create(
    &self,
    mut payload: R::Payload,
    upload: Option<PendingUpload>,
  ) -> Result<R, MutationError> {
    payload
      .validate()
      .map_err(|e| MutationError::Validation(forms::from_validation(&e)))?;
    self.apply_upload(&mut payload, upload).await?;

    let created: R = self
      .api
      .client()
      .create(R::PATH, &payload)
      .await
      .map_err(|e| {
        warn!(resource = R::TAG, error = %e, "create failed");
        MutationError::Mutation(e)
      })?;

    info!(resource = R::TAG, id = created.id(), "created");
    self.invalidate();
    Ok(created)
  }

  pub async fn update(
    &self,
    id: &str,
    mut payload: R::Payload,
    upload: Option<PendingUpload>,
  ) -> Result<R, MutationError> {
    payload
      .validate()
      .map_err(|e| MutationError::Validation(forms::from_validation(&e)))?;
    self.apply_upload(&mut payload, upload).await?;

    let updated: R = self
      .api
      .client()
      .update(R::UPDATE_METHOD, R::PATH, id, &payload)
      .await
      .map_err(|e| {
        warn!(resource = R::TAG, id, error = %e, "update failed");
        MutationError::Mutation(e)
      })?;

    info!(resource = R::TAG, id, "updated");
    self.invalidate();
    Ok(updated)
  }

  /// Create when `id` is `None`, otherwise update
  pub async fn submit(&self, id: Option<&str>, values: &FormValues) -> Result<R, MutationError> {
    let (payload, upload) = Self::prepare(values)?;
    match id {
      Some(id) => self.update(id, payload, upload).await,
      None => self.create(payload, upload).await,
    }
  }
}
