use std::path::Path;
use std::time::Duration;

use color_eyre::{eyre::eyre, Result};
use reqwest::{multipart, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::ApiError;
use crate::list_query::ListQuery;

use super::api_types::{ApiEnvelope, ApiErrorBody, CollectionPage, UploadResponse};

const UPLOAD_PATH: &str = "/upload/file";

/// Backend API client
#[derive(Clone)]
pub struct ApiClient {
  http: Client,
  base_url: String,
  token: Option<String>,
}

impl ApiClient {
  pub fn new(config: &Config) -> Result<Self> {
    Self::with_base_url(
      &config.api.base_url,
      Config::get_auth_token(),
      Duration::from_secs(config.api.timeout_secs),
    )
  }

  pub fn with_base_url(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
    let http = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url: base_url.trim_end_matches('/').to_string(),
      token,
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url, path)
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let builder = self.http.request(method, self.url(path));
    match &self.token {
      Some(token) => builder.bearer_auth(token),
      None => builder,
    }
  }

  fn server_error(status: u16, body: &[u8]) -> ApiError {
    let message = serde_json::from_slice::<ApiErrorBody>(body)
      .ok()
      .and_then(ApiErrorBody::into_message);
    ApiError::Server { status, message }
  }

  /// Send a request and unwrap the `{ success, data, message }` envelope
  async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<ApiEnvelope<T>, ApiError> {
    let response = builder.send().await?;
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
      return Err(Self::server_error(status.as_u16(), &body));
    }

    let envelope: ApiEnvelope<T> = if body.is_empty() {
      serde_json::from_str("{}")?
    } else {
      serde_json::from_slice(&body)?
    };

    if !envelope.success {
      return Err(ApiError::Server {
        status: status.as_u16(),
        message: envelope.message,
      });
    }

    Ok(envelope)
  }

  async fn send_data<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
    self
      .send::<T>(builder)
      .await?
      .data
      .ok_or_else(|| ApiError::Decode("response has no data".to_string()))
  }

  /// Fetch one page of a collection
  pub async fn list<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &ListQuery,
  ) -> Result<CollectionPage<T>, ApiError> {
    debug!(path, page = query.page, search = %query.search, "GET collection");
    let page: CollectionPage<T> = self
      .send_data(self.request(Method::GET, path).query(&query.to_params()))
      .await?;
    Ok(page.normalized(query.limit))
  }

  /// Fetch a single record; a 404 becomes `ApiError::NotFound`
  pub async fn get<T: DeserializeOwned>(&self, path: &str, id: &str) -> Result<T, ApiError> {
    let endpoint = format!("{}/{}", path, id);
    debug!(endpoint, "GET record");
    self
      .send_data(self.request(Method::GET, &endpoint))
      .await
      .map_err(|e| match e {
        ApiError::Server { status: 404, .. } => ApiError::NotFound,
        other => other,
      })
  }

  /// GET any path and hand back the body untyped, envelope included
  pub async fn get_raw(&self, path: &str) -> Result<Value, ApiError> {
    debug!(path, "GET raw");
    let response = self.request(Method::GET, path).send().await?;
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
      return Err(Self::server_error(status.as_u16(), &body));
    }
    if body.is_empty() {
      return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&body)?)
  }

  pub async fn create<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    debug!(path, "POST record");
    self
      .send_data(self.request(Method::POST, path).json(body))
      .await
  }

  /// PUT or PATCH an existing record
  pub async fn update<B, T>(&self, method: Method, path: &str, id: &str, body: &B) -> Result<T, ApiError>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let endpoint = format!("{}/{}", path, id);
    debug!(%method, endpoint, "update record");
    self
      .send_data(self.request(method, &endpoint).json(body))
      .await
  }

  /// Delete a record, returning the server's message if it sent one
  pub async fn delete(&self, path: &str, id: &str) -> Result<Option<String>, ApiError> {
    let endpoint = format!("{}/{}", path, id);
    debug!(endpoint, "DELETE record");
    let envelope = self
      .send::<Value>(self.request(Method::DELETE, &endpoint))
      .await?;
    Ok(envelope.message)
  }

  /// Upload a local file and return its public URL
  pub async fn upload_file(&self, file: &Path) -> Result<String, ApiError> {
    let bytes = tokio::fs::read(file)
      .await
      .map_err(|e| ApiError::Transport(format!("Failed to read {}: {}", file.display(), e)))?;
    let file_name = file
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| "upload".to_string());

    debug!(file = %file.display(), size = bytes.len(), "uploading file");
    let form = multipart::Form::new().part("file", multipart::Part::bytes(bytes).file_name(file_name));

    let response = self
      .request(Method::POST, UPLOAD_PATH)
      .multipart(form)
      .send()
      .await?;
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
      return Err(Self::server_error(status.as_u16(), &body));
    }

    let upload: UploadResponse = serde_json::from_slice(&body)?;
    upload
      .data
      .into_url()
      .ok_or_else(|| ApiError::Decode("upload response has no URL".to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::list_query::SortOrder;
  use serde_json::json;
  use wiremock::matchers::{header, method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn client(server: &MockServer) -> ApiClient {
    ApiClient::with_base_url(
      &server.uri(),
      Some("tok".to_string()),
      Duration::from_secs(5),
    )
    .unwrap()
  }

  #[tokio::test]
  async fn test_list_sends_query_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/user/all-users"))
      .and(query_param("search", "asha"))
      .and(query_param("sortField", "name"))
      .and(query_param("sortOrder", "asc"))
      .and(query_param("page", "3"))
      .and(query_param("limit", "10"))
      .and(header("authorization", "Bearer tok"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "data": {
          "items": [{"_id": "u21"}, {"_id": "u22"}],
          "currentPage": 3,
          "totalPages": 3,
          "totalItems": 22
        }
      })))
      .expect(1)
      .mount(&server)
      .await;

    let mut query = ListQuery::new("name", SortOrder::Asc, 10);
    query.search = "asha".to_string();
    query.page = 3;

    let page: CollectionPage<Value> = client(&server).list("/user/all-users", &query).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.current_page, 3);
    assert_eq!(page.total_items, 22);
  }

  #[tokio::test]
  async fn test_get_maps_404_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/career/jobs/missing"))
      .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Job not found"})))
      .mount(&server)
      .await;

    let err = client(&server)
      .get::<Value>("/career/jobs", "missing")
      .await
      .unwrap_err();
    assert_eq!(err, ApiError::NotFound);
  }

  #[tokio::test]
  async fn test_server_error_message_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/products"))
      .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Title taken"})))
      .mount(&server)
      .await;

    let err = client(&server)
      .create::<_, Value>("/products", &json!({"title": "x"}))
      .await
      .unwrap_err();
    assert_eq!(
      err,
      ApiError::Server {
        status: 400,
        message: Some("Title taken".to_string())
      }
    );
  }

  #[tokio::test]
  async fn test_success_false_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
      .and(path("/call-requests/c1"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({"success": false, "message": "Invalid status"})),
      )
      .mount(&server)
      .await;

    let err = client(&server)
      .update::<_, Value>(Method::PATCH, "/call-requests", "c1", &json!({"status": "x"}))
      .await
      .unwrap_err();
    assert_eq!(err.user_message("Failed"), "Invalid status");
  }

  #[tokio::test]
  async fn test_delete_returns_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
      .and(path("/employees/e1"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({"success": true, "message": "Employee removed"})),
      )
      .mount(&server)
      .await;
    Mock::given(method("DELETE"))
      .and(path("/employees/e2"))
      .respond_with(ResponseTemplate::new(204))
      .mount(&server)
      .await;

    let api = client(&server);
    assert_eq!(
      api.delete("/employees", "e1").await.unwrap().as_deref(),
      Some("Employee removed")
    );
    assert_eq!(api.delete("/employees", "e2").await.unwrap(), None);
  }

  #[tokio::test]
  async fn test_upload_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/upload/file"))
      .and(header("authorization", "Bearer tok"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": {"fileDetails": {"url": "https://cdn.example.com/thumb.png"}}
      })))
      .expect(1)
      .mount(&server)
      .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("thumb.png");
    std::fs::write(&file, b"png").unwrap();

    let url = client(&server).upload_file(&file).await.unwrap();
    assert_eq!(url, "https://cdn.example.com/thumb.png");
  }

  #[tokio::test]
  async fn test_get_raw_keeps_envelope_and_maps_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/orders"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "data": [{"_id": "o1", "total": 40}]
      })))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/secret"))
      .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "Forbidden"})))
      .mount(&server)
      .await;

    let api = client(&server);
    let body = api.get_raw("/orders").await.unwrap();
    assert_eq!(body["data"][0]["total"], 40);

    let err = api.get_raw("/secret").await.unwrap_err();
    assert_eq!(
      err,
      ApiError::Server {
        status: 403,
        message: Some("Forbidden".to_string())
      }
    );
  }

  #[tokio::test]
  async fn test_upload_missing_file() {
    let server = MockServer::start().await;
    let err = client(&server)
      .upload_file(Path::new("/definitely/not/here.png"))
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
  }

  #[tokio::test]
  async fn test_connection_refused_is_transport_error() {
    let api = ApiClient::with_base_url("http://127.0.0.1:1", None, Duration::from_secs(2)).unwrap();
    let query = ListQuery::new("createdAt", SortOrder::Desc, 10);
    let err = api.list::<Value>("/career/jobs", &query).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(err.user_message("Failed to fetch Jobs"), "Failed to fetch Jobs");
  }
}
