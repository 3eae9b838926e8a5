use std::sync::Arc;

use color_eyre::{eyre::eyre, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::error::ApiError;
use crate::storage::CredentialStore;

/// Query-string parameters, in the order they are sent.
pub type Params = Vec<(&'static str, String)>;

/// GymCRM REST client.
///
/// Single point of outbound request construction: every call targets the
/// configured base URL and carries the stored bearer token when one exists.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: String,
  credentials: Arc<dyn CredentialStore>,
}

impl ApiClient {
  pub fn new(base_url: &str, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
    let parsed =
      Url::parse(base_url).map_err(|e| eyre!("Invalid backend URL {}: {}", base_url, e))?;

    if !matches!(parsed.scheme(), "http" | "https") {
      return Err(eyre!("Backend URL must be http or https: {}", base_url));
    }

    let http = reqwest::Client::builder()
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url: parsed.as_str().trim_end_matches('/').to_string(),
      credentials,
    })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
    &self.credentials
  }

  fn url(&self, path: &str) -> String {
    if path.starts_with('/') {
      format!("{}{}", self.base_url, path)
    } else {
      format!("{}/{}", self.base_url, path)
    }
  }

  /// Start a request with the bearer token attached when present.
  fn builder(&self, method: Method, path: &str) -> RequestBuilder {
    let builder = self.http.request(method, self.url(path));
    match self.credentials.token() {
      Some(token) => builder.header(AUTHORIZATION, format!("Bearer {}", token)),
      None => builder,
    }
  }

  /// Issue a request and decode a JSON response.
  pub async fn request<T, B>(
    &self,
    method: Method,
    path: &str,
    body: Option<&B>,
    params: &[(&'static str, String)],
  ) -> Result<T, ApiError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    let mut builder = self.builder(method.clone(), path);
    if !params.is_empty() {
      builder = builder.query(params);
    }
    if let Some(body) = body {
      let json = serde_json::to_vec(body)?;
      builder = builder
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(json);
    }

    self.send(method, path, builder).await
  }

  async fn send<T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    builder: RequestBuilder,
  ) -> Result<T, ApiError> {
    let response = builder.send().await.map_err(|e| {
      debug!(%method, path, error = %e, "request failed");
      ApiError::Transport(e.to_string())
    })?;

    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|e| ApiError::Transport(e.to_string()))?;
    debug!(%method, path, status = status.as_u16(), "response");

    if !status.is_success() {
      return Err(ApiError::from_response(status.as_u16(), &body));
    }

    let body = if body.trim().is_empty() { "null" } else { &body };
    serde_json::from_str(body).map_err(|e| ApiError::Decode(format!("{} {}: {}", method, path, e)))
  }

  pub async fn get<T: DeserializeOwned>(&self, path: &str, params: &Params) -> Result<T, ApiError> {
    self
      .request::<T, ()>(Method::GET, path, None, params)
      .await
  }

  pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    self.request(Method::POST, path, Some(body), &[]).await
  }

  /// POST without a request body (action endpoints)
  pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
    self
      .request::<T, ()>(Method::POST, path, None, &[])
      .await
  }

  pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    self.request(Method::PUT, path, Some(body), &[]).await
  }

  pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    self.request(Method::PATCH, path, Some(body), &[]).await
  }

  /// PATCH without a request body (toggle/read-state endpoints)
  pub async fn patch_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
    self
      .request::<T, ()>(Method::PATCH, path, None, &[])
      .await
  }

  pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
    self
      .request::<T, ()>(Method::DELETE, path, None, &[])
      .await
  }

  /// POST a multipart form.
  pub async fn post_multipart<T: DeserializeOwned>(
    &self,
    path: &str,
    form: Form,
  ) -> Result<T, ApiError> {
    let builder = self.builder(Method::POST, path).multipart(form);
    self.send(Method::POST, path, builder).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::storage::MemoryCredentials;
  use mockito::Matcher;
  use serde_json::Value;

  fn client(url: &str, token: Option<&str>) -> ApiClient {
    let creds = Arc::new(MemoryCredentials::new(token.map(String::from)));
    ApiClient::new(url, creds).unwrap()
  }

  #[test]
  fn test_rejects_invalid_base_url() {
    let creds: Arc<dyn CredentialStore> = Arc::new(MemoryCredentials::default());
    assert!(ApiClient::new("not a url", creds.clone()).is_err());
    assert!(ApiClient::new("ftp://example.com", creds).is_err());
  }

  #[test]
  fn test_url_join() {
    let api = client("http://localhost:8000/api/", None);
    assert_eq!(api.base_url(), "http://localhost:8000/api");
    assert_eq!(api.url("/students"), "http://localhost:8000/api/students");
    assert_eq!(api.url("students"), "http://localhost:8000/api/students");
  }

  #[tokio::test]
  async fn test_attaches_bearer_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/students")
      .match_header("authorization", "Bearer secret")
      .with_header("content-type", "application/json")
      .with_body(r#"{"students":[]}"#)
      .create_async()
      .await;

    let api = client(&server.url(), Some("secret"));
    let body: Value = api.get("/students", &Vec::new()).await.unwrap();
    assert_eq!(body["students"], Value::Array(vec![]));
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_no_token_no_header() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/students")
      .match_header("authorization", Matcher::Missing)
      .with_status(401)
      .with_body(r#"{"message":"Token não fornecido"}"#)
      .create_async()
      .await;

    let api = client(&server.url(), None);
    let err = api.get::<Value>("/students", &Vec::new()).await.unwrap_err();
    assert_eq!(
      err,
      ApiError::Http {
        status: 401,
        message: Some("Token não fornecido".to_string())
      }
    );
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_sends_query_params() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/payments")
      .match_query(Matcher::AllOf(vec![
        Matcher::UrlEncoded("status".into(), "PAID".into()),
        Matcher::UrlEncoded("page".into(), "2".into()),
      ]))
      .with_body(r#"{"payments":[]}"#)
      .create_async()
      .await;

    let api = client(&server.url(), None);
    let params: Params = vec![("status", "PAID".to_string()), ("page", "2".to_string())];
    let _: Value = api.get("/payments", &params).await.unwrap();
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_empty_success_body_is_null() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("DELETE", "/payments/p1")
      .with_status(204)
      .create_async()
      .await;

    let api = client(&server.url(), None);
    let result: Result<(), ApiError> = api.delete("/payments/p1").await;
    assert!(result.is_ok());
  }

  #[tokio::test]
  async fn test_decode_error() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/dashboard/overview")
      .with_body("{not json")
      .create_async()
      .await;

    let api = client(&server.url(), None);
    let err = api
      .get::<Value>("/dashboard/overview", &Vec::new())
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
  }

  #[tokio::test]
  async fn test_transport_error() {
    // Nothing listens on port 9 (discard) in the test environment
    let api = client("http://127.0.0.1:9", None);
    let err = api.get::<Value>("/students", &Vec::new()).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
  }
}
