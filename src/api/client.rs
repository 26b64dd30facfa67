use std::time::Duration;

use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{ClientBuilder, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::config::ApiConfig;
use crate::credentials::Credentials;

use super::error::ApiError;
use super::schema;
use super::types::{CreateExampleRequest, Example};
use super::ExampleApi;

const EXAMPLES_PATH: &str = "examples";

/// HTTP client for the examples collection
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: Url,
  credentials: Credentials,
}

impl ApiClient {
  pub fn new(config: &ApiConfig, credentials: Credentials) -> Result<Self> {
    Self::with_builder(config, credentials, reqwest::Client::builder())
  }

  /// Finish building on top of `builder`, adding the JSON content type and
  /// the configured timeout
  fn with_builder(
    config: &ApiConfig,
    credentials: Credentials,
    builder: ClientBuilder,
  ) -> Result<Self> {
    let base_url = config.parsed_base_url()?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let http = builder
      .default_headers(headers)
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url,
      credentials,
    })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
    self
      .base_url
      .join(path)
      .map_err(|e| ApiError::Transport(format!("invalid endpoint {}: {}", path, e)))
  }

  /// Build a request, attaching the bearer token if one is set
  fn request(&self, method: Method, url: Url) -> RequestBuilder {
    let builder = self.http.request(method, url);
    match self.credentials.token() {
      Some(token) => builder.bearer_auth(token),
      None => builder,
    }
  }

  /// Send a request and decode a 2xx JSON body
  async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
    let response = builder.send().await.map_err(|e| {
      warn!(error = %e, "request failed before a response arrived");
      ApiError::from(e)
    })?;
    let response = check_status(response).await?;

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
  }
}

/// Turn a non-success response into `ApiError::Server`
async fn check_status(response: Response) -> Result<Response, ApiError> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }

  let body = response.text().await.unwrap_or_default();
  warn!(status = status.as_u16(), "server rejected request");
  Err(ApiError::Server {
    status: status.as_u16(),
    body,
  })
}

impl ExampleApi for ApiClient {
  async fn list_examples(&self) -> Result<Vec<Example>, ApiError> {
    let url = self.endpoint(EXAMPLES_PATH)?;
    debug!(%url, "listing examples");

    let examples: Vec<Example> = self.send(self.request(Method::GET, url)).await?;
    debug!(count = examples.len(), "listed examples");
    Ok(examples)
  }

  async fn create_example(&self, request: CreateExampleRequest) -> Result<Example, ApiError> {
    // Requests are valid by construction, but the server contract says to
    // check before sending, so do it here too.
    let request = schema::validate(&request.to_draft())?;

    let url = self.endpoint(EXAMPLES_PATH)?;
    debug!(%url, name = request.name(), value = request.value(), "creating example");

    self
      .send(self.request(Method::POST, url).json(&request))
      .await
  }
}
