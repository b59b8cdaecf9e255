//! `reqwest`-backed fetcher.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use super::host::Fetcher;
use super::types::{FetchError, Request, Response};

/// Performs live fetches over HTTP.
///
/// Any status code is a response; only transport-level failures (DNS,
/// connection refused, truncated body) become `FetchError`s.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
  client: reqwest::Client,
}

impl HttpFetcher {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_client(client: reqwest::Client) -> Self {
    Self { client }
  }
}

#[async_trait]
impl Fetcher for HttpFetcher {
  async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
    let network_err = |e: reqwest::Error| FetchError::Network {
      url: request.url.to_string(),
      message: e.to_string(),
    };

    let response = self
      .client
      .request(request.method.clone(), request.url.clone())
      .send()
      .await
      .map_err(network_err)?;

    let status = response.status();
    let content_type = response
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(str::to_string);
    let body = response.bytes().await.map_err(network_err)?;

    debug!(url = %request.url, status = status.as_u16(), bytes = body.len(), "fetched");

    Ok(Response {
      status,
      body,
      content_type,
    })
  }
}
