//! Types for the runtime cache-strategy engine.
//!
//! A request is a method and URL; a response is a status, body and content
//! type. Bodies are `Bytes`, so a response can be stored and returned at once.

use std::fmt;

use bytes::Bytes;
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use thiserror::Error;

use crate::consts::OFFLINE_BODY;
use crate::manifest::AssetPath;

/// An intercepted read (or pass-through) request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
  pub method: Method,
  pub url: Url,
}

impl Request {
  pub fn new(method: Method, url: Url) -> Self {
    Self { method, url }
  }

  pub fn get(url: Url) -> Self {
    Self::new(Method::GET, url)
  }

  /// Key under which the response is stored: the URL minus any fragment.
  pub fn cache_key(&self) -> String {
    let mut url = self.url.clone();
    url.set_fragment(None);
    url.into()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
  pub status: StatusCode,
  pub body: Bytes,
  pub content_type: Option<String>,
}

impl Response {
  pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
    Self {
      status,
      body: body.into(),
      content_type: None,
    }
  }

  pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
    self.content_type = Some(content_type.into());
    self
  }

  /// 2xx.
  pub fn ok(&self) -> bool {
    self.status.is_success()
  }

  /// Synthetic 503 returned when nothing better is available offline.
  pub fn offline() -> Self {
    Self::new(StatusCode::SERVICE_UNAVAILABLE, OFFLINE_BODY).with_content_type("text/plain")
  }

  /// Empty 200, stands in for audio so playback code sees success.
  pub fn silent() -> Self {
    Self::new(StatusCode::OK, Bytes::new())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
  #[error("cache {0} does not exist")]
  NotFound(String),

  #[error("cache backend failure: {0}")]
  Backend(String),
}

/// A live fetch that produced no response at all.
///
/// Non-success statuses are responses, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
  #[error("network error for {url}: {message}")]
  Network { url: String, message: String },
}

/// Installation failures. Any of these leaves the prior generation in charge.
#[derive(Debug, Error)]
pub enum InstallError {
  #[error("failed to open cache {name}: {source}")]
  Open { name: String, source: CacheError },

  #[error("shell asset {path} could not be fetched: {reason}")]
  ShellAsset { path: AssetPath, reason: String },

  #[error("failed to store shell asset {path}: {source}")]
  Store { path: AssetPath, source: CacheError },
}

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("install failed: {0}")]
  Install(#[from] InstallError),

  #[error("activation failed: {0}")]
  Activate(#[from] CacheError),

  #[error("cannot {event} while {state}")]
  InvalidTransition { event: &'static str, state: Lifecycle },

  #[error("agent event loop has shut down")]
  Closed,
}

/// Where the agent is in its install/activate lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
  New,
  Installing,
  /// Installed; waiting for activation.
  Waiting,
  Activating,
  Active,
  /// Install failed; this generation never becomes current.
  Redundant,
}

impl fmt::Display for Lifecycle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Lifecycle::New => "new",
      Lifecycle::Installing => "installing",
      Lifecycle::Waiting => "waiting",
      Lifecycle::Activating => "activating",
      Lifecycle::Active => "active",
      Lifecycle::Redundant => "redundant",
    };
    f.write_str(name)
  }
}

/// Engine-owned mutable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeState {
  pub lifecycle: Lifecycle,
  /// Cache store this agent serves from, once activated.
  pub current_generation: Option<String>,
}

impl Default for RuntimeState {
  fn default() -> Self {
    Self {
      lifecycle: Lifecycle::New,
      current_generation: None,
    }
  }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InstallReport {
  pub cache_name: String,
  pub shell_cached: usize,
  pub dynamic_cached: usize,
  /// Dynamic entries left for the first request to populate.
  pub dynamic_failed: Vec<AssetPath>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivationReport {
  pub current: String,
  pub evicted: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshReport {
  pub refreshed: usize,
  pub skipped_volatile: usize,
  pub failed: Vec<AssetPath>,
}

/// How an intercepted request was settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
  Respond(Response),
  /// Not handled; the host performs its default network fetch.
  Passthrough,
  /// Network failed and no cached copy exists.
  NoResponse,
}

impl FetchOutcome {
  pub fn response(&self) -> Option<&Response> {
    match self {
      FetchOutcome::Respond(response) => Some(response),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
  RefreshScheduled,
  Ignored,
}
