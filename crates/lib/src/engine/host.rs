//! Host environment interfaces consumed by the engine.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::types::{CacheError, FetchError, Request, Response};

/// Named cache stores keyed by request.
///
/// Writers to the same key are not coordinated; the last `put` wins.
#[async_trait]
pub trait CacheStorage: Send + Sync {
  /// Open the named store, creating it if absent.
  async fn open(&self, name: &str) -> Result<(), CacheError>;

  /// Look up a request in one store. A missing store is a miss.
  async fn match_request(&self, name: &str, request: &Request) -> Result<Option<Response>, CacheError>;

  async fn put(&self, name: &str, request: &Request, response: Response) -> Result<(), CacheError>;

  /// Delete a whole store. Returns whether it existed.
  async fn delete(&self, name: &str) -> Result<bool, CacheError>;

  /// Names of all stores.
  async fn keys(&self) -> Result<Vec<String>, CacheError>;

  /// Look up a request in every store, first hit wins.
  async fn match_any(&self, request: &Request) -> Result<Option<Response>, CacheError> {
    for name in self.keys().await? {
      if let Some(response) = self.match_request(&name, request).await? {
        return Ok(Some(response));
      }
    }
    Ok(None)
  }
}

/// Live network access.
#[async_trait]
pub trait Fetcher: Send + Sync {
  async fn fetch(&self, request: &Request) -> Result<Response, FetchError>;
}

/// Session takeover primitives.
#[async_trait]
pub trait Clients: Send + Sync {
  /// Take control without waiting for existing sessions to end.
  async fn skip_waiting(&self);

  /// Become the controller of every open session.
  async fn claim(&self);
}

/// In-process `Clients` that records which primitives were invoked.
#[derive(Debug, Default)]
pub struct LocalClients {
  skipped_waiting: AtomicBool,
  claimed: AtomicBool,
}

impl LocalClients {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn skipped_waiting(&self) -> bool {
    self.skipped_waiting.load(Ordering::SeqCst)
  }

  pub fn claimed(&self) -> bool {
    self.claimed.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl Clients for LocalClients {
  async fn skip_waiting(&self) {
    self.skipped_waiting.store(true, Ordering::SeqCst);
  }

  async fn claim(&self) {
    self.claimed.store(true, Ordering::SeqCst);
  }
}
