//! In-memory cache storage.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use super::host::CacheStorage;
use super::types::{CacheError, Request, Response};

type Store = HashMap<String, Response>;

/// A `CacheStorage` held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
  stores: Mutex<BTreeMap<String, Store>>,
  puts: AtomicUsize,
}

impl MemoryCacheStorage {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of successful `put` calls since creation.
  pub fn put_count(&self) -> usize {
    self.puts.load(Ordering::SeqCst)
  }

  /// Number of entries in one store, if it exists.
  pub fn entry_count(&self, name: &str) -> Option<usize> {
    self.stores.lock().get(name).map(HashMap::len)
  }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
  async fn open(&self, name: &str) -> Result<(), CacheError> {
    self.stores.lock().entry(name.to_string()).or_default();
    Ok(())
  }

  async fn match_request(&self, name: &str, request: &Request) -> Result<Option<Response>, CacheError> {
    let stores = self.stores.lock();
    Ok(stores.get(name).and_then(|store| store.get(&request.cache_key())).cloned())
  }

  async fn put(&self, name: &str, request: &Request, response: Response) -> Result<(), CacheError> {
    let mut stores = self.stores.lock();
    let store = stores.get_mut(name).ok_or_else(|| CacheError::NotFound(name.to_string()))?;
    store.insert(request.cache_key(), response);
    self.puts.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }

  async fn delete(&self, name: &str) -> Result<bool, CacheError> {
    let existed = self.stores.lock().remove(name).is_some();
    if existed {
      debug!(cache = %name, "deleted cache store");
    }
    Ok(existed)
  }

  async fn keys(&self) -> Result<Vec<String>, CacheError> {
    Ok(self.stores.lock().keys().cloned().collect())
  }
}
