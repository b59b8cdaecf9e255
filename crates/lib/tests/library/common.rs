//! Shared helpers for engine and builder tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use reqwest::{StatusCode, Url};

use swcache_lib::RuntimeOptions;
use swcache_lib::engine::{
  AgentConfig, CacheAgent, CacheStorage, FetchError, Fetcher, LocalClients, MemoryCacheStorage, Request, Response,
};
use swcache_lib::manifest::{AssetPath, Manifest, partition};

pub const ORIGIN: &str = "https://game.example";
pub const PLACEHOLDER: &str = "/img/system/Empty.png";

pub fn url(path: &str) -> Url {
  Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

pub fn get(path: &str) -> Request {
  Request::get(url(path))
}

pub fn ok(body: &str) -> Response {
  Response::new(StatusCode::OK, body.to_string())
}

pub fn status(code: StatusCode) -> Response {
  Response::new(code, code.to_string())
}

/// A scripted network. Unrouted URLs answer 404; `set_online(false)` makes
/// every fetch a network error.
pub struct MockNet {
  routes: Mutex<HashMap<String, Response>>,
  online: AtomicBool,
  calls: Mutex<Vec<String>>,
}

impl MockNet {
  pub fn new() -> Self {
    Self {
      routes: Mutex::new(HashMap::new()),
      online: AtomicBool::new(true),
      calls: Mutex::new(Vec::new()),
    }
  }

  /// Route a path on `ORIGIN` or an absolute URL.
  pub fn route(&self, target: &str, response: Response) {
    let key = if target.starts_with('/') {
      url(target).to_string()
    } else {
      Url::parse(target).unwrap().to_string()
    };
    self.routes.lock().unwrap().insert(key, response);
  }

  pub fn set_online(&self, online: bool) {
    self.online.store(online, Ordering::SeqCst);
  }

  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }

  pub fn reset_calls(&self) {
    self.calls.lock().unwrap().clear();
  }
}

#[async_trait]
impl Fetcher for MockNet {
  async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
    self.calls.lock().unwrap().push(request.url.to_string());

    if !self.online.load(Ordering::SeqCst) {
      return Err(FetchError::Network {
        url: request.url.to_string(),
        message: "offline".to_string(),
      });
    }

    let mut key = request.url.clone();
    key.set_query(None);
    let routes = self.routes.lock().unwrap();
    Ok(
      routes
        .get(key.as_str())
        .cloned()
        .unwrap_or_else(|| Response::new(StatusCode::NOT_FOUND, "not found")),
    )
  }
}

pub fn manifest(shell: &[&str], dynamic: &[&str]) -> Manifest {
  let shell: Vec<AssetPath> = shell.iter().map(|s| AssetPath::parse(s).unwrap()).collect();
  partition(dynamic.iter().map(|s| AssetPath::parse(s).unwrap()), &shell)
}

pub struct Harness {
  pub agent: Arc<CacheAgent>,
  pub caches: Arc<MemoryCacheStorage>,
  pub net: Arc<MockNet>,
  pub clients: Arc<LocalClients>,
}

impl Harness {
  /// Agent over `shell` + `dynamic`, with every manifest path routed to a
  /// 200 whose body is the path itself.
  pub fn new(shell: &[&str], dynamic: &[&str]) -> Self {
    let manifest = manifest(shell, dynamic);
    let config = AgentConfig::from_manifest(Url::parse(ORIGIN).unwrap(), &manifest, &RuntimeOptions::default());
    Self::with_config(config)
  }

  pub fn with_config(config: AgentConfig) -> Self {
    let net = Arc::new(MockNet::new());
    for path in config.shell.iter().chain(config.dynamic.iter()) {
      net.route(path.as_str(), ok(path.as_str()));
    }

    let caches = Arc::new(MemoryCacheStorage::new());
    let clients = Arc::new(LocalClients::new());
    let agent = Arc::new(CacheAgent::new(
      config,
      caches.clone(),
      net.clone(),
      clients.clone(),
    ));

    Self {
      agent,
      caches,
      net,
      clients,
    }
  }

  pub fn cache_name(&self) -> String {
    self.agent.config().cache_name.clone()
  }

  /// Install and activate, asserting both succeed.
  pub async fn activate(&self) {
    self.agent.install().await.unwrap();
    self.agent.activate().await.unwrap();
  }

  pub async fn cached(&self, path: &str) -> Option<Response> {
    self.caches.match_request(&self.cache_name(), &get(path)).await.unwrap()
  }

  /// Wait for background tasks until `path` is cached with `body`.
  pub async fn eventually_cached(&self, path: &str, body: &str) -> bool {
    for _ in 0..200 {
      if let Some(response) = self.cached(path).await
        && response.body.as_ref() == body.as_bytes()
      {
        return true;
      }
      tokio::task::yield_now().await;
    }
    false
  }
}
