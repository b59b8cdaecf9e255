//! The cache agent: lifecycle state machine and per-request strategies.

use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use reqwest::{Method, Url};
use tracing::{debug, error, info, warn};

use crate::config::RuntimeOptions;
use crate::manifest::{AssetPath, Manifest};

use super::classify::{AssetIndex, RequestClass};
use super::fallback::{FallbackKind, fallback_kind};
use super::host::{CacheStorage, Clients, Fetcher};
use super::types::{
  ActivationReport, CacheError, EngineError, FetchOutcome, InstallError, InstallReport, Lifecycle, MessageOutcome,
  RefreshReport, Request, Response, RuntimeState,
};

/// Everything the agent knows about its generation. Fixed at construction.
#[derive(Debug, Clone)]
pub struct AgentConfig {
  /// Origin the bundle is served from; manifest paths resolve against it.
  pub origin: Url,
  pub cache_name: String,
  pub shell: Vec<AssetPath>,
  pub dynamic: Vec<AssetPath>,
  pub placeholder_image: AssetPath,
  pub volatile_prefix: String,
  pub refresh_action: String,
}

impl AgentConfig {
  pub fn from_manifest(origin: Url, manifest: &Manifest, options: &RuntimeOptions) -> Self {
    Self {
      origin,
      cache_name: manifest.cache_name(&options.cache_prefix),
      shell: manifest.shell().iter().cloned().collect(),
      dynamic: manifest.dynamic().iter().cloned().collect(),
      placeholder_image: options.placeholder_image.clone(),
      volatile_prefix: options.volatile_prefix.clone(),
      refresh_action: options.refresh_action.clone(),
    }
  }
}

/// One generation's runtime agent.
///
/// Lifecycle: `New -> Installing -> Waiting -> Activating -> Active`, or
/// `Installing -> Redundant` when a shell asset cannot be cached. Requests
/// are only intercepted once `Active`.
pub struct CacheAgent {
  config: AgentConfig,
  index: AssetIndex,
  caches: Arc<dyn CacheStorage>,
  fetcher: Arc<dyn Fetcher>,
  clients: Arc<dyn Clients>,
  state: Mutex<RuntimeState>,
}

impl CacheAgent {
  pub fn new(
    config: AgentConfig,
    caches: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    clients: Arc<dyn Clients>,
  ) -> Self {
    let index = AssetIndex::new(&config.origin, &config.shell, &config.dynamic);
    Self {
      config,
      index,
      caches,
      fetcher,
      clients,
      state: Mutex::new(RuntimeState::default()),
    }
  }

  pub fn config(&self) -> &AgentConfig {
    &self.config
  }

  pub fn state(&self) -> RuntimeState {
    self.state.lock().clone()
  }

  pub fn lifecycle(&self) -> Lifecycle {
    self.state.lock().lifecycle
  }

  fn transition(&self, event: &'static str, from: &[Lifecycle], to: Lifecycle) -> Result<(), EngineError> {
    let mut state = self.state.lock();
    if !from.contains(&state.lifecycle) {
      return Err(EngineError::InvalidTransition {
        event,
        state: state.lifecycle,
      });
    }
    state.lifecycle = to;
    Ok(())
  }

  fn set_lifecycle(&self, lifecycle: Lifecycle) {
    self.state.lock().lifecycle = lifecycle;
  }

  fn request_for(&self, path: &AssetPath) -> Option<Request> {
    self.config.origin.join(path.as_str()).ok().map(Request::get)
  }

  // ===========================================================================
  // install
  // ===========================================================================

  /// Create and populate this generation's cache store.
  ///
  /// Every shell entry must be fetched with a success status, or the install
  /// fails, the half-built store is removed and the agent becomes
  /// `Redundant`. Dynamic entries that fail are only logged.
  pub async fn install(&self) -> Result<InstallReport, EngineError> {
    self.transition("install", &[Lifecycle::New], Lifecycle::Installing)?;
    info!(cache = %self.config.cache_name, "installing");

    match self.populate().await {
      Ok(report) => {
        self.set_lifecycle(Lifecycle::Waiting);
        self.clients.skip_waiting().await;
        info!(
          cache = %report.cache_name,
          shell = report.shell_cached,
          dynamic = report.dynamic_cached,
          deferred = report.dynamic_failed.len(),
          "install complete"
        );
        Ok(report)
      }
      Err(e) => {
        error!(cache = %self.config.cache_name, error = %e, "install failed");
        if let Err(cleanup) = self.caches.delete(&self.config.cache_name).await {
          warn!(cache = %self.config.cache_name, error = %cleanup, "failed to remove partial cache");
        }
        self.set_lifecycle(Lifecycle::Redundant);
        Err(e.into())
      }
    }
  }

  async fn populate(&self) -> Result<InstallReport, InstallError> {
    let name = &self.config.cache_name;
    self.caches.open(name).await.map_err(|source| InstallError::Open {
      name: name.clone(),
      source,
    })?;

    // All shell responses are collected before any is stored, so a failure
    // leaves nothing behind but the empty store.
    let shell = join_all(self.config.shell.iter().map(|path| self.fetch_required(path))).await;
    let shell = shell.into_iter().collect::<Result<Vec<_>, _>>()?;

    for (path, request, response) in &shell {
      self
        .caches
        .put(name, request, response.clone())
        .await
        .map_err(|source| InstallError::Store {
          path: path.clone(),
          source,
        })?;
    }

    let dynamic = join_all(self.config.dynamic.iter().map(|path| self.fetch_and_store(path))).await;
    let dynamic_failed: Vec<AssetPath> = dynamic
      .into_iter()
      .filter_map(|result| match result {
        Ok(()) => None,
        Err((path, reason)) => {
          warn!(path = %path, reason = %reason, "dynamic asset deferred to first request");
          Some(path)
        }
      })
      .collect();

    Ok(InstallReport {
      cache_name: name.clone(),
      shell_cached: shell.len(),
      dynamic_cached: self.config.dynamic.len() - dynamic_failed.len(),
      dynamic_failed,
    })
  }

  async fn fetch_required(&self, path: &AssetPath) -> Result<(AssetPath, Request, Response), InstallError> {
    let shell_err = |reason: String| InstallError::ShellAsset {
      path: path.clone(),
      reason,
    };

    let request = self
      .request_for(path)
      .ok_or_else(|| shell_err("not a valid URL path".to_string()))?;
    let response = self.fetcher.fetch(&request).await.map_err(|e| shell_err(e.to_string()))?;
    if !response.ok() {
      return Err(shell_err(format!("HTTP {}", response.status)));
    }

    Ok((path.clone(), request, response))
  }

  /// Fetch one entry and store it if the response is a success.
  async fn fetch_and_store(&self, path: &AssetPath) -> Result<(), (AssetPath, String)> {
    let fail = |reason: String| (path.clone(), reason);

    let request = self
      .request_for(path)
      .ok_or_else(|| fail("not a valid URL path".to_string()))?;
    let response = self.fetcher.fetch(&request).await.map_err(|e| fail(e.to_string()))?;
    if !response.ok() {
      return Err(fail(format!("HTTP {}", response.status)));
    }

    store(self.caches.as_ref(), &self.config.cache_name, &request, response)
      .await
      .map_err(|e| fail(e.to_string()))
  }

  // ===========================================================================
  // activate
  // ===========================================================================

  /// Evict every other generation, then claim all sessions.
  pub async fn activate(&self) -> Result<ActivationReport, EngineError> {
    self.transition("activate", &[Lifecycle::Waiting], Lifecycle::Activating)?;

    let evicted = match self.evict_stale().await {
      Ok(evicted) => evicted,
      Err(e) => {
        self.set_lifecycle(Lifecycle::Waiting);
        return Err(e.into());
      }
    };

    self.clients.claim().await;

    {
      let mut state = self.state.lock();
      state.lifecycle = Lifecycle::Active;
      state.current_generation = Some(self.config.cache_name.clone());
    }

    info!(
      cache = %self.config.cache_name,
      evicted = evicted.len(),
      "activated"
    );

    Ok(ActivationReport {
      current: self.config.cache_name.clone(),
      evicted,
    })
  }

  async fn evict_stale(&self) -> Result<Vec<String>, CacheError> {
    let mut evicted = Vec::new();
    for name in self.caches.keys().await? {
      if name == self.config.cache_name {
        continue;
      }
      if self.caches.delete(&name).await? {
        debug!(cache = %name, "evicted stale generation");
        evicted.push(name);
      }
    }
    Ok(evicted)
  }

  // ===========================================================================
  // fetch
  // ===========================================================================

  /// Settle one intercepted request. Never fails.
  pub async fn handle_fetch(&self, request: Request) -> FetchOutcome {
    if request.method != Method::GET {
      return FetchOutcome::Passthrough;
    }
    if self.lifecycle() != Lifecycle::Active {
      debug!(url = %request.url, state = %self.lifecycle(), "not controlling yet");
      return FetchOutcome::Passthrough;
    }

    let class = self.index.classify(&request.url);
    if class.is_cache_first() {
      debug!(url = %request.url, ?class, "cache-first");
      return FetchOutcome::Respond(self.cache_first(&request).await);
    }

    let same_origin = matches!(class, RequestClass::Other { same_origin: true });
    debug!(url = %request.url, same_origin, "network-first");
    match self.network_first(&request, same_origin).await {
      Some(response) => FetchOutcome::Respond(response),
      None => FetchOutcome::NoResponse,
    }
  }

  async fn cache_first(&self, request: &Request) -> Response {
    let name = &self.config.cache_name;

    match self.caches.match_request(name, request).await {
      Ok(Some(hit)) => return hit,
      Ok(None) => {}
      Err(e) => warn!(url = %request.url, error = %e, "cache lookup failed, treating as miss"),
    }

    match self.fetcher.fetch(request).await {
      Ok(response) => {
        if response.ok()
          && let Err(e) = store(self.caches.as_ref(), name, request, response.clone()).await
        {
          warn!(url = %request.url, error = %e, "failed to store response");
        }
        response
      }
      Err(e) => {
        debug!(url = %request.url, error = %e, "offline, using fallback");
        self.fallback(request).await
      }
    }
  }

  async fn fallback(&self, request: &Request) -> Response {
    match fallback_kind(&request.url) {
      FallbackKind::Image => {
        let Some(placeholder) = self.request_for(&self.config.placeholder_image) else {
          return Response::offline();
        };
        match self.caches.match_request(&self.config.cache_name, &placeholder).await {
          Ok(Some(image)) => image,
          Ok(None) => {
            warn!(placeholder = %self.config.placeholder_image, "placeholder image not cached");
            Response::offline()
          }
          Err(e) => {
            warn!(error = %e, "placeholder lookup failed");
            Response::offline()
          }
        }
      }
      FallbackKind::Audio => Response::silent(),
      FallbackKind::Unavailable => Response::offline(),
    }
  }

  async fn network_first(&self, request: &Request, same_origin: bool) -> Option<Response> {
    match self.fetcher.fetch(request).await {
      Ok(response) => {
        if response.ok() && same_origin {
          let caches = Arc::clone(&self.caches);
          let name = self.config.cache_name.clone();
          let request = request.clone();
          let copy = response.clone();
          tokio::spawn(async move {
            if let Err(e) = store(caches.as_ref(), &name, &request, copy).await {
              debug!(url = %request.url, error = %e, "opportunistic store failed");
            }
          });
        }
        Some(response)
      }
      Err(e) => {
        debug!(url = %request.url, error = %e, "network failed, trying cache");
        match self.caches.match_any(request).await {
          Ok(cached) => cached,
          Err(e) => {
            warn!(url = %request.url, error = %e, "cache lookup failed");
            None
          }
        }
      }
    }
  }

  // ===========================================================================
  // message
  // ===========================================================================

  /// Handle a control-plane message.
  ///
  /// A message whose `action` equals the configured refresh action schedules
  /// `refresh` in the background; the call itself returns immediately.
  pub fn handle_message(self: &Arc<Self>, message: &serde_json::Value) -> MessageOutcome {
    let action = message.get("action").and_then(serde_json::Value::as_str);
    if action != Some(self.config.refresh_action.as_str()) {
      debug!(?action, "ignoring message");
      return MessageOutcome::Ignored;
    }

    let lifecycle = self.lifecycle();
    if !matches!(lifecycle, Lifecycle::Waiting | Lifecycle::Activating | Lifecycle::Active) {
      debug!(state = %lifecycle, "ignoring refresh before install");
      return MessageOutcome::Ignored;
    }

    let agent = Arc::clone(self);
    tokio::spawn(async move {
      agent.refresh().await;
    });
    MessageOutcome::RefreshScheduled
  }

  /// Re-fetch and overwrite every dynamic entry outside the volatile prefix.
  ///
  /// Best effort: an entry is only overwritten by a successful response, so a
  /// failure leaves the previous copy in place.
  pub async fn refresh(&self) -> RefreshReport {
    let (volatile, eligible): (Vec<&AssetPath>, Vec<&AssetPath>) = self
      .config
      .dynamic
      .iter()
      .partition(|path| path.starts_with(&self.config.volatile_prefix));

    let results = join_all(eligible.iter().map(|path| self.fetch_and_store(path))).await;

    let mut report = RefreshReport {
      skipped_volatile: volatile.len(),
      ..RefreshReport::default()
    };
    for result in results {
      match result {
        Ok(()) => report.refreshed += 1,
        Err((path, reason)) => {
          warn!(path = %path, reason = %reason, "refresh failed, keeping cached copy");
          report.failed.push(path);
        }
      }
    }

    info!(
      refreshed = report.refreshed,
      skipped = report.skipped_volatile,
      failed = report.failed.len(),
      "refresh complete"
    );
    report
  }
}

/// Open the named store (creating it) and put one entry.
async fn store(caches: &dyn CacheStorage, name: &str, request: &Request, response: Response) -> Result<(), CacheError> {
  caches.open(name).await?;
  caches.put(name, request, response).await
}
