//! Build configuration.
//!
//! `BuildConfig` is the single context object handed to the builder; the
//! runtime engine receives the `RuntimeOptions` subset. Values come from, in
//! increasing precedence: built-in defaults, a JSON config file, environment
//! variables, and finally CLI flags applied by the caller.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{
  DEFAULT_CACHE_PREFIX, DEFAULT_OUTPUT, DEFAULT_PLACEHOLDER_IMAGE, DEFAULT_REFRESH_ACTION, DEFAULT_SHELL,
  DEFAULT_VOLATILE_PREFIX, ENV_OUTPUT, ENV_ROOT,
};
use crate::manifest::{AssetPath, ExcludeRule};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {}: {source}", path.display())]
  Read { path: PathBuf, source: io::Error },

  #[error("failed to parse config {}: {source}", path.display())]
  Parse { path: PathBuf, source: serde_json::Error },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
  /// Content tree to scan.
  pub root: PathBuf,
  /// Where the runtime agent is written.
  pub output: PathBuf,
  pub cache_prefix: String,
  pub shell: Vec<AssetPath>,
  pub exclude: Vec<ExcludeRule>,
  pub placeholder_image: AssetPath,
  /// Dynamic entries under this prefix are skipped by forced refresh.
  pub volatile_prefix: String,
  pub refresh_action: String,
  /// Accept shell entries that are not present under `root`.
  pub allow_missing_shell: bool,
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      root: PathBuf::from("."),
      output: PathBuf::from(DEFAULT_OUTPUT),
      cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
      shell: default_shell(),
      exclude: default_excludes(),
      placeholder_image: AssetPath::from_static(DEFAULT_PLACEHOLDER_IMAGE),
      volatile_prefix: DEFAULT_VOLATILE_PREFIX.to_string(),
      refresh_action: DEFAULT_REFRESH_ACTION.to_string(),
      allow_missing_shell: false,
    }
  }
}

impl BuildConfig {
  /// Load a JSON config file. Absent fields keep their defaults.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Apply `SWCACHE_ROOT` / `SWCACHE_OUTPUT` if set.
  pub fn with_env_overrides(mut self) -> Self {
    if let Ok(root) = std::env::var(ENV_ROOT) {
      self.root = PathBuf::from(root);
    }
    if let Ok(output) = std::env::var(ENV_OUTPUT) {
      self.output = PathBuf::from(output);
    }
    self
  }

  pub fn runtime_options(&self) -> RuntimeOptions {
    RuntimeOptions {
      cache_prefix: self.cache_prefix.clone(),
      placeholder_image: self.placeholder_image.clone(),
      volatile_prefix: self.volatile_prefix.clone(),
      refresh_action: self.refresh_action.clone(),
    }
  }
}

/// Settings baked into the runtime agent alongside the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeOptions {
  pub cache_prefix: String,
  pub placeholder_image: AssetPath,
  pub volatile_prefix: String,
  pub refresh_action: String,
}

impl Default for RuntimeOptions {
  fn default() -> Self {
    BuildConfig::default().runtime_options()
  }
}

pub fn default_shell() -> Vec<AssetPath> {
  DEFAULT_SHELL.iter().copied().map(AssetPath::from_static).collect()
}

pub fn default_excludes() -> Vec<ExcludeRule> {
  vec![
    ExcludeRule::regex(r"\.map$"),
    ExcludeRule::regex(r"\.DS_Store"),
    ExcludeRule::regex(r"Thumbs\.db"),
    ExcludeRule::regex(r"\.gitkeep"),
    ExcludeRule::substring("/.git/"),
    ExcludeRule::regex(r"(?i)/test/"),
    ExcludeRule::regex(r"(?i)/demo/"),
  ]
}
