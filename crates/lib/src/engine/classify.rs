//! Request classification.

use std::collections::HashSet;

use reqwest::Url;
use tracing::warn;

use crate::manifest::AssetPath;

/// Which strategy a request gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
  /// Same origin, path in the shell set: cache-first.
  Shell,
  /// Same origin, path in the dynamic set: cache-first.
  Asset,
  /// Anything else: network-first.
  Other { same_origin: bool },
}

impl RequestClass {
  pub fn is_cache_first(self) -> bool {
    matches!(self, RequestClass::Shell | RequestClass::Asset)
  }
}

/// Exact-match lookup of manifest paths for one origin.
///
/// Manifest paths are stored in the form the URL parser produces for them
/// (percent-encoded), so comparison against `Url::path()` is plain equality.
/// Query strings never take part in matching.
#[derive(Debug, Clone)]
pub struct AssetIndex {
  origin: String,
  shell: HashSet<String>,
  dynamic: HashSet<String>,
}

impl AssetIndex {
  pub fn new<'a>(
    origin: &Url,
    shell: impl IntoIterator<Item = &'a AssetPath>,
    dynamic: impl IntoIterator<Item = &'a AssetPath>,
  ) -> Self {
    Self {
      origin: origin.origin().ascii_serialization(),
      shell: encode_all(origin, shell),
      dynamic: encode_all(origin, dynamic),
    }
  }

  pub fn is_same_origin(&self, url: &Url) -> bool {
    let origin = url.origin();
    origin.is_tuple() && origin.ascii_serialization() == self.origin
  }

  pub fn classify(&self, url: &Url) -> RequestClass {
    if !self.is_same_origin(url) {
      return RequestClass::Other { same_origin: false };
    }

    let path = url.path();
    if self.shell.contains(path) {
      RequestClass::Shell
    } else if self.dynamic.contains(path) {
      RequestClass::Asset
    } else {
      RequestClass::Other { same_origin: true }
    }
  }
}

fn encode_all<'a>(origin: &Url, paths: impl IntoIterator<Item = &'a AssetPath>) -> HashSet<String> {
  paths
    .into_iter()
    .filter_map(|path| match origin.join(path.as_str()) {
      Ok(url) => Some(url.path().to_string()),
      Err(e) => {
        warn!(path = %path, error = %e, "manifest path is not a valid URL path");
        None
      }
    })
    .collect()
}
