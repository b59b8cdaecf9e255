//! Typed offline fallbacks.

use reqwest::Url;

use crate::consts::{AUDIO_EXTENSIONS, IMAGE_EXTENSIONS};
use crate::manifest::extension_of;

/// What to answer with when a cache-first request misses and the network fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
  /// The cached placeholder image.
  Image,
  /// An empty 200.
  Audio,
  /// A 503.
  Unavailable,
}

pub fn fallback_kind(url: &Url) -> FallbackKind {
  match extension_of(url.path()) {
    Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => FallbackKind::Image,
    Some(ext) if AUDIO_EXTENSIONS.contains(&ext.as_str()) => FallbackKind::Audio,
    _ => FallbackKind::Unavailable,
  }
}
