//! Core manifest types.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::GENERATION_ID_BYTES;

/// Errors produced while normalizing a path into an `AssetPath`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetPathError {
  #[error("path is empty")]
  Empty,

  #[error("path contains a parent directory segment")]
  ParentSegment,

  #[error("path is not valid UTF-8")]
  NonUtf8,

  #[error("path is not relative to the content root")]
  NotRelative,
}

/// Errors that abort a manifest build.
///
/// A build is all-or-nothing: any of these means no artifact is written.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error("failed to read content root {}: {source}", path.display())]
  ReadRoot { path: PathBuf, source: std::io::Error },

  #[error("failed to walk {}: {message}", path.display())]
  Scan { path: PathBuf, message: String },

  #[error("invalid asset path {path}: {source}")]
  InvalidPath { path: String, source: AssetPathError },

  #[error("invalid exclude pattern {pattern}: {source}")]
  ExcludePattern { pattern: String, source: regex::Error },

  #[error("shell entry {0} does not exist under the content root")]
  MissingShellEntry(AssetPath),

  #[error("failed to write {}: {source}", path.display())]
  Write { path: PathBuf, source: std::io::Error },
}

/// An origin-relative, forward-slash path to one cacheable resource, in URL
/// path form.
///
/// Always starts with a single `/` and never carries a query string or
/// fragment. A `%`, `?` or `#` that is part of a file name is held
/// percent-encoded (`%25`, `%3F`, `%23`), which is how a browser requests it.
/// Ordering is plain lexicographic on the normalized string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetPath(String);

impl AssetPath {
  /// Normalize a configured or requested path.
  ///
  /// Backslashes become `/`, repeated leading separators collapse to one, and
  /// anything from the first `?` or `#` on is dropped. A bare `/` is valid.
  pub fn parse(raw: &str) -> Result<Self, AssetPathError> {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    let slashed = raw[..end].replace('\\', "/");
    if slashed.is_empty() {
      return Err(AssetPathError::Empty);
    }

    let trimmed = slashed.trim_start_matches('/');
    if trimmed
      .split('/')
      .any(|segment| segment == ".." || decode_segment(segment) == "..")
    {
      return Err(AssetPathError::ParentSegment);
    }

    Ok(Self(format!("/{}", trimmed)))
  }

  /// Build an asset path from a filesystem path relative to the content root.
  ///
  /// File names are taken literally, so URL delimiters in them are encoded.
  pub fn from_relative(path: &Path) -> Result<Self, AssetPathError> {
    let mut segments = Vec::new();
    for component in path.components() {
      match component {
        Component::Normal(part) => segments.push(encode_segment(part.to_str().ok_or(AssetPathError::NonUtf8)?)),
        Component::CurDir => {}
        Component::ParentDir => return Err(AssetPathError::ParentSegment),
        Component::RootDir | Component::Prefix(_) => return Err(AssetPathError::NotRelative),
      }
    }

    if segments.is_empty() {
      return Err(AssetPathError::Empty);
    }

    Ok(Self(format!("/{}", segments.join("/"))))
  }

  /// Wrap a compile-time constant that is already normalized.
  pub(crate) fn from_static(path: &'static str) -> Self {
    debug_assert!(path.starts_with('/') && !path.contains(['?', '#', '\\']));
    Self(path.to_string())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Lowercased extension of the final segment, if any.
  pub fn extension(&self) -> Option<String> {
    extension_of(&self.0)
  }

  /// True for directory-style entries such as `/` or `/docs/`.
  pub fn is_directory(&self) -> bool {
    self.0.ends_with('/')
  }

  pub fn starts_with(&self, prefix: &str) -> bool {
    self.0.starts_with(prefix)
  }

  /// Resolve against a content root on disk, decoding percent escapes.
  pub fn to_fs_path(&self, root: &Path) -> PathBuf {
    self
      .0
      .split('/')
      .filter(|s| !s.is_empty())
      .fold(root.to_path_buf(), |acc, s| acc.join(decode_segment(s)))
  }
}

/// Percent-encode the characters that would end or corrupt a URL path.
fn encode_segment(segment: &str) -> String {
  let mut out = String::with_capacity(segment.len());
  for c in segment.chars() {
    match c {
      '%' => out.push_str("%25"),
      '?' => out.push_str("%3F"),
      '#' => out.push_str("%23"),
      c => out.push(c),
    }
  }
  out
}

/// Decode `%XX` escapes. Malformed escapes are kept as written.
fn decode_segment(segment: &str) -> String {
  let bytes = segment.as_bytes();
  let mut out = Vec::with_capacity(bytes.len());
  let mut i = 0;
  while i < bytes.len() {
    if bytes[i] == b'%'
      && let Some(escape) = bytes.get(i + 1..i + 3)
      && let Ok(decoded) = hex::decode(escape)
    {
      out.extend_from_slice(&decoded);
      i += 3;
      continue;
    }
    out.push(bytes[i]);
    i += 1;
  }
  String::from_utf8_lossy(&out).into_owned()
}

/// Lowercased extension of the last segment of a `/`-separated path.
pub(crate) fn extension_of(path: &str) -> Option<String> {
  let name = path.rsplit('/').next()?;
  let (stem, ext) = name.rsplit_once('.')?;
  if stem.is_empty() || ext.is_empty() {
    return None;
  }
  Some(ext.to_ascii_lowercase())
}

impl fmt::Display for AssetPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl TryFrom<String> for AssetPath {
  type Error = AssetPathError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::parse(&value)
  }
}

impl From<AssetPath> for String {
  fn from(path: AssetPath) -> Self {
    path.0
  }
}

/// Opaque per-build token naming one cache generation.
///
/// Drawn from the thread-local CSPRNG rather than derived from content, so two
/// builds of an identical tree still get distinct cache names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenerationId(String);

impl GenerationId {
  pub fn generate() -> Self {
    let bytes: [u8; GENERATION_ID_BYTES] = rand::rng().random();
    Self(hex::encode(bytes))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Name of the cache store holding this generation.
  pub fn cache_name(&self, prefix: &str) -> String {
    format!("{}{}", prefix, self.0)
  }
}

impl fmt::Display for GenerationId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// The immutable result of one build.
///
/// `shell` and `dynamic` are disjoint and both sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
  generation_id: GenerationId,
  shell: BTreeSet<AssetPath>,
  dynamic: BTreeSet<AssetPath>,
}

impl Manifest {
  pub(crate) fn new(generation_id: GenerationId, shell: BTreeSet<AssetPath>, dynamic: BTreeSet<AssetPath>) -> Self {
    debug_assert!(shell.is_disjoint(&dynamic));
    Self {
      generation_id,
      shell,
      dynamic,
    }
  }

  pub fn generation_id(&self) -> &GenerationId {
    &self.generation_id
  }

  pub fn shell(&self) -> &BTreeSet<AssetPath> {
    &self.shell
  }

  pub fn dynamic(&self) -> &BTreeSet<AssetPath> {
    &self.dynamic
  }

  pub fn cache_name(&self, prefix: &str) -> String {
    self.generation_id.cache_name(prefix)
  }

  /// Total number of entries across both sets.
  pub fn len(&self) -> usize {
    self.shell.len() + self.dynamic.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn contains(&self, path: &AssetPath) -> bool {
    self.shell.contains(path) || self.dynamic.contains(path)
  }
}
