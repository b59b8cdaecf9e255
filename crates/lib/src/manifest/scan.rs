//! Content tree enumeration.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::types::{AssetPath, BuildError};

/// A single-pass walk over every regular file under a content root.
///
/// Directories are descended into but never yielded. Symlinks are followed, so
/// a link loop surfaces as a `BuildError::Scan` like any other I/O failure.
pub struct Scan {
  root: PathBuf,
  walker: walkdir::IntoIter,
}

impl Scan {
  pub fn root(&self) -> &Path {
    &self.root
  }
}

impl Iterator for Scan {
  type Item = Result<AssetPath, BuildError>;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      let entry = match self.walker.next()? {
        Ok(entry) => entry,
        Err(e) => {
          let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
          return Some(Err(BuildError::Scan {
            path,
            message: e.to_string(),
          }));
        }
      };

      if !entry.file_type().is_file() {
        continue;
      }

      let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
      return Some(AssetPath::from_relative(relative).map_err(|source| BuildError::InvalidPath {
        path: relative.display().to_string(),
        source,
      }));
    }
  }
}

/// Start a walk of `root`.
///
/// Fails immediately if the root cannot be resolved or listed; errors further
/// down the tree are yielded by the iterator.
pub fn scan(root: &Path) -> Result<Scan, BuildError> {
  let root = dunce::canonicalize(root).map_err(|source| BuildError::ReadRoot {
    path: root.to_path_buf(),
    source,
  })?;

  fs::read_dir(&root).map_err(|source| BuildError::ReadRoot {
    path: root.clone(),
    source,
  })?;

  let walker = WalkDir::new(&root).follow_links(true).into_iter();
  Ok(Scan { root, walker })
}
