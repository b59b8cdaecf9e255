//! End-to-end manifest build.
//!
//! scan -> filter -> partition -> shell validation -> render -> atomic write.
//! Nothing is written unless every earlier step succeeds.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::BuildConfig;
use crate::manifest::{AssetPath, BuildError, ExcludeSet, Manifest, filter, partition, scan};
use crate::render::{render, write_agent};

/// Per-invocation switches that are not part of the persisted config.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
  /// Build and render, but do not write the output file.
  pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
  pub generation_id: String,
  pub cache_name: String,
  pub shell_count: usize,
  pub dynamic_count: usize,
  pub output: PathBuf,
  pub written: bool,
  /// Configured shell entries not found on disk (only non-empty when allowed).
  pub missing_shell: Vec<AssetPath>,
  #[serde(skip)]
  pub manifest: Manifest,
}

impl BuildSummary {
  pub fn asset_count(&self) -> usize {
    self.shell_count + self.dynamic_count
  }
}

/// Run the whole pipeline for `config`.
pub fn build(config: &BuildConfig, options: BuildOptions) -> Result<BuildSummary, BuildError> {
  let excludes = ExcludeSet::compile(&config.exclude)?;
  let walk = scan(&config.root)?;
  let root = walk.root().to_path_buf();
  let own_output = own_output_path(&root, &config.output);

  let discovered = filter(walk, &excludes)
    .filter(|item| !matches!((item, &own_output), (Ok(path), Some(out)) if path == out))
    .collect::<Result<Vec<AssetPath>, BuildError>>()?;

  let manifest = partition(discovered, &config.shell);

  let missing_shell = missing_shell_entries(&root, &manifest);
  if let Some(first) = missing_shell.first() {
    if !config.allow_missing_shell {
      return Err(BuildError::MissingShellEntry(first.clone()));
    }
    for entry in &missing_shell {
      warn!(entry = %entry, "shell entry not found under content root");
    }
  }

  let runtime = config.runtime_options();
  let contents = render(&manifest, &runtime);

  if !options.dry_run {
    write_agent(&config.output, &contents)?;
  }

  let summary = BuildSummary {
    generation_id: manifest.generation_id().to_string(),
    cache_name: manifest.cache_name(&runtime.cache_prefix),
    shell_count: manifest.shell().len(),
    dynamic_count: manifest.dynamic().len(),
    output: config.output.clone(),
    written: !options.dry_run,
    missing_shell,
    manifest,
  };

  info!(
    assets = summary.asset_count(),
    generation = %summary.generation_id,
    output = %summary.output.display(),
    dry_run = options.dry_run,
    "manifest build complete"
  );

  Ok(summary)
}

/// The output file's asset path, if it lies inside the content root.
fn own_output_path(root: &Path, output: &Path) -> Option<AssetPath> {
  let parent = match output.parent() {
    Some(p) if !p.as_os_str().is_empty() => p,
    _ => Path::new("."),
  };
  let dir = dunce::canonicalize(parent).ok()?;
  let relative = dir.join(output.file_name()?);
  let relative = relative.strip_prefix(root).ok()?;
  AssetPath::from_relative(relative).ok()
}

fn missing_shell_entries(root: &Path, manifest: &Manifest) -> Vec<AssetPath> {
  manifest
    .shell()
    .iter()
    .filter(|entry| !shell_entry_exists(root, entry))
    .cloned()
    .collect()
}

/// Directory entries (`/`, `/docs/`) are served by their `index.html`.
fn shell_entry_exists(root: &Path, entry: &AssetPath) -> bool {
  let path = entry.to_fs_path(root);
  if entry.is_directory() {
    path.join("index.html").is_file()
  } else {
    path.is_file()
  }
}
