//! Shell/dynamic partitioning.

use std::collections::BTreeSet;

use tracing::debug;

use super::types::{AssetPath, GenerationId, Manifest};

/// Split discovered paths into the configured shell set and everything else.
///
/// Every shell entry lands in the shell set whether or not it was discovered.
/// Discovered paths equal to a shell entry are not repeated in the dynamic set.
/// Each call stamps a fresh `GenerationId`.
pub fn partition<I>(paths: I, shell: &[AssetPath]) -> Manifest
where
  I: IntoIterator<Item = AssetPath>,
{
  let shell: BTreeSet<AssetPath> = shell.iter().cloned().collect();
  let dynamic: BTreeSet<AssetPath> = paths.into_iter().filter(|p| !shell.contains(p)).collect();

  let generation_id = GenerationId::generate();
  debug!(
    generation = %generation_id,
    shell = shell.len(),
    dynamic = dynamic.len(),
    "partitioned manifest"
  );

  Manifest::new(generation_id, shell, dynamic)
}
