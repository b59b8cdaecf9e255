//! Runtime agent rendering.
//!
//! Serializes a `Manifest` plus `RuntimeOptions` into the self-contained
//! service worker source. Rendering is a pure function of its inputs; the
//! only side effect in this module is `write_agent`, which replaces the
//! output file atomically.

mod templates;

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::RuntimeOptions;
use crate::manifest::{AssetPath, BuildError, Manifest};

pub use templates::SERVICE_WORKER_TEMPLATE;

/// Render the runtime agent for `manifest`.
pub fn render(manifest: &Manifest, options: &RuntimeOptions) -> String {
  let cache_name = manifest.cache_name(&options.cache_prefix);

  fill(SERVICE_WORKER_TEMPLATE, |key| match key {
    templates::CACHE_NAME => Some(js_string(&cache_name)),
    templates::PLACEHOLDER_IMAGE => Some(js_string(options.placeholder_image.as_str())),
    templates::VOLATILE_PREFIX => Some(js_string(&options.volatile_prefix)),
    templates::REFRESH_ACTION => Some(js_string(&options.refresh_action)),
    templates::SHELL_ASSETS => Some(js_array(manifest.shell())),
    templates::DYNAMIC_ASSETS => Some(js_array(manifest.dynamic())),
    _ => None,
  })
}

/// Write the rendered agent, replacing any previous file in one rename.
pub fn write_agent(path: &Path, contents: &str) -> Result<(), BuildError> {
  let write_err = |source| BuildError::Write {
    path: path.to_path_buf(),
    source,
  };

  let parent = match path.parent() {
    Some(p) if !p.as_os_str().is_empty() => p,
    _ => Path::new("."),
  };

  let mut temp = NamedTempFile::new_in(parent).map_err(write_err)?;
  temp.write_all(contents.as_bytes()).map_err(write_err)?;
  temp.flush().map_err(write_err)?;
  temp.persist(path).map_err(|e| write_err(e.error))?;

  debug!(path = %path.display(), bytes = contents.len(), "wrote runtime agent");
  Ok(())
}

/// Single-pass `{{key}}` substitution. Unknown keys are left verbatim, and
/// substituted text is never rescanned.
fn fill(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
  let mut out = String::with_capacity(template.len());
  let mut rest = template;

  while let Some(start) = rest.find("{{") {
    out.push_str(&rest[..start]);
    let after = &rest[start..];
    match after.find("}}") {
      Some(end) => {
        let token = &after[..end + 2];
        match lookup(token) {
          Some(value) => out.push_str(&value),
          None => out.push_str(token),
        }
        rest = &after[end + 2..];
      }
      None => {
        out.push_str(after);
        rest = "";
      }
    }
  }

  out.push_str(rest);
  out
}

fn js_string(value: &str) -> String {
  serde_json::Value::String(value.to_string()).to_string()
}

fn js_array(paths: &BTreeSet<AssetPath>) -> String {
  if paths.is_empty() {
    return "[]".to_string();
  }

  let items: Vec<String> = paths.iter().map(|p| format!("  {}", js_string(p.as_str()))).collect();
  format!("[\n{}\n]", items.join(",\n"))
}
