use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};

use swcache_lib::{BuildConfig, BuildOptions, build};

use crate::output::{
  OutputFormat, format_bytes, format_duration, print_info, print_json, print_stat, print_success, print_warning,
};

/// Command-line overrides, applied on top of config file and environment.
#[derive(Debug, Default)]
pub struct BuildArgs {
  pub root: Option<PathBuf>,
  pub out: Option<PathBuf>,
  pub config: Option<PathBuf>,
  pub dry_run: bool,
}

pub fn cmd_build(args: BuildArgs, output: OutputFormat) -> Result<()> {
  let start = Instant::now();

  let config = resolve_config(&args)?;
  let summary = build(&config, BuildOptions { dry_run: args.dry_run })
    .with_context(|| format!("Failed to build manifest for {}", config.root.display()))?;

  if output.is_json() {
    return print_json(&summary);
  }

  for entry in &summary.missing_shell {
    print_warning(&format!("Shell entry not found: {}", entry));
  }

  if summary.written {
    print_success("Service worker generated");
  } else {
    print_info("Dry run - nothing written");
  }
  print_stat("Assets", &summary.asset_count().to_string());
  print_stat("Shell", &summary.shell_count.to_string());
  print_stat("Dynamic", &summary.dynamic_count.to_string());
  print_stat("Generation", &summary.generation_id);
  print_stat("Cache", &summary.cache_name);
  print_stat("Output", &summary.output.display().to_string());
  if summary.written
    && let Ok(meta) = fs::metadata(&summary.output)
  {
    print_stat("Size", &format_bytes(meta.len()));
  }
  print_stat("Duration", &format_duration(start.elapsed()));

  Ok(())
}

/// Defaults, then config file, then environment, then flags.
fn resolve_config(args: &BuildArgs) -> Result<BuildConfig> {
  let config = match &args.config {
    Some(path) => BuildConfig::load(path).with_context(|| format!("Failed to load config {}", path.display()))?,
    None => BuildConfig::default(),
  };

  let mut config = config.with_env_overrides();
  if let Some(root) = &args.root {
    config.root = root.clone();
  }
  if let Some(out) = &args.out {
    config.output = out.clone();
  }
  Ok(config)
}
