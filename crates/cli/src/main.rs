mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

/// swcache - offline manifest builder for static web games
#[derive(Parser)]
#[command(name = "swcache")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Content root to scan [default: .]
  root: Option<PathBuf>,

  /// Where to write the generated service worker [default: ./sw.js]
  #[arg(long)]
  out: Option<PathBuf>,

  /// JSON config file
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Build and report without writing the output file
  #[arg(long)]
  dry_run: bool,

  /// Output format
  #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  /// Enable verbose output
  #[arg(short, long)]
  verbose: bool,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let level = if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::builder().with_default_directive(level.into()).from_env_lossy())
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  cmd::cmd_build(
    cmd::BuildArgs {
      root: cli.root,
      out: cli.out,
      config: cli.config,
      dry_run: cli.dry_run,
    },
    cli.output,
  )
}
