//! swcache-lib: offline caching layer for static web bundles
//!
//! Build time:
//! - `manifest`: scans a content tree into a generation-stamped `Manifest`
//! - `render`: serializes a manifest into the runtime agent source
//! - `build`: the scan-to-write pipeline driven by a `BuildConfig`
//!
//! Run time:
//! - `engine`: the cache-strategy engine (install, activate, fetch, message)

pub mod build;
pub mod config;
pub mod consts;
pub mod engine;
pub mod manifest;
pub mod render;

pub use build::{BuildOptions, BuildSummary, build};
pub use config::{BuildConfig, ConfigError, RuntimeOptions};
pub use manifest::{AssetPath, BuildError, ExcludeRule, ExcludeSet, GenerationId, Manifest};
