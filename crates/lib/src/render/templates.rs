//! Runtime agent source template.

/// Service worker source with `{{name}}` placeholders.
///
/// Every placeholder is substituted with a JavaScript expression (a string
/// literal or an array literal), never with raw text.
pub const SERVICE_WORKER_TEMPLATE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/service-worker.js"));

pub const CACHE_NAME: &str = "{{cache_name}}";
pub const PLACEHOLDER_IMAGE: &str = "{{placeholder_image}}";
pub const VOLATILE_PREFIX: &str = "{{volatile_prefix}}";
pub const REFRESH_ACTION: &str = "{{refresh_action}}";
pub const SHELL_ASSETS: &str = "{{shell_assets}}";
pub const DYNAMIC_ASSETS: &str = "{{dynamic_assets}}";
