//! Runtime cache-strategy engine.
//!
//! The engine is what the generated agent does, expressed against explicit
//! host interfaces so it can run (and be tested) outside a browser:
//!
//! - `install`: open the generation's store, cache the shell (fatal on
//!   failure) and the dynamic set (failures deferred), then skip waiting.
//! - `activate`: delete every other store, then claim open sessions.
//! - `fetch`: cache-first with typed fallback for manifest paths on our
//!   origin, network-first for everything else.
//! - `message`: forced refresh of non-volatile dynamic entries.

pub mod agent;
pub mod classify;
pub mod events;
pub mod fallback;
pub mod host;
pub mod http;
pub mod memory;
pub mod types;

pub use agent::{AgentConfig, CacheAgent};
pub use classify::{AssetIndex, RequestClass};
pub use events::{AgentEvent, AgentHandle, EventLoop, EventOutcome, event_loop};
pub use fallback::{FallbackKind, fallback_kind};
pub use host::{CacheStorage, Clients, Fetcher, LocalClients};
pub use http::HttpFetcher;
pub use memory::MemoryCacheStorage;
pub use types::{
  ActivationReport, CacheError, EngineError, FetchError, FetchOutcome, InstallError, InstallReport, Lifecycle,
  MessageOutcome, RefreshReport, Request, Response, RuntimeState,
};
