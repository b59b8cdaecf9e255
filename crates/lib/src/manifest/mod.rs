//! Manifest builder.
//!
//! Turns a content tree into an immutable, generation-stamped `Manifest`:
//!
//! ```text
//! scan(root) -> filter(excludes) -> partition(shell) -> Manifest
//! ```
//!
//! Every stage is single-pass. A failure anywhere in the walk aborts the whole
//! build; callers collect the scan into a `Result` before partitioning.

mod filter;
mod partition;
mod scan;
mod types;

pub use filter::{ExcludeRule, ExcludeSet, filter};
pub use partition::partition;
pub use scan::{Scan, scan};
pub use types::*;

pub(crate) use types::extension_of;
