//! Core types shared by the proctime harness and its hooks.
//!
//! Everything fallible in the workspace returns [`Result`], and every failure
//! is an [`Error`] variant: no panics, no silent fallbacks.

pub mod error;
pub mod result;

pub use error::Error;
pub use result::{Result, ResultExt};

/// Run metadata contributed by hooks and emitted as the third output line.
///
/// Keys are sorted, so the serialized form is stable across runs.
pub type Metadata = serde_json::Map<String, serde_json::Value>;
