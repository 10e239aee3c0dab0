//! Result type definition and extension traits.
//!
//! Provides combinators for Result types that log instead of unwrapping.

use crate::error::Error;

/// The standard Result type for proctime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait providing logging combinators for Results.
///
/// Used on cleanup paths (scope guards) where an error cannot be propagated
/// but must not vanish silently either.
pub trait ResultExt<T> {
    /// Convert a Result to an Option, logging the error if present.
    fn into_option_logged(self) -> Option<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn into_option_logged(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("operation failed during cleanup: {e}");
                None
            }
        }
    }
}
