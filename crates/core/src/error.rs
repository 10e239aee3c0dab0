//! Error taxonomy for the benchmarking harness.
//!
//! All errors are explicit, typed, and fatal: the harness never retries and
//! never emits a partial result once one of these has been raised.

use std::path::PathBuf;

use thiserror::Error;

/// Exit status used for every harness-side failure.
pub const HARNESS_FAILURE_EXIT_CODE: u8 = 1;

/// Core error type for proctime operations.
#[derive(Debug, Error)]
pub enum Error {
    // Invocation errors
    #[error("invalid invocation: {reason}")]
    Usage { reason: String },

    #[error("configuration error: {reason}")]
    Config { reason: String },

    #[error(
        "proctime is already running in this process tree; invoke the proctime binary directly instead of from a benchmarked command"
    )]
    NestedInvocation,

    // Child process errors
    #[error("Command failed with exit code {code}")]
    ChildFailed { code: i32 },

    #[error("failed to spawn '{program}': {reason}")]
    SpawnFailed { program: String, reason: String },

    // Hook errors
    #[error("unknown hook '{name}' (available: {available})")]
    HookResolution { name: String, available: String },

    #[error("hook '{name}' failed during {phase}: {reason}")]
    HookFailed {
        name: String,
        phase: &'static str,
        reason: String,
    },

    // Profile errors
    #[error("failed to merge profile '{input}' into '{destination}': {reason}")]
    MergeFailed {
        input: PathBuf,
        destination: PathBuf,
        reason: String,
    },

    #[error("malformed profile data: {reason}")]
    ProfileFormat { reason: String },

    // I/O errors
    #[error("failed to read file '{path}': {reason}")]
    FileReadFailed { path: PathBuf, reason: String },

    #[error("failed to write file '{path}': {reason}")]
    FileWriteFailed { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a usage error.
    pub fn usage(reason: impl Into<String>) -> Self {
        Self::Usage {
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Create a spawn failure.
    pub fn spawn_failed(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            program: program.into(),
            reason: reason.into(),
        }
    }

    /// Create a hook failure for the given lifecycle phase.
    pub fn hook_failed(name: impl Into<String>, phase: &'static str, reason: impl Into<String>) -> Self {
        Self::HookFailed {
            name: name.into(),
            phase,
            reason: reason.into(),
        }
    }

    /// Create a profile merge failure.
    pub fn merge_failed(
        input: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MergeFailed {
            input: input.into(),
            destination: destination.into(),
            reason: reason.into(),
        }
    }

    /// Create a profile data format error.
    pub fn profile_format(reason: impl Into<String>) -> Self {
        Self::ProfileFormat {
            reason: reason.into(),
        }
    }

    /// Create a file read error.
    pub fn file_read_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FileReadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a file write error.
    pub fn file_write_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FileWriteFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Process exit status the harness should terminate with for this error.
    ///
    /// A failed child propagates its own status (truncated to the 8 bits a
    /// process can report). Everything else exits with
    /// [`HARNESS_FAILURE_EXIT_CODE`].
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ChildFailed { code } => u8::try_from(code.rem_euclid(256))
                .ok()
                .filter(|status| *status != 0)
                .unwrap_or(HARNESS_FAILURE_EXIT_CODE),
            _ => HARNESS_FAILURE_EXIT_CODE,
        }
    }
}
