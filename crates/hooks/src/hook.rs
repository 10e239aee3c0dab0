//! The hook contract.

use proctime_core::{Metadata, Result};

/// A pluggable observer wrapped around the benchmarking loop.
///
/// Lifecycle for one harness invocation:
///
/// 1. [`activate`](Hook::activate) once, before the first timed iteration
/// 2. [`deactivate`](Hook::deactivate) once, after the last iteration or when
///    the loop bails out early
/// 3. [`teardown`](Hook::teardown) once, after every hook has been deactivated
///
/// `deactivate` is only called for hooks whose `activate` succeeded.
pub trait Hook {
    /// Registry name, as passed to `--hook`.
    fn name(&self) -> &str;

    /// Acquire whatever the hook observes or changes.
    ///
    /// # Errors
    ///
    /// Returns error if the hook cannot start; the loop is never entered.
    fn activate(&mut self) -> Result<()>;

    /// Release what `activate` acquired.
    ///
    /// # Errors
    ///
    /// Returns error if the release fails. When this runs from a scope guard
    /// the error is logged rather than propagated.
    fn deactivate(&mut self) -> Result<()>;

    /// Contribute run metadata.
    ///
    /// # Errors
    ///
    /// Returns error if the hook cannot report its state.
    fn teardown(&mut self, metadata: &mut Metadata) -> Result<()>;
}
