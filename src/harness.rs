#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! One harness invocation: hooks wrapped around the benchmarking loop

use proctime_core::{Error, Metadata, Result};
use proctime_hooks::ResolvedHooks;

use crate::bench::{BenchResult, BenchRunner};
use crate::config::RunConfig;
use crate::process::running_under_harness;
use crate::sampler::MemorySampler;

/// Refuse to start from inside a command another harness is benchmarking
///
/// # Errors
///
/// Returns [`Error::NestedInvocation`] when the harness marker is present in
/// the environment.
pub fn ensure_top_level() -> Result<()> {
    if running_under_harness() {
        Err(Error::NestedInvocation)
    } else {
        Ok(())
    }
}

/// Run the loop inside one activation scope of `hooks`, then tear them down
///
/// Ordering, on success and failure alike:
/// 1. activate hooks in order
/// 2. run every iteration
/// 3. deactivate hooks in reverse order
/// 4. teardown hooks in activation order
///
/// Metadata from teardown is attached to the result only when the loop
/// succeeded.
///
/// # Errors
///
/// Returns, in priority order: an activation error (nothing was run), the
/// loop error, a deactivation error, a teardown error.
pub fn run(
    config: &RunConfig,
    hooks: &mut ResolvedHooks,
    sampler: &dyn MemorySampler,
) -> Result<BenchResult> {
    let scope = hooks.activate_all()?;
    let outcome = BenchRunner::new(config, sampler).run();
    let released = scope.exit();

    let mut metadata = Metadata::new();
    let torn_down = hooks.teardown_all(&mut metadata);

    let mut result = outcome.inspect_err(|_| {
        tracing::debug!(?metadata, "discarding hook metadata of failed run");
    })?;
    released?;
    torn_down?;

    result.metadata_mut().extend(metadata);
    Ok(result)
}
