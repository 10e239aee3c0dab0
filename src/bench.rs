#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! The benchmarking loop: run a command N times, time it, track peak RSS growth

use std::time::{Duration, Instant};

use proctime_core::{Error, Metadata, Result};

use crate::config::RunConfig;
use crate::process::ChildRun;
use crate::profile::ProfileSession;
use crate::sampler::{MemoryScope, MemorySampler};

/// Outcome of one harness invocation
#[derive(Debug, Clone, PartialEq)]
pub struct BenchResult {
    /// Wall time from before the first run to after the last
    elapsed: Duration,

    /// Largest per-run growth of children peak RSS, in bytes
    peak_memory: Option<u64>,

    /// Metadata contributed by hooks
    metadata: Metadata,
}

impl BenchResult {
    /// Create a result with empty metadata
    #[must_use]
    pub fn new(elapsed: Duration, peak_memory: Option<u64>) -> Self {
        Self {
            elapsed,
            peak_memory,
            metadata: Metadata::new(),
        }
    }

    /// Get the elapsed wall time
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Get the peak memory delta in bytes, `None` when unmeasurable
    #[must_use]
    pub const fn peak_memory(&self) -> Option<u64> {
        self.peak_memory
    }

    /// Get the run metadata
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Get the run metadata for hooks to fill in
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

/// Runs the configured command sequentially and measures it
pub struct BenchRunner<'a> {
    config: &'a RunConfig,
    sampler: &'a dyn MemorySampler,
}

impl<'a> BenchRunner<'a> {
    /// Create a new runner
    #[must_use]
    pub const fn new(config: &'a RunConfig, sampler: &'a dyn MemorySampler) -> Self {
        Self { config, sampler }
    }

    /// Run every iteration
    ///
    /// This will:
    /// 1. Splice the profiler into the command when profiling
    /// 2. Start the clock once
    /// 3. For each iteration: sample children RSS, spawn and wait, sample
    ///    again, keep the largest delta, merge the iteration's profile
    /// 4. Stop the clock once
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The command cannot be spawned
    /// - An iteration exits non-zero ([`Error::ChildFailed`]); the temporary
    ///   profile output is removed first and no result is produced
    /// - A profile merge fails
    pub fn run(&self) -> Result<BenchResult> {
        let session = self.config.profile().map(ProfileSession::start).transpose()?;
        let argv = self
            .config
            .effective_command(session.as_ref().map(ProfileSession::output));

        let outcome = self.iterate(&argv, session.as_ref());
        if let Some(session) = session {
            session.discard();
        }
        let (elapsed, max_delta) = outcome?;

        let peak_memory = self.sampler.is_available().then_some(max_delta);
        tracing::debug!(
            elapsed_secs = elapsed.as_secs_f64(),
            ?peak_memory,
            loops = self.config.loops().get(),
            "benchmark finished"
        );

        Ok(BenchResult::new(elapsed, peak_memory))
    }

    fn iterate(&self, argv: &[String], session: Option<&ProfileSession>) -> Result<(Duration, u64)> {
        let loops = self.config.loops().get();
        let mut max_delta = 0_u64;

        let start = Instant::now();
        for iteration in 0..loops {
            let before = self.sampler.sample(MemoryScope::Children);

            let child = ChildRun::spawn(argv, self.config.io())?;
            let pid = child.pid();
            let code = child.wait()?;
            if code != 0 {
                tracing::error!(iteration, pid, code, "benchmarked command failed");
                return Err(Error::ChildFailed { code });
            }

            let delta = self
                .sampler
                .sample(MemoryScope::Children)
                .delta_since(before);
            max_delta = max_delta.max(delta);
            tracing::debug!(iteration, pid, rss_delta = delta, "iteration complete");

            if let Some(session) = session {
                session.merge_iteration()?;
            }
        }
        let elapsed = start.elapsed();

        Ok((elapsed, max_delta))
    }
}
