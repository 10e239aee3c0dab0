#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # proctime
//!
//! Process-level benchmarking harness. Runs an external command a fixed
//! number of times, one after another, and reports:
//!
//! 1. wall time across all runs, in seconds
//! 2. the largest per-run growth of children peak RSS, in bytes
//! 3. metadata contributed by hooks, as one line of JSON
//!
//! Optionally splices a profiler into every run and merges the statistics
//! into one cumulative file.

pub use proctime_core;
pub use proctime_hooks;

pub mod bench;
pub mod cli;
pub mod config;
pub mod emit;
pub mod harness;
pub mod marshal;
pub mod process;
pub mod profile;
pub mod sampler;
pub mod settings;

pub use bench::{BenchResult, BenchRunner};
pub use config::{IoPolicy, ProfileTarget, ProfilerTemplate, RunConfig};
pub use emit::emit;
pub use proctime_core::{Error, Metadata, Result};
pub use sampler::{MemorySample, MemorySampler, MemoryScope, platform_sampler};
pub use settings::HarnessSettings;
