//! CLI definition using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use proctime_core::{Error, Result};

use crate::config::{ProfileTarget, RunConfig};
use crate::settings::HarnessSettings;

/// proctime - time a command over repeated runs
#[derive(Parser, Debug)]
#[command(name = "proctime")]
#[command(version)]
#[command(about = "Run a command N times; print elapsed seconds, peak RSS delta and metadata")]
#[command(
    long_about = "Spawns PROGRAM LOOPS times in sequence with its output discarded, then prints three lines: \
the wall time of all runs in seconds, the largest per-run growth of children peak RSS in bytes (-1 if \
unmeasurable), and run metadata as one line of JSON. Options must come before LOOPS."
)]
pub struct Cli {
    /// Merge profiling statistics from every run into this file
    #[arg(long, value_name = "PATH")]
    pub profile: Option<PathBuf>,

    /// Activate a hook around the loop (repeatable, applied in order)
    #[arg(long = "hook", value_name = "NAME", action = ArgAction::Append)]
    pub hooks: Vec<String>,

    /// Settings file (TOML); defaults to $PROCTIME_CONFIG
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print the available hook names and exit
    #[arg(long, default_value_t = false)]
    pub list_hooks: bool,

    /// Number of sequential runs
    #[arg(
        value_name = "LOOPS",
        required_unless_present = "list_hooks",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub loops: Option<u32>,

    /// Program to benchmark, followed by its own arguments
    #[arg(
        value_name = "PROGRAM",
        required_unless_present = "list_hooks",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        num_args = 1..
    )]
    pub command: Vec<String>,
}

impl Cli {
    /// Build the immutable run configuration
    ///
    /// # Errors
    ///
    /// Returns error if the loop count or program is missing or invalid.
    pub fn run_config(&self, settings: &HarnessSettings) -> Result<RunConfig> {
        let loops = self
            .loops
            .ok_or_else(|| Error::usage("a loop count is required"))?;
        let config = RunConfig::new(loops, self.command.clone())?;

        match &self.profile {
            Some(path) => Ok(config.with_profile(ProfileTarget::new(
                path.clone(),
                settings.profiler.args.clone(),
            )?)),
            None => Ok(config),
        }
    }

    /// Default log filter for the requested verbosity
    #[must_use]
    pub const fn default_log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
