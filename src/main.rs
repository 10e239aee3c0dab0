//! # proctime
//!
//! Entry point. Parses the command line once, then runs the harness.
//!
//! ## Streams
//!
//! stdout carries only the three-line result; logs and diagnostics go to
//! stderr.
//!
//! ## Exit status
//!
//! - 0 after the result was written
//! - 2 when the command line is malformed
//! - the child's own status when a run fails (nothing is written to stdout)
//! - 1 for any other failure

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use proctime::cli::Cli;
use proctime::proctime_core::error::HARNESS_FAILURE_EXIT_CODE;
use proctime::proctime_hooks::HookRegistry;
use proctime::{Error, HarnessSettings, emit, harness, platform_sampler};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(
                err.downcast_ref::<Error>()
                    .map_or(HARNESS_FAILURE_EXIT_CODE, Error::exit_code),
            )
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    harness::ensure_top_level()?;

    let settings = HarnessSettings::load(cli.config.as_deref()).context("failed to load settings")?;
    init_tracing(
        settings
            .logging
            .filter
            .as_deref()
            .unwrap_or_else(|| cli.default_log_filter()),
    );

    let registry = HookRegistry::builtin();
    if cli.list_hooks {
        let mut stdout = std::io::stdout().lock();
        for name in registry.names() {
            writeln!(stdout, "{name}")?;
        }
        return Ok(());
    }

    let config = cli.run_config(&settings)?;
    let mut hooks = registry.resolve(&cli.hooks)?;
    tracing::info!(
        loops = config.loops().get(),
        command = ?config.command(),
        hooks = ?hooks.names(),
        profile = ?config.profile().map(|target| target.destination()),
        "starting benchmark"
    );

    let sampler = platform_sampler();
    let result = harness::run(&config, &mut hooks, sampler.as_ref())?;

    emit(&result, &mut std::io::stdout().lock())?;
    Ok(())
}

/// Initialize tracing on stderr; stdout is reserved for the result.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_new(default_filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
