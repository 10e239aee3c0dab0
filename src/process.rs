#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! Child process management for benchmarked commands

use std::process::{Child, Command, ExitStatus};

use proctime_core::{Error, Result};

use crate::config::IoPolicy;

/// Marker exported to every benchmarked child
pub const ACTIVE_ENV: &str = "PROCTIME_ACTIVE";

/// Exit offset for children terminated by a signal, as shells report them
const SIGNAL_EXIT_OFFSET: i32 = 128;

/// A benchmarked command running as a child process
pub struct ChildRun {
    /// The child process handle
    child: Child,

    /// Program name, for diagnostics
    program: String,
}

impl ChildRun {
    /// Spawn `argv` with the given stream wiring
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - `argv` is empty
    /// - The process fails to spawn (e.g. program not found)
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use proctime::process::ChildRun;
    /// # use proctime::IoPolicy;
    /// let status = ChildRun::spawn(&["true".to_string()], IoPolicy::default())
    ///     .and_then(ChildRun::wait);
    /// ```
    pub fn spawn(argv: &[String], io: IoPolicy) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::usage("cannot spawn an empty command"))?;

        let mut command = Command::new(program);
        command.args(args).env(ACTIVE_ENV, "1");
        io.apply(&mut command);

        let child = command
            .spawn()
            .map_err(|e| Error::spawn_failed(program.as_str(), e.to_string()))?;

        tracing::trace!(pid = child.id(), program = %program, "spawned child");

        Ok(Self {
            child,
            program: program.clone(),
        })
    }

    /// Get the process ID
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Block until the child exits and return its exit code
    ///
    /// # Errors
    ///
    /// Returns error if waiting on the child fails
    pub fn wait(mut self) -> Result<i32> {
        let status = self
            .child
            .wait()
            .map_err(|e| Error::spawn_failed(self.program.as_str(), format!("wait failed: {e}")))?;
        Ok(exit_code(status))
    }
}

/// Exit code of a finished child; signals map to `128 + signal`
#[must_use]
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return SIGNAL_EXIT_OFFSET.saturating_add(signal);
        }
    }

    SIGNAL_EXIT_OFFSET
}

/// Whether this process was started by a running harness
#[must_use]
pub fn running_under_harness() -> bool {
    std::env::var_os(ACTIVE_ENV).is_some()
}
