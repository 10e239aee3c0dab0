#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! Run configuration for the benchmarking loop

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use proctime_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Placeholder substituted with the per-run temporary profile path
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// How the child's standard streams are wired
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum IoPolicy {
    /// stdin and stdout go to the null device, stderr is merged into stdout
    #[default]
    DiscardMerged,
}

impl IoPolicy {
    /// Wire the child's streams according to the policy
    pub fn apply(self, command: &mut Command) {
        match self {
            // stderr merged into a discarded stdout is itself discarded
            Self::DiscardMerged => {
                command
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null());
            }
        }
    }
}

/// Arguments inserted between the program and its own arguments when
/// profiling, e.g. `python -m cProfile -o {output} script.py`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ProfilerTemplate {
    args: Vec<String>,
}

impl ProfilerTemplate {
    /// Create a template, checking it routes output somewhere
    ///
    /// # Errors
    ///
    /// Returns error if no argument contains the `{output}` placeholder
    pub fn new(args: Vec<String>) -> Result<Self> {
        if args.iter().any(|arg| arg.contains(OUTPUT_PLACEHOLDER)) {
            Ok(Self { args })
        } else {
            Err(Error::config(format!(
                "profiler arguments must contain the {OUTPUT_PLACEHOLDER} placeholder: {args:?}"
            )))
        }
    }

    /// Get the raw template arguments
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Expand the template for one output path
    #[must_use]
    pub fn render(&self, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace(OUTPUT_PLACEHOLDER, &output))
            .collect()
    }
}

impl Default for ProfilerTemplate {
    fn default() -> Self {
        Self {
            args: ["-m", "cProfile", "-o", OUTPUT_PLACEHOLDER]
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl TryFrom<Vec<String>> for ProfilerTemplate {
    type Error = Error;

    fn try_from(args: Vec<String>) -> Result<Self> {
        Self::new(args)
    }
}

impl From<ProfilerTemplate> for Vec<String> {
    fn from(template: ProfilerTemplate) -> Self {
        template.args
    }
}

/// Where and how to collect profiling statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileTarget {
    /// Cumulative statistics file
    destination: PathBuf,

    /// Arguments wrapping the command
    template: ProfilerTemplate,
}

impl ProfileTarget {
    /// Create a profile target
    ///
    /// # Errors
    ///
    /// Returns error if the destination path is empty
    pub fn new(destination: PathBuf, template: ProfilerTemplate) -> Result<Self> {
        if destination.as_os_str().is_empty() {
            return Err(Error::usage("profile path cannot be empty"));
        }
        Ok(Self {
            destination,
            template,
        })
    }

    /// Get the cumulative statistics path
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Get the profiler template
    #[must_use]
    pub const fn template(&self) -> &ProfilerTemplate {
        &self.template
    }

    /// Directory per-run output is staged in, so it can be renamed into place
    #[must_use]
    pub fn staging_dir(&self) -> &Path {
        crate::profile::staging_dir(&self.destination)
    }
}

/// Immutable configuration for one harness invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Number of sequential runs
    loops: NonZeroU32,

    /// Program followed by its arguments
    command: Vec<String>,

    /// Optional profiling collection
    profile: Option<ProfileTarget>,

    /// Child stream wiring
    io: IoPolicy,
}

impl RunConfig {
    /// Create a new run configuration with validation
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - `loops` is zero
    /// - `command` is empty or its program is an empty string
    ///
    /// # Examples
    ///
    /// ```
    /// # use proctime::RunConfig;
    /// let config = RunConfig::new(3, vec!["true".to_string()]);
    /// assert!(config.is_ok());
    /// assert!(RunConfig::new(0, vec!["true".to_string()]).is_err());
    /// ```
    pub fn new(loops: u32, command: Vec<String>) -> Result<Self> {
        let loops = NonZeroU32::new(loops)
            .ok_or_else(|| Error::usage("loop count must be a positive integer"))?;
        Self::validate_command(&command)?;

        Ok(Self {
            loops,
            command,
            profile: None,
            io: IoPolicy::default(),
        })
    }

    /// Collect profiling statistics into `target`
    #[must_use]
    pub fn with_profile(mut self, target: ProfileTarget) -> Self {
        self.profile = Some(target);
        self
    }

    /// Get the loop count
    #[must_use]
    pub const fn loops(&self) -> NonZeroU32 {
        self.loops
    }

    /// Get the full command line
    #[must_use]
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// Get the profile target (if profiling)
    #[must_use]
    pub const fn profile(&self) -> Option<&ProfileTarget> {
        self.profile.as_ref()
    }

    /// Get the I/O policy
    #[must_use]
    pub const fn io(&self) -> IoPolicy {
        self.io
    }

    /// Command line actually spawned, with the profiler spliced in after the
    /// program when profiling
    #[must_use]
    pub fn effective_command(&self, profile_output: Option<&Path>) -> Vec<String> {
        match (self.profile.as_ref(), profile_output, self.command.split_first()) {
            (Some(target), Some(output), Some((program, args))) => std::iter::once(program.clone())
                .chain(target.template().render(output))
                .chain(args.iter().cloned())
                .collect(),
            _ => self.command.clone(),
        }
    }

    /// Validate the command line
    fn validate_command(command: &[String]) -> Result<()> {
        match command.first() {
            None => Err(Error::usage("a program to benchmark is required")),
            Some(program) if program.is_empty() => {
                Err(Error::usage("program name cannot be empty"))
            }
            Some(_) => Ok(()),
        }
    }
}
