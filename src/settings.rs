#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! Harness settings loaded from an optional TOML file and the environment.

use std::path::{Path, PathBuf};

use proctime_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::config::ProfilerTemplate;

/// Environment variable naming a settings file.
pub const CONFIG_ENV: &str = "PROCTIME_CONFIG";

/// Environment variable overriding the profiler template (whitespace separated).
pub const PROFILER_ARGS_ENV: &str = "PROCTIME_PROFILER_ARGS";

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "PROCTIME_LOG";

/// Settings that shape a run without being part of the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessSettings {
    #[serde(default)]
    pub profiler: ProfilerSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// `[profiler]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfilerSettings {
    /// Arguments inserted after the program; must contain `{output}`.
    #[serde(default)]
    pub args: ProfilerTemplate,
}

/// `[logging]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `"proctime=debug"`.
    #[serde(default)]
    pub filter: Option<String>,
}

impl HarnessSettings {
    /// Load settings from an explicit file, else `PROCTIME_CONFIG`, else
    /// defaults; environment overrides are applied last.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or an override is
    /// invalid.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let settings = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        settings.with_env_overrides()
    }

    /// Load settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not valid settings TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::file_read_failed(path, e.to_string()))?;
        Self::from_toml(&content)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))
    }

    /// Parse settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid settings TOML.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("failed to parse settings: {e}")))
    }

    /// Apply `PROCTIME_PROFILER_ARGS` and `PROCTIME_LOG` on top of `self`.
    ///
    /// # Errors
    ///
    /// Returns error if the profiler override lacks the output placeholder.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(args) = std::env::var(PROFILER_ARGS_ENV) {
            self.profiler.args =
                ProfilerTemplate::new(args.split_whitespace().map(ToString::to_string).collect())?;
        }

        if let Ok(filter) = std::env::var(LOG_ENV) {
            self.logging.filter = Some(filter);
        }

        Ok(self)
    }
}
