//! Records when the measured window opened and closed.

use chrono::{DateTime, SecondsFormat, Utc};
use proctime_core::{Error, Metadata, Result};
use serde_json::Value;

/// Stamps UTC wall-clock times at activation and deactivation.
#[derive(Debug, Default)]
pub struct WallclockHook {
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
}

impl WallclockHook {
    /// Registry name.
    pub const NAME: &'static str = "wallclock";

    /// Metadata key for the activation timestamp.
    pub const START_KEY: &'static str = "wallclock_start";

    /// Metadata key for the deactivation timestamp.
    pub const END_KEY: &'static str = "wallclock_end";
}

impl crate::Hook for WallclockHook {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn activate(&mut self) -> Result<()> {
        self.started_at = Some(Utc::now());
        Ok(())
    }

    fn deactivate(&mut self) -> Result<()> {
        self.ended_at = Some(Utc::now());
        Ok(())
    }

    fn teardown(&mut self, metadata: &mut Metadata) -> Result<()> {
        let (Some(start), Some(end)) = (self.started_at, self.ended_at) else {
            return Err(Error::hook_failed(
                Self::NAME,
                "teardown",
                "window was never opened and closed",
            ));
        };

        metadata.insert(
            Self::START_KEY.to_string(),
            Value::String(start.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        metadata.insert(
            Self::END_KEY.to_string(),
            Value::String(end.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        Ok(())
    }
}
