//! Counting hook used to check the lifecycle contract end to end.

use proctime_core::{Metadata, Result};
use serde_json::json;

/// Counts activations and deactivations and reports them at teardown.
#[derive(Debug, Default)]
pub struct TestHook {
    activations: u64,
    deactivations: u64,
}

impl TestHook {
    /// Registry name.
    pub const NAME: &'static str = "test_hook";

    /// Number of times the hook was activated.
    #[must_use]
    pub const fn activations(&self) -> u64 {
        self.activations
    }

    /// Number of times the hook was deactivated.
    #[must_use]
    pub const fn deactivations(&self) -> u64 {
        self.deactivations
    }
}

impl crate::Hook for TestHook {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn activate(&mut self) -> Result<()> {
        self.activations = self.activations.saturating_add(1);
        Ok(())
    }

    fn deactivate(&mut self) -> Result<()> {
        self.deactivations = self.deactivations.saturating_add(1);
        Ok(())
    }

    fn teardown(&mut self, metadata: &mut Metadata) -> Result<()> {
        metadata.insert(
            Self::NAME.to_string(),
            json!({
                "activations": self.activations,
                "deactivations": self.deactivations,
            }),
        );
        Ok(())
    }
}
