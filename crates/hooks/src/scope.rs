//! Scoped activation of a set of hooks.

use proctime_core::{Result, ResultExt};

use crate::hook::Hook;

/// Guard holding every hook active for the lifetime of the benchmarking loop.
///
/// Hooks are entered in order and exited in strict reverse order, either
/// through [`HookScope::exit`] or when the guard is dropped. Dropping covers
/// early returns and unwinding, so no activated hook is ever left active.
pub struct HookScope<'a> {
    hooks: &'a mut [Box<dyn Hook>],
    active: usize,
}

impl<'a> HookScope<'a> {
    /// Activate `hooks` front to back.
    ///
    /// # Errors
    ///
    /// Returns the first activation error after deactivating the hooks that
    /// were already active.
    pub fn enter(hooks: &'a mut [Box<dyn Hook>]) -> Result<Self> {
        let mut scope = Self { hooks, active: 0 };

        while let Some(hook) = scope.hooks.get_mut(scope.active) {
            tracing::debug!(hook = hook.name(), "activate");
            // On error the guard drops here and unwinds what is active
            hook.activate()?;
            scope.active = scope.active.saturating_add(1);
        }

        Ok(scope)
    }

    /// Number of hooks currently active.
    #[must_use]
    pub const fn active(&self) -> usize {
        self.active
    }

    /// Deactivate every hook now, reporting the first failure.
    ///
    /// Every active hook is deactivated even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns the first deactivation error.
    pub fn exit(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        let mut first_error = Ok(());

        while let Some(last) = self.active.checked_sub(1) {
            self.active = last;
            if let Some(hook) = self.hooks.get_mut(last) {
                tracing::debug!(hook = hook.name(), "deactivate");
                let outcome = hook.deactivate();
                if first_error.is_ok() {
                    first_error = outcome;
                } else {
                    let _ = outcome.into_option_logged();
                }
            }
        }

        first_error
    }
}

impl Drop for HookScope<'_> {
    fn drop(&mut self) {
        let _ = self.release().into_option_logged();
    }
}
