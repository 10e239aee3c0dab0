//! Name → hook resolution.

use std::collections::BTreeMap;

use proctime_core::{Error, Metadata, Result};
use serde_json::Value;

use crate::builtin::{TestHook, WallclockHook};
use crate::hook::Hook;
use crate::scope::HookScope;

/// Builds a fresh hook instance for one harness invocation.
pub type HookFactory = Box<dyn Fn() -> Box<dyn Hook>>;

/// Metadata key listing the hooks that were active for the run.
pub const HOOKS_METADATA_KEY: &str = "hooks";

/// Registry of known hooks, keyed by the name used on the command line.
pub struct HookRegistry {
    factories: BTreeMap<String, HookFactory>,
}

impl HookRegistry {
    /// An empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry holding every hook shipped with proctime.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new()
            .with_factory(TestHook::NAME, || Box::new(TestHook::default()))
            .with_factory(WallclockHook::NAME, || Box::new(WallclockHook::default()))
    }

    /// Register a hook factory under `name`, replacing any previous one.
    #[must_use]
    pub fn with_factory<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Hook> + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    /// Names of all registered hooks, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiate the requested hooks, in request order.
    ///
    /// Repeated names resolve to a single instance at the position of their
    /// first occurrence. An empty request resolves to an empty set without
    /// touching any factory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HookResolution`] for the first unknown name. No hook
    /// is instantiated in that case.
    pub fn resolve(&self, names: &[String]) -> Result<ResolvedHooks> {
        let mut unique: Vec<&String> = Vec::with_capacity(names.len());
        for name in names {
            if !self.factories.contains_key(name) {
                return Err(Error::HookResolution {
                    name: name.clone(),
                    available: self.names().collect::<Vec<_>>().join(", "),
                });
            }
            if !unique.contains(&name) {
                unique.push(name);
            }
        }

        let hooks = unique
            .into_iter()
            .filter_map(|name| self.factories.get(name))
            .map(|factory| factory())
            .collect();

        Ok(ResolvedHooks { hooks })
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Hook instances owned for the duration of one harness invocation.
pub struct ResolvedHooks {
    hooks: Vec<Box<dyn Hook>>,
}

impl ResolvedHooks {
    /// A set with no hooks.
    #[must_use]
    pub const fn empty() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Whether no hooks were requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Number of resolved hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Hook names in activation order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.hooks.iter().map(|hook| hook.name()).collect()
    }

    /// Activate every hook, returning the guard that deactivates them.
    ///
    /// # Errors
    ///
    /// Returns the first activation error; hooks activated before it are
    /// deactivated again, in reverse order, before this returns.
    pub fn activate_all(&mut self) -> Result<HookScope<'_>> {
        HookScope::enter(&mut self.hooks)
    }

    /// Run teardown for every hook in activation order.
    ///
    /// Records the active hook names under [`HOOKS_METADATA_KEY`] first. Every
    /// hook is torn down even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns the first teardown error.
    pub fn teardown_all(&mut self, metadata: &mut Metadata) -> Result<()> {
        if self.hooks.is_empty() {
            return Ok(());
        }

        metadata.insert(
            HOOKS_METADATA_KEY.to_string(),
            Value::String(self.names().join(", ")),
        );

        self.hooks
            .iter_mut()
            .map(|hook| {
                tracing::debug!(hook = hook.name(), "teardown");
                hook.teardown(metadata)
            })
            .fold(Ok(()), |first, outcome| first.and(outcome))
    }
}
