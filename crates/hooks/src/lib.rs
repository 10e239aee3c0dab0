//! Pluggable lifecycle hooks for the benchmarking loop.
//!
//! A run resolves the requested hook names once ([`HookRegistry::resolve`]),
//! wraps the whole loop in a single [`HookScope`], and tears every hook down
//! afterwards so it can contribute run metadata.
//!
//! ```
//! use proctime_core::Metadata;
//! use proctime_hooks::HookRegistry;
//!
//! # fn main() -> proctime_core::Result<()> {
//! let registry = HookRegistry::builtin();
//! let mut hooks = registry.resolve(&["test_hook".to_string()])?;
//! {
//!     let _scope = hooks.activate_all()?;
//!     // timed region
//! }
//! let mut metadata = Metadata::new();
//! hooks.teardown_all(&mut metadata)?;
//! assert!(metadata.contains_key("test_hook"));
//! # Ok(())
//! # }
//! ```

pub mod builtin;
pub mod hook;
pub mod registry;
pub mod scope;

pub use hook::Hook;
pub use registry::{HookFactory, HookRegistry, ResolvedHooks};
pub use scope::HookScope;
