//! Hooks shipped with proctime.

mod test_hook;
mod wallclock;

pub use test_hook::TestHook;
pub use wallclock::WallclockHook;
