//! Wall-clock timers owned by each solver.

#[allow(clippy::module_inception)]
mod timers;
pub use timers::*;
