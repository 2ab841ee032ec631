//! Resource reclaimer: best-effort cleanup of an application's platform
//! resources.
//!
//! This module provides:
//! - Explicit phase selection over the fixed dependency-ordered sweep
//! - Per-phase and per-item failure containment
//! - A report of what was deleted and what failed

mod phases;
mod sweep;
#[cfg(test)]
mod sweep_tests;

pub use phases::{PhaseSet, ReclaimPhase, SWEEP_ORDER};
pub use sweep::{PhaseOutcome, Reclaimer, SweepReport};
