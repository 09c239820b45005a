//! Signal computation.
//!
//! Pure, synchronous reductions over already-validated inputs: the
//! Pi-Cycle proximity calculator and the Tier-1 risk classifier. No I/O,
//! no shared state — safe to call concurrently from any number of tasks.

pub mod classifier;
pub mod proximity;
