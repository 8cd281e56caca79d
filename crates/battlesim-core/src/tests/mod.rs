//! Crate-level tests that run whole battles.
//!
//! - **Scenario tests**: hand-checked PvE and PvP runs
//! - **Determinism tests**: same seed, same result, regardless of threads
//! - **Property tests**: bounds that must hold for any input
//!
//! # Test Structure
//!
//! - `scenarios.rs`: end-to-end runs with known outcomes
//! - `determinism.rs`: reproducibility of single and aggregated runs
//! - `properties.rs`: proptest suites for energy, stages, damage and strategies
//! - `helpers.rs`: game-master and combatant factories

mod determinism;
mod helpers;
mod properties;

// Re-export for convenience
pub use helpers::*;
