//! Deterministic simulation ordering via `SystemSet` phases.
//!
//! These sets establish a contract for system execution order within the
//! `FixedUpdate` schedule. Plugins place their systems into the appropriate
//! set so that inter-plugin ordering is explicit rather than relying on
//! implicit timing assumptions.
//!
//! ```text
//! PreSim  →  Simulation  →  PostSim
//! ```
//!
//! * **PreSim** – tick counter, sim clock, scenario generator. These set up
//!   per-tick state that the core simulation reads.
//! * **Simulation** – incident intake, advisory decisions, route fetching,
//!   fleet motion and status transitions.
//! * **PostSim** – reporting: dispatch event logging. These only read
//!   simulation state, so downstream consumers (the app protocol loop) can
//!   safely observe their output after the tick.

use bevy::prelude::*;

/// Ordered phases for systems running in the `FixedUpdate` schedule.
///
/// Configured as a chain: `PreSim` → `Simulation` → `PostSim`. Individual
/// plugins use `.in_set(SimulationSet::X)` when registering their systems,
/// adding fine-grained `.after()` constraints within the same phase where
/// a producer/consumer order matters.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Pre-simulation setup: tick counter, sim clock, scenario generator.
    PreSim,
    /// Core simulation: dispatch, routing, motion, status transitions.
    Simulation,
    /// Post-simulation reporting: event drain and logging.
    PostSim,
}
