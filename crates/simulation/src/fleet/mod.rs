//! Fleet state: the `Ambulance` component and the tick-driven systems that
//! move vehicles and advance their status lifecycle.
//!
//! Status lifecycle: `Available → EnRoute (to incident) → Busy (on scene)
//! → EnRoute (to hospital) → AtHospital → Available`. `Busy` means strictly
//! "dwelling at the scene"; the hospital-bound transport leg is a second
//! `EnRoute` phase with the incident reference already handed off.

pub mod dwell;
mod motion;
mod state_machine;

pub use motion::advance_ambulances;
pub use state_machine::{expire_dwell_timers, handle_arrivals};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::geo::Location;
use crate::simulation_sets::SimulationSet;
use dwell::DwellTimers;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmbulanceStatus {
    Available,
    #[serde(rename = "En Route")]
    EnRoute,
    Busy,
    #[serde(rename = "At Hospital")]
    AtHospital,
}

/// Capability tier of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    #[serde(rename = "ALS")]
    Als,
    #[serde(rename = "BLS")]
    Bls,
}

impl VehicleType {
    pub fn label(self) -> &'static str {
        match self {
            VehicleType::Als => "Advanced Life Support",
            VehicleType::Bls => "Basic Life Support",
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// A dispatchable response unit. Created once at fleet bootstrap, mutated
/// every tick by the fleet systems, never despawned during a session.
#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct Ambulance {
    pub id: String,
    pub location: Location,
    pub status: AmbulanceStatus,
    pub vehicle_type: VehicleType,
    /// Total patient capacity. Advisory data only; never an assignment
    /// constraint.
    pub capacity: u32,
    pub current_patients: u32,
    pub destination: Option<Location>,
    /// Back-reference to the incident currently being responded to. Cleared
    /// at scene departure (hand-off), so the hospital leg carries none.
    pub assigned_incident: Option<String>,
    /// Road polyline currently being followed; empty means straight-line
    /// fallback.
    pub route_path: Vec<Location>,
}

impl Ambulance {
    pub fn new(id: impl Into<String>, location: Location, vehicle_type: VehicleType) -> Self {
        let capacity = match vehicle_type {
            VehicleType::Als => 2,
            VehicleType::Bls => 1,
        };
        Self {
            id: id.into(),
            location,
            status: AmbulanceStatus::Available,
            vehicle_type,
            capacity,
            current_patients: 0,
            destination: None,
            assigned_incident: None,
            route_path: Vec::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == AmbulanceStatus::Available
    }
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct FleetPlugin;

impl Plugin for FleetPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DwellTimers>();
        app.add_systems(
            FixedUpdate,
            (advance_ambulances, handle_arrivals, expire_dwell_timers)
                .chain()
                .after(crate::routing::collect_route_results)
                .in_set(SimulationSet::Simulation),
        );
    }
}
