//! Runtime-tunable simulation parameters.
//!
//! Extracts the motion and dwell constants into a single [`SimParams`]
//! resource so integration tests and the app can tune pacing without
//! recompilation.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    /// Motion step per tick, in degrees.
    pub speed_deg_per_tick: f64,
    /// Ticks a vehicle dwells at an incident scene before heading to hospital.
    pub scene_dwell_ticks: u32,
    /// Ticks a vehicle dwells at a hospital before becoming available.
    pub hospital_dwell_ticks: u32,
    /// Assumed speed for ETA computation, km/h.
    pub eta_speed_kmh: f64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            speed_deg_per_tick: 0.0005,
            scene_dwell_ticks: 10,
            hospital_dwell_ticks: 15,
            eta_speed_kmh: crate::geo::AVERAGE_AMBULANCE_SPEED_KMH,
        }
    }
}

pub struct SimParamsPlugin;

impl Plugin for SimParamsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimParams>();
    }
}
