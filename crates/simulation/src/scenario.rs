//! Background incident generator.
//!
//! Rolls a spawn chance on a fixed cadence and reports a random incident
//! near the session center through the same `IncidentReported` path manual
//! reports use. Seeded RNG so a scenario replays identically.

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::dispatch::IncidentReported;
use crate::incidents::IncidentPriority;
use crate::simulation_sets::SimulationSet;
use crate::world_init::SessionCenter;
use crate::TickCounter;

const DESCRIPTIONS: [&str; 7] = [
    "Chest pain - possible cardiac event",
    "Traumatic injury - vehicle accident",
    "Difficulty breathing - respiratory distress",
    "Loss of consciousness",
    "Severe allergic reaction",
    "Fall with head injury",
    "Abdominal pain - acute abdomen",
];

#[derive(Resource, Debug, Clone)]
pub struct ScenarioConfig {
    pub running: bool,
    /// Ticks between spawn rolls.
    pub interval_ticks: u64,
    /// Probability of a new incident per roll.
    pub spawn_chance: f64,
    /// Incident scatter around the session center, degrees (~2 km radius).
    pub spread_deg: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            running: false,
            interval_ticks: 50,
            spawn_chance: 0.3,
            spread_deg: 0.02,
        }
    }
}

#[derive(Resource)]
pub struct ScenarioRng(pub ChaCha8Rng);

impl Default for ScenarioRng {
    fn default() -> Self {
        Self(ChaCha8Rng::seed_from_u64(42))
    }
}

/// Roll for a new random incident every `interval_ticks`.
pub fn generate_incidents(
    tick: Res<TickCounter>,
    config: Res<ScenarioConfig>,
    center: Option<Res<SessionCenter>>,
    mut rng: ResMut<ScenarioRng>,
    mut reports: EventWriter<IncidentReported>,
) {
    let Some(center) = center else {
        return;
    };
    if !config.running || !tick.0.is_multiple_of(config.interval_ticks.max(1)) {
        return;
    }
    let rng = &mut rng.0;
    if rng.gen::<f64>() >= config.spawn_chance {
        return;
    }

    let priority = IncidentPriority::ALL[rng.gen_range(0..IncidentPriority::ALL.len())];
    let description = DESCRIPTIONS[rng.gen_range(0..DESCRIPTIONS.len())];
    let location = crate::geo::Location::new(
        center.0.lat + (rng.gen::<f64>() - 0.5) * config.spread_deg,
        center.0.lng + (rng.gen::<f64>() - 0.5) * config.spread_deg,
    );

    reports.send(IncidentReported {
        location,
        priority,
        description: description.to_string(),
    });
}

pub struct ScenarioPlugin;

impl Plugin for ScenarioPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ScenarioConfig>()
            .init_resource::<ScenarioRng>()
            .add_systems(
                FixedUpdate,
                generate_incidents
                    .after(crate::clock::tick_sim_clock)
                    .in_set(SimulationSet::PreSim),
            );
    }
}
