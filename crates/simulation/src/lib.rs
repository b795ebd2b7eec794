use bevy::prelude::*;

pub mod analytics;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod fleet;
pub mod geo;
pub mod hospitals;
pub mod incidents;
pub mod observation;
pub mod params;
pub mod protocol;
pub mod route_follower;
pub mod routing;
pub mod scenario;
pub mod simulation_sets;
pub mod world_init;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
pub mod test_harness;

pub use simulation_sets::SimulationSet;

// ---------------------------------------------------------------------------
// Core resources
// ---------------------------------------------------------------------------

/// Global tick counter incremented each FixedUpdate.
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

pub fn tick_counter(mut tick: ResMut<TickCounter>) {
    tick.0 = tick.0.wrapping_add(1);
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TickCounter>()
            .init_resource::<incidents::IncidentLedger>()
            .insert_resource(Time::<Fixed>::from_hz(config::TICK_HZ))
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::PreSim,
                    SimulationSet::Simulation,
                    SimulationSet::PostSim,
                )
                    .chain(),
            )
            .add_systems(FixedUpdate, tick_counter.in_set(SimulationSet::PreSim));

        app.add_plugins((
            params::SimParamsPlugin,
            clock::ClockPlugin,
            world_init::SessionPlugin,
            scenario::ScenarioPlugin,
            dispatch::DispatchPlugin,
            routing::RoutingPlugin,
            fleet::FleetPlugin,
        ));
    }
}
