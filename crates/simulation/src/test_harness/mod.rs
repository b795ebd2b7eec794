//! # TestSession — headless integration test harness
//!
//! Wraps `bevy::app::App` + `SimulationPlugin` for running integration tests
//! without a window: build a session, tick the fixed schedule
//! deterministically, and query/assert on the resulting ECS state.

use std::sync::Arc;

use bevy::app::App;
use bevy::prelude::*;

use crate::dispatch::{
    AdviceRequest, Advisor, AdvisoryError, AdvisoryProvider, BoxFuture, DispatchAdvice,
    IncidentReported,
};
use crate::fleet::Ambulance;
use crate::geo::Location;
use crate::incidents::{IncidentLedger, IncidentPriority};
use crate::params::SimParams;
use crate::routing::{RouteError, RouteProvider, Router};
use crate::world_init::{FixedLocator, Locator};
use crate::SimulationPlugin;

// ---------------------------------------------------------------------------
// Scripted providers
// ---------------------------------------------------------------------------

/// Advisory provider that always answers with the same advice.
pub struct ScriptedAdvisor {
    pub best_vehicle_id: String,
    pub reasoning: String,
}

impl AdvisoryProvider for ScriptedAdvisor {
    fn advise(&self, _request: AdviceRequest) -> BoxFuture<Result<DispatchAdvice, AdvisoryError>> {
        let advice = DispatchAdvice {
            best_vehicle_id: self.best_vehicle_id.clone(),
            reasoning: self.reasoning.clone(),
        };
        Box::pin(async move { Ok(advice) })
    }
}

/// Advisory provider that always fails, forcing the deterministic fallback.
pub struct FailingAdvisor;

impl AdvisoryProvider for FailingAdvisor {
    fn advise(&self, _request: AdviceRequest) -> BoxFuture<Result<DispatchAdvice, AdvisoryError>> {
        Box::pin(async move { Err(AdvisoryError("scripted outage".to_string())) })
    }
}

/// Route provider that always fails, keeping vehicles on straight lines.
pub struct FailingRouter;

impl RouteProvider for FailingRouter {
    fn fetch_route(
        &self,
        _start: Location,
        _end: Location,
    ) -> BoxFuture<Result<Vec<Location>, RouteError>> {
        Box::pin(async move { Err(RouteError("scripted outage".to_string())) })
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// A headless Bevy App wrapping `SimulationPlugin`.
pub struct TestSession {
    pub app: App,
}

impl TestSession {
    /// Session centered on the fixed fallback coordinate.
    pub fn new() -> Self {
        Self::at(crate::config::FALLBACK_CENTER)
    }

    /// Session centered on the given coordinate.
    pub fn at(center: Location) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(Locator(Arc::new(FixedLocator(center))));
        app.add_plugins(SimulationPlugin);
        // Run one update so Startup systems execute and the roster spawns.
        app.update();
        Self { app }
    }

    // -----------------------------------------------------------------------
    // Builders
    // -----------------------------------------------------------------------

    pub fn with_advisor(mut self, provider: impl AdvisoryProvider) -> Self {
        self.app.insert_resource(Advisor(Arc::new(provider)));
        self
    }

    pub fn with_router(mut self, provider: impl RouteProvider) -> Self {
        self.app.insert_resource(Router(Arc::new(provider)));
        self
    }

    pub fn with_params(mut self, tune: impl FnOnce(&mut SimParams)) -> Self {
        let mut params = self.app.world_mut().resource_mut::<SimParams>();
        tune(&mut params);
        self
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Run `n` fixed-update ticks deterministically.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.world_mut().run_schedule(FixedUpdate);
            std::thread::yield_now();
        }
    }

    /// Tick until `predicate` holds, up to `max_ticks`. Returns whether the
    /// predicate was reached.
    pub fn tick_until(&mut self, max_ticks: u32, mut predicate: impl FnMut(&mut Self) -> bool) -> bool {
        for _ in 0..max_ticks {
            if predicate(self) {
                return true;
            }
            self.tick(1);
        }
        predicate(self)
    }

    /// Report an incident through the same event path the app uses.
    pub fn report(&mut self, location: Location, priority: IncidentPriority, description: &str) {
        self.app.world_mut().send_event(IncidentReported {
            location,
            priority,
            description: description.to_string(),
        });
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn ledger(&self) -> &IncidentLedger {
        self.app.world().resource::<IncidentLedger>()
    }

    /// Snapshot of the whole fleet, sorted by unit id.
    pub fn fleet(&mut self) -> Vec<Ambulance> {
        let world = self.app.world_mut();
        let mut query = world.query::<&Ambulance>();
        let mut fleet: Vec<Ambulance> = query.iter(world).cloned().collect();
        fleet.sort_by(|a, b| a.id.cmp(&b.id));
        fleet
    }

    /// Snapshot of one unit by id. Panics when the id is unknown.
    pub fn ambulance(&mut self, id: &str) -> Ambulance {
        let world = self.app.world_mut();
        let mut query = world.query::<&Ambulance>();
        query
            .iter(world)
            .find(|a| a.id == id)
            .cloned()
            .unwrap_or_else(|| panic!("no ambulance {id}"))
    }

    /// Mutate one unit in place (test setup only).
    pub fn edit_ambulance(&mut self, id: &str, edit: impl FnOnce(&mut Ambulance)) {
        let world = self.app.world_mut();
        let mut query = world.query::<&mut Ambulance>();
        if let Some(mut amb) = query.iter_mut(world).find(|a| a.id == id) {
            edit(&mut amb);
        } else {
            panic!("no ambulance {id}");
        }
    }
}
