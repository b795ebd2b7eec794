//! Read-only session snapshot for the presentation layer.
//!
//! Captures the fleet, incident ledger, hospitals, and an on-demand
//! analytics report into one serializable struct. Plain data, no behavior.

use bevy::prelude::*;
use serde::Serialize;

use crate::analytics::{self, AnalyticsReport, RankedAmbulance};
use crate::clock::SimClock;
use crate::fleet::Ambulance;
use crate::hospitals::Hospital;
use crate::incidents::Incident;
use crate::TickCounter;

#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionObservation {
    pub tick: u64,
    pub day: u32,
    pub hour: f32,
    pub clock: String,
    pub ambulances: Vec<Ambulance>,
    pub incidents: Vec<Incident>,
    pub hospitals: Vec<Hospital>,
    pub analytics: AnalyticsReport,
    pub ranking: Vec<RankedAmbulance>,
}

/// Build a snapshot of the current world state.
pub fn observe(world: &mut World) -> SessionObservation {
    let mut query = world.query::<&Ambulance>();
    let mut ambulances: Vec<Ambulance> = query.iter(world).cloned().collect();
    ambulances.sort_by(|a, b| a.id.cmp(&b.id));

    let incidents: Vec<Incident> = world
        .resource::<crate::incidents::IncidentLedger>()
        .incidents
        .clone();
    let hospitals = world
        .resource::<crate::hospitals::HospitalDirectory>()
        .hospitals
        .clone();
    let clock = world.resource::<SimClock>().clone();
    let tick = world.resource::<TickCounter>().0;

    let analytics = analytics::calculate_analytics(&ambulances, &incidents);
    let ranking = analytics::ambulance_ranking(&analytics);

    SessionObservation {
        tick,
        day: clock.day,
        hour: clock.hour,
        clock: clock.formatted(),
        ambulances,
        incidents,
        hospitals,
        analytics,
        ranking,
    }
}
