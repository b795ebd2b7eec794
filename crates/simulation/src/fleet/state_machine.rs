//! Arrival and dwell-expiry transitions for the fleet.
//!
//! `handle_arrivals` fires when an en-route vehicle stands exactly on its
//! destination with no polyline left; `expire_dwell_timers` fires the
//! deferred scene/hospital transitions. The incident ledger mirrors every
//! vehicle transition through its own guarded operations, so ledger state
//! can never skip ahead of or regress behind the fleet.

use bevy::prelude::*;

use crate::clock::SimClock;
use crate::dispatch::DispatchEvent;
use crate::hospitals::HospitalDirectory;
use crate::incidents::IncidentLedger;
use crate::params::SimParams;
use crate::routing::RouteRequests;

use super::dwell::{DwellKind, DwellTimers};
use super::{Ambulance, AmbulanceStatus};

/// Transition vehicles that have reached their destination.
///
/// A destination with the incident reference still set is the scene
/// (`EnRoute → Busy`, scene dwell scheduled); without it, the hospital
/// (`EnRoute → AtHospital`, drop-off dwell scheduled, incident resolved).
/// While `route_path` is non-empty the vehicle is still mid-polyline and a
/// straight-line position coincidence must not short-circuit the leg.
pub fn handle_arrivals(
    params: Res<SimParams>,
    clock: Res<SimClock>,
    mut dwell: ResMut<DwellTimers>,
    mut ledger: ResMut<IncidentLedger>,
    mut routes: ResMut<RouteRequests>,
    mut events: EventWriter<DispatchEvent>,
    mut query: Query<(Entity, &mut Ambulance)>,
) {
    for (entity, mut amb) in &mut query {
        if amb.status != AmbulanceStatus::EnRoute {
            continue;
        }
        let Some(destination) = amb.destination else {
            continue;
        };
        if !amb.route_path.is_empty() || amb.location != destination {
            continue;
        }

        // The leg is over; drop any in-flight or failed route state for it.
        routes.forget_vehicle(entity);

        if amb.assigned_incident.is_some() {
            amb.status = AmbulanceStatus::Busy;
            amb.destination = None;
            dwell.schedule(entity, DwellKind::Scene, params.scene_dwell_ticks);
            if let Some(incident_id) = ledger.mark_on_scene(&amb.id) {
                info!("{} on scene at {}", amb.id, incident_id);
                events.send(DispatchEvent::OnScene {
                    incident_id,
                    vehicle_id: amb.id.clone(),
                });
            }
        } else {
            amb.status = AmbulanceStatus::AtHospital;
            amb.destination = None;
            dwell.schedule(entity, DwellKind::Hospital, params.hospital_dwell_ticks);
            if let Some(incident_id) =
                ledger.resolve_for_vehicle(&amb.id, clock.timestamp_minutes())
            {
                info!("{} completed drop-off for {}", amb.id, incident_id);
                events.send(DispatchEvent::Resolved {
                    incident_id,
                    vehicle_id: amb.id.clone(),
                });
            }
        }
    }
}

/// Fire expired dwell timers.
///
/// Scene expiry hands the incident off and sends the vehicle to the nearest
/// hospital by planar distance; hospital expiry returns it to service. A
/// timer whose vehicle has meanwhile left the expected status is stale and
/// ignored.
pub fn expire_dwell_timers(
    hospitals: Res<HospitalDirectory>,
    mut dwell: ResMut<DwellTimers>,
    mut query: Query<(Entity, &mut Ambulance)>,
) {
    for (vehicle, kind) in dwell.tick_expired() {
        let Ok((_, mut amb)) = query.get_mut(vehicle) else {
            continue;
        };
        match kind {
            DwellKind::Scene => {
                if amb.status != AmbulanceStatus::Busy {
                    continue;
                }
                amb.assigned_incident = None;
                amb.route_path.clear();
                match hospitals.nearest(amb.location) {
                    Some(hospital) => {
                        amb.status = AmbulanceStatus::EnRoute;
                        amb.destination = Some(hospital.location);
                        info!("{} transporting to {}", amb.id, hospital.name);
                    }
                    None => {
                        warn!("no hospitals configured; {} returning to service", amb.id);
                        amb.status = AmbulanceStatus::Available;
                        amb.destination = None;
                    }
                }
            }
            DwellKind::Hospital => {
                if amb.status != AmbulanceStatus::AtHospital {
                    continue;
                }
                amb.status = AmbulanceStatus::Available;
                amb.destination = None;
                amb.assigned_incident = None;
                info!("{} back in service", amb.id);
            }
        }
    }
}
