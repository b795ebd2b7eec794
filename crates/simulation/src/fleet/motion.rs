//! Per-tick motion integration for en-route vehicles.

use bevy::prelude::*;

use crate::params::SimParams;
use crate::route_follower;

use super::{Ambulance, AmbulanceStatus};

/// Advance every `EnRoute` vehicle one step toward its destination.
///
/// With a route polyline the follower drives the step and clears the path on
/// arrival at its final waypoint; the straight-line fallback then closes any
/// residual gap to the destination and snaps exactly onto it. Status
/// transitions key off an empty path plus exact position equality (see
/// `handle_arrivals`), so a stale straight-line coincidence can never
/// short-circuit a leg that still has waypoints.
pub fn advance_ambulances(params: Res<SimParams>, mut query: Query<&mut Ambulance>) {
    let step = params.speed_deg_per_tick;
    for mut amb in &mut query {
        if amb.status != AmbulanceStatus::EnRoute {
            continue;
        }
        let Some(destination) = amb.destination else {
            continue;
        };

        if amb.route_path.is_empty() {
            let (next, _arrived) = route_follower::advance_direct(amb.location, destination, step);
            amb.location = next;
        } else {
            let adv = route_follower::advance_along(amb.location, &amb.route_path, step);
            amb.location = adv.position;
            amb.route_path = if adv.arrived { Vec::new() } else { adv.remaining };
        }
    }
}
