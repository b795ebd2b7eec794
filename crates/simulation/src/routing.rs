//! Road-route fetching from an opaque external provider.
//!
//! When a vehicle enters `EnRoute` with an empty polyline, exactly one
//! request per `(vehicle, destination)` pair goes to the provider on the
//! async task pool; until it resolves the vehicle moves in a straight line.
//! Responses are cached by rounded-coordinate leg key so identical legs
//! never hit the provider twice, and a failed leg stays on the straight-line
//! fallback for good. A response landing after the vehicle has moved on to a
//! different destination is dropped.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::{block_on, AsyncComputeTaskPool, Task};

use crate::config::ROUTE_KEY_DECIMALS;
use crate::fleet::{Ambulance, AmbulanceStatus};
use crate::geo::Location;
use crate::simulation_sets::SimulationSet;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

// ---------------------------------------------------------------------------
// Provider contract
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RouteError(pub String);

impl std::fmt::Display for RouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "route provider failed: {}", self.0)
    }
}

impl std::error::Error for RouteError {}

/// External road-routing service: start + end in, ordered waypoints out.
pub trait RouteProvider: Send + Sync + 'static {
    fn fetch_route(&self, start: Location, end: Location)
        -> BoxFuture<Result<Vec<Location>, RouteError>>;
}

/// Built-in stand-in for the road-routing service: a dog-leg polyline
/// through the corner point, which exercises the follower's multi-leg
/// walking without a road network.
pub struct SyntheticRoutes;

impl RouteProvider for SyntheticRoutes {
    fn fetch_route(
        &self,
        start: Location,
        end: Location,
    ) -> BoxFuture<Result<Vec<Location>, RouteError>> {
        Box::pin(async move {
            let corner = Location::new(start.lat, end.lng);
            Ok(vec![start, corner, end])
        })
    }
}

/// The route provider in use for this session.
#[derive(Resource)]
pub struct Router(pub Arc<dyn RouteProvider>);

impl Default for Router {
    fn default() -> Self {
        Self(Arc::new(SyntheticRoutes))
    }
}

// ---------------------------------------------------------------------------
// Request bookkeeping
// ---------------------------------------------------------------------------

/// A coordinate pair rounded for keying (5 decimals ≈ 1 m).
pub type CoordKey = (i64, i64);

/// A full leg key: rounded start + rounded end.
pub type LegKey = (CoordKey, CoordKey);

pub fn coord_key(loc: Location) -> CoordKey {
    let scale = 10f64.powi(ROUTE_KEY_DECIMALS as i32);
    ((loc.lat * scale).round() as i64, (loc.lng * scale).round() as i64)
}

pub fn leg_key(start: Location, end: Location) -> LegKey {
    (coord_key(start), coord_key(end))
}

/// In-flight, cached, and failed route requests.
#[derive(Resource, Default)]
pub struct RouteRequests {
    /// Completed legs by rounded start/end, so identical legs are free.
    pub cache: HashMap<LegKey, Vec<Location>>,
    /// One in-flight request per (vehicle, destination).
    pending: HashMap<(Entity, CoordKey), Task<Result<Vec<Location>, RouteError>>>,
    /// Legs whose fetch failed; those stay on straight-line for good.
    failed: HashSet<(Entity, CoordKey)>,
}

impl RouteRequests {
    pub fn is_pending(&self, vehicle: Entity, destination: Location) -> bool {
        self.pending.contains_key(&(vehicle, coord_key(destination)))
    }

    pub fn has_failed(&self, vehicle: Entity, destination: Location) -> bool {
        self.failed.contains(&(vehicle, coord_key(destination)))
    }

    /// Drop all in-flight and failed state for a vehicle (its leg is over).
    pub fn forget_vehicle(&mut self, vehicle: Entity) {
        self.pending.retain(|(v, _), _| *v != vehicle);
        self.failed.retain(|(v, _)| *v != vehicle);
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Issue route requests for en-route vehicles that have no polyline yet.
pub fn request_routes(
    router: Res<Router>,
    mut requests: ResMut<RouteRequests>,
    mut fleet: Query<(Entity, &mut Ambulance)>,
) {
    for (entity, mut amb) in &mut fleet {
        if amb.status != AmbulanceStatus::EnRoute || !amb.route_path.is_empty() {
            continue;
        }
        let Some(destination) = amb.destination else {
            continue;
        };
        // Already arrived positions never need a route.
        if amb.location == destination {
            continue;
        }
        if requests.is_pending(entity, destination) || requests.has_failed(entity, destination) {
            continue;
        }

        let key = leg_key(amb.location, destination);
        if let Some(cached) = requests.cache.get(&key) {
            amb.route_path = cached.clone();
            continue;
        }

        let task = AsyncComputeTaskPool::get().spawn(
            router.0.fetch_route(amb.location, destination),
        );
        requests
            .pending
            .insert((entity, coord_key(destination)), task);
    }
}

/// Poll in-flight route requests and install completed polylines.
///
/// A polyline is installed only when its vehicle is still `EnRoute` toward
/// the same destination with an empty path; anything else means the answer
/// is stale and only the cache keeps it.
pub fn collect_route_results(
    mut requests: ResMut<RouteRequests>,
    mut fleet: Query<(Entity, &mut Ambulance)>,
) {
    let mut done: Vec<((Entity, CoordKey), Result<Vec<Location>, RouteError>)> = Vec::new();
    requests.pending.retain(|key, task| {
        match block_on(futures_lite::future::poll_once(task)) {
            Some(result) => {
                done.push((*key, result));
                false
            }
            None => true,
        }
    });

    for ((entity, dest_key), result) in done {
        match result {
            Ok(waypoints) => {
                let mut installed = false;
                if let Ok((_, mut amb)) = fleet.get_mut(entity) {
                    let current_dest = amb.destination;
                    if amb.status == AmbulanceStatus::EnRoute
                        && amb.route_path.is_empty()
                        && current_dest.is_some_and(|d| coord_key(d) == dest_key)
                    {
                        if let Some(first) = waypoints.first() {
                            requests
                                .cache
                                .insert(leg_key(*first, waypoints[waypoints.len() - 1]), waypoints.clone());
                        }
                        amb.route_path = waypoints;
                        installed = true;
                    }
                }
                if !installed {
                    // Stale: the vehicle moved on before the provider answered.
                    debug!("dropping stale route result for {entity:?}");
                }
            }
            Err(e) => {
                warn!("{e}; staying on straight-line for this leg");
                requests.failed.insert((entity, dest_key));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct RoutingPlugin;

impl Plugin for RoutingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Router>()
            .init_resource::<RouteRequests>()
            .add_systems(
                FixedUpdate,
                (request_routes, collect_route_results)
                    .chain()
                    .after(crate::dispatch::apply_advisory_decisions)
                    .in_set(SimulationSet::Simulation),
            );
    }
}
