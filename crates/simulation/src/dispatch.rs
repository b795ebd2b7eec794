//! Dispatch assignment policy.
//!
//! Selection composes two strategies: an external advisory provider (an
//! unreliable network dependency, consumed as an opaque request/response
//! contract) and a deterministic nearest-vehicle fallback. The advisory
//! answer is never trusted: its vehicle id must be a member of the candidate
//! set, and any provider failure or invalid id falls through to the fallback
//! computed from the same candidates. Dispatch therefore always succeeds
//! deterministically whenever vehicles exist.
//!
//! The advisory call runs on the `AsyncComputeTaskPool` and is polled each
//! tick; the tick loop never blocks on it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::{block_on, AsyncComputeTaskPool, Task};
use serde::{Deserialize, Serialize};

use crate::clock::SimClock;
use crate::fleet::{Ambulance, AmbulanceStatus, VehicleType};
use crate::geo::{self, Location};
use crate::incidents::{IncidentLedger, IncidentPriority, IncidentStatus};
use crate::params::SimParams;
use crate::simulation_sets::SimulationSet;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

// ---------------------------------------------------------------------------
// Advisory provider contract
// ---------------------------------------------------------------------------

/// A candidate unit as exposed to the advisory provider. Only identity,
/// position, and capability tier leak out; no internal fleet state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateUnit {
    pub id: String,
    pub location: Location,
    pub vehicle_type: VehicleType,
}

impl From<&Ambulance> for CandidateUnit {
    fn from(amb: &Ambulance) -> Self {
        Self {
            id: amb.id.clone(),
            location: amb.location,
            vehicle_type: amb.vehicle_type,
        }
    }
}

/// Request sent to the advisory provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdviceRequest {
    pub incident_location: Location,
    pub incident_priority: IncidentPriority,
    pub incident_description: String,
    pub candidates: Vec<CandidateUnit>,
}

/// The provider's answer: its chosen unit and free-text reasoning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchAdvice {
    pub best_vehicle_id: String,
    pub reasoning: String,
}

/// Provider-side failure (timeout, malformed response, transport error).
/// Never surfaced to the caller; always recovered by the fallback.
#[derive(Debug, Clone)]
pub struct AdvisoryError(pub String);

impl std::fmt::Display for AdvisoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "advisory provider unavailable: {}", self.0)
    }
}

impl std::error::Error for AdvisoryError {}

/// External decision-support service consulted for vehicle selection.
pub trait AdvisoryProvider: Send + Sync + 'static {
    fn advise(&self, request: AdviceRequest) -> BoxFuture<Result<DispatchAdvice, AdvisoryError>>;
}

/// Built-in stand-in for the remote decision provider. Applies the same
/// criteria a remote provider is asked to use: proximity first, with an ALS
/// preference for Critical/High incidents when one is available nearby,
/// under an assumption of uniform traffic.
pub struct HeuristicAdvisor;

/// An ALS unit is preferred for urgent incidents when it is at most this
/// factor farther than the overall closest unit.
const ALS_PREFERENCE_FACTOR: f64 = 1.5;

impl AdvisoryProvider for HeuristicAdvisor {
    fn advise(&self, request: AdviceRequest) -> BoxFuture<Result<DispatchAdvice, AdvisoryError>> {
        Box::pin(async move {
            let nearest = request
                .candidates
                .iter()
                .min_by(|a, b| {
                    let da = geo::distance_km(a.location, request.incident_location);
                    let db = geo::distance_km(b.location, request.incident_location);
                    da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                })
                .ok_or_else(|| AdvisoryError("no candidates supplied".to_string()))?;
            let nearest_dist = geo::distance_km(nearest.location, request.incident_location);

            let urgent = matches!(
                request.incident_priority,
                IncidentPriority::Critical | IncidentPriority::High
            );
            if urgent && nearest.vehicle_type != VehicleType::Als {
                let nearest_als = request
                    .candidates
                    .iter()
                    .filter(|c| c.vehicle_type == VehicleType::Als)
                    .min_by(|a, b| {
                        let da = geo::distance_km(a.location, request.incident_location);
                        let db = geo::distance_km(b.location, request.incident_location);
                        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                    });
                if let Some(als) = nearest_als {
                    let als_dist = geo::distance_km(als.location, request.incident_location);
                    if als_dist <= nearest_dist * ALS_PREFERENCE_FACTOR {
                        return Ok(DispatchAdvice {
                            best_vehicle_id: als.id.clone(),
                            reasoning: format!(
                                "{} is the closest {} unit ({:.1} km) for a {} priority incident",
                                als.id,
                                als.vehicle_type.label(),
                                als_dist,
                                request.incident_priority.label()
                            ),
                        });
                    }
                }
            }

            Ok(DispatchAdvice {
                best_vehicle_id: nearest.id.clone(),
                reasoning: format!(
                    "{} is the closest unit at {:.1} km",
                    nearest.id, nearest_dist
                ),
            })
        })
    }
}

/// The advisory provider in use for this session.
#[derive(Resource)]
pub struct Advisor(pub Arc<dyn AdvisoryProvider>);

impl Default for Advisor {
    fn default() -> Self {
        Self(Arc::new(HeuristicAdvisor))
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelectionSource {
    Advisory,
    Fallback,
}

/// A completed vehicle selection and its rationale.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub vehicle_id: String,
    pub rationale: String,
    pub source: SelectionSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    NoVehiclesAvailable,
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::NoVehiclesAvailable => write!(f, "no vehicles available for dispatch"),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Deterministic strategy: candidates sorted ascending by haversine distance
/// to the incident, ties broken by list order, first one wins.
pub fn fallback_selection(
    incident_location: Location,
    candidates: &[CandidateUnit],
) -> Result<Selection, DispatchError> {
    if candidates.is_empty() {
        return Err(DispatchError::NoVehiclesAvailable);
    }
    let mut sorted: Vec<&CandidateUnit> = candidates.iter().collect();
    sorted.sort_by(|a, b| {
        let da = geo::distance_km(a.location, incident_location);
        let db = geo::distance_km(b.location, incident_location);
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    });
    let best = sorted[0];
    Ok(Selection {
        vehicle_id: best.id.clone(),
        rationale: format!(
            "Advisory dispatch unavailable. Fallback: dispatched closest unit ({}).",
            best.id
        ),
        source: SelectionSource::Fallback,
    })
}

/// Combine an advisory outcome with the fallback strategy.
///
/// The advisory choice is used only when the provider succeeded and its id
/// is a member of the candidate set; everything else falls back.
pub fn resolve_selection(
    advice: Result<DispatchAdvice, AdvisoryError>,
    incident_location: Location,
    candidates: &[CandidateUnit],
) -> Result<Selection, DispatchError> {
    match advice {
        Ok(advice) if candidates.iter().any(|c| c.id == advice.best_vehicle_id) => {
            Ok(Selection {
                vehicle_id: advice.best_vehicle_id,
                rationale: advice.reasoning,
                source: SelectionSource::Advisory,
            })
        }
        Ok(advice) => {
            warn!(
                "advisory chose {} which is not a candidate; using fallback",
                advice.best_vehicle_id
            );
            fallback_selection(incident_location, candidates)
        }
        Err(e) => {
            warn!("{e}; using fallback");
            fallback_selection(incident_location, candidates)
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A new emergency report entering the system (manual or scenario-generated).
#[derive(Event, Debug, Clone)]
pub struct IncidentReported {
    pub location: Location,
    pub priority: IncidentPriority,
    pub description: String,
}

/// Lifecycle notifications for the presentation layer.
#[derive(Event, Debug, Clone)]
pub enum DispatchEvent {
    Reported {
        incident_id: String,
        priority: IncidentPriority,
    },
    Assigned {
        incident_id: String,
        vehicle_id: String,
        eta_minutes: u32,
        rationale: String,
        source: SelectionSource,
    },
    /// Selection failed with no vehicles available; the incident stays
    /// `Pending` and visible as unassigned.
    Unassigned { incident_id: String },
    OnScene {
        incident_id: String,
        vehicle_id: String,
    },
    Resolved {
        incident_id: String,
        vehicle_id: String,
    },
}

// ---------------------------------------------------------------------------
// Async orchestration
// ---------------------------------------------------------------------------

/// An advisory request in flight. The candidate snapshot is kept so the
/// fallback ranks exactly the units the provider was asked about.
pub struct AdviceTask {
    pub incident_id: String,
    pub incident_location: Location,
    pub candidates: Vec<CandidateUnit>,
    pub task: Task<Result<DispatchAdvice, AdvisoryError>>,
}

/// Advisory requests awaiting their provider's answer.
#[derive(Resource, Default)]
pub struct PendingDecisions {
    pub tasks: Vec<AdviceTask>,
}

/// Record each reported incident as `Pending` and, when any vehicle is
/// available, send the advisory request off to the task pool.
pub fn intake_reported_incidents(
    clock: Res<SimClock>,
    advisor: Res<Advisor>,
    mut ledger: ResMut<IncidentLedger>,
    mut pending: ResMut<PendingDecisions>,
    mut reports: EventReader<IncidentReported>,
    mut events: EventWriter<DispatchEvent>,
    fleet: Query<&Ambulance>,
) {
    for report in reports.read() {
        let incident_id = ledger.report(
            report.location,
            report.priority,
            report.description.clone(),
            clock.timestamp_minutes(),
        );
        events.send(DispatchEvent::Reported {
            incident_id: incident_id.clone(),
            priority: report.priority,
        });

        let candidates: Vec<CandidateUnit> = fleet
            .iter()
            .filter(|a| a.is_available())
            .map(CandidateUnit::from)
            .collect();
        if candidates.is_empty() {
            warn!("{incident_id}: no vehicles available; incident stays pending");
            events.send(DispatchEvent::Unassigned {
                incident_id: incident_id.clone(),
            });
            continue;
        }

        let request = AdviceRequest {
            incident_location: report.location,
            incident_priority: report.priority,
            incident_description: report.description.clone(),
            candidates: candidates.clone(),
        };
        let task = AsyncComputeTaskPool::get().spawn(advisor.0.advise(request));
        pending.tasks.push(AdviceTask {
            incident_id,
            incident_location: report.location,
            candidates,
            task,
        });
    }
}

/// Poll in-flight advisory tasks and apply completed decisions.
///
/// Because the fleet kept moving while the provider thought, the candidate
/// snapshot is re-filtered against current availability before validation;
/// a decision whose incident is no longer `Pending` is dropped as stale.
pub fn apply_advisory_decisions(
    params: Res<SimParams>,
    mut pending: ResMut<PendingDecisions>,
    mut ledger: ResMut<IncidentLedger>,
    mut events: EventWriter<DispatchEvent>,
    mut fleet: Query<&mut Ambulance>,
) {
    let mut i = 0;
    while i < pending.tasks.len() {
        let Some(result) = block_on(futures_lite::future::poll_once(&mut pending.tasks[i].task))
        else {
            i += 1;
            continue;
        };
        let AdviceTask {
            incident_id,
            incident_location,
            candidates,
            ..
        } = pending.tasks.swap_remove(i);

        if ledger.get(&incident_id).map(|inc| inc.status) != Some(IncidentStatus::Pending) {
            continue;
        }

        let still_available: Vec<CandidateUnit> = candidates
            .into_iter()
            .filter(|c| fleet.iter().any(|a| a.id == c.id && a.is_available()))
            .collect();

        let selection = match resolve_selection(result, incident_location, &still_available) {
            Ok(selection) => selection,
            Err(DispatchError::NoVehiclesAvailable) => {
                warn!("{incident_id}: every candidate became busy; incident stays pending");
                events.send(DispatchEvent::Unassigned { incident_id });
                continue;
            }
        };

        let Some(mut amb) = fleet.iter_mut().find(|a| a.id == selection.vehicle_id) else {
            continue;
        };
        let eta_minutes = geo::eta_minutes(
            geo::distance_km(amb.location, incident_location),
            params.eta_speed_kmh,
        );
        if !ledger.assign(&incident_id, &amb.id, eta_minutes) {
            continue;
        }
        amb.status = AmbulanceStatus::EnRoute;
        amb.destination = Some(incident_location);
        amb.assigned_incident = Some(incident_id.clone());
        amb.route_path.clear();

        info!(
            "{} dispatched to {} ({:?}, ETA {} min)",
            amb.id, incident_id, selection.source, eta_minutes
        );
        events.send(DispatchEvent::Assigned {
            incident_id,
            vehicle_id: amb.id.clone(),
            eta_minutes,
            rationale: selection.rationale,
            source: selection.source,
        });
    }
}

/// Drain lifecycle events into the log. The presentation layer consumes the
/// same events for its notification stream.
pub fn log_dispatch_events(mut events: EventReader<DispatchEvent>) {
    for event in events.read() {
        match event {
            DispatchEvent::Reported {
                incident_id,
                priority,
            } => info!("incident {incident_id} reported ({})", priority.label()),
            DispatchEvent::Assigned {
                incident_id,
                vehicle_id,
                eta_minutes,
                ..
            } => info!(
                "{vehicle_id} assigned to {incident_id}: {}",
                geo::eta_description(*eta_minutes)
            ),
            DispatchEvent::Unassigned { incident_id } => {
                warn!("incident {incident_id} has no assigned unit")
            }
            DispatchEvent::OnScene {
                incident_id,
                vehicle_id,
            } => info!("{vehicle_id} on scene at {incident_id}"),
            DispatchEvent::Resolved {
                incident_id,
                vehicle_id,
            } => info!("{incident_id} resolved by {vehicle_id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct DispatchPlugin;

impl Plugin for DispatchPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<IncidentReported>()
            .add_event::<DispatchEvent>()
            .init_resource::<PendingDecisions>()
            .init_resource::<Advisor>()
            .add_systems(
                FixedUpdate,
                (intake_reported_incidents, apply_advisory_decisions)
                    .chain()
                    .in_set(SimulationSet::Simulation),
            )
            .add_systems(
                FixedUpdate,
                log_dispatch_events.in_set(SimulationSet::PostSim),
            );
    }
}
