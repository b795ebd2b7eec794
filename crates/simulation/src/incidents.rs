//! Incident lifecycle ledger.
//!
//! Incidents advance strictly `Pending → Dispatched → OnScene → Resolved →
//! Archived`. Every transition is guarded on the expected predecessor
//! status, so tick-driven mirroring of the fleet state machine can never
//! skip or regress a record, and a stale async result degrades to a no-op.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::geo::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IncidentPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl IncidentPriority {
    pub const ALL: [IncidentPriority; 4] = [
        IncidentPriority::Low,
        IncidentPriority::Medium,
        IncidentPriority::High,
        IncidentPriority::Critical,
    ];

    pub fn label(self) -> &'static str {
        match self {
            IncidentPriority::Low => "Low",
            IncidentPriority::Medium => "Medium",
            IncidentPriority::High => "High",
            IncidentPriority::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentStatus {
    Pending,
    Dispatched,
    #[serde(rename = "On Scene")]
    OnScene,
    Resolved,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    pub location: Location,
    pub priority: IncidentPriority,
    pub description: String,
    pub status: IncidentStatus,
    /// Sim-minutes timestamp of the report.
    pub created_at_min: f64,
    pub assigned_ambulance_id: Option<String>,
    /// Computed once at dispatch time; never re-derived as conditions change.
    pub eta_minutes: Option<u32>,
    pub resolved_at_min: Option<f64>,
}

impl Incident {
    pub fn is_closed(&self) -> bool {
        matches!(
            self.status,
            IncidentStatus::Resolved | IncidentStatus::Archived
        )
    }
}

/// Error for the externally-triggered archive operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    UnknownIncident(String),
    NotResolved(String),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::UnknownIncident(id) => write!(f, "unknown incident {id}"),
            LedgerError::NotResolved(id) => {
                write!(f, "incident {id} is not in a resolved state")
            }
        }
    }
}

impl std::error::Error for LedgerError {}

/// Authoritative record of every incident reported this session. Closed
/// incidents are retained for analytics.
#[derive(Resource, Debug, Default)]
pub struct IncidentLedger {
    pub incidents: Vec<Incident>,
    next_seq: u32,
}

impl IncidentLedger {
    /// Record a new incident as `Pending` and return its id.
    pub fn report(
        &mut self,
        location: Location,
        priority: IncidentPriority,
        description: String,
        now_min: f64,
    ) -> String {
        self.next_seq += 1;
        let id = format!("INC-{:05}-{:03}", now_min as u64, self.next_seq);
        self.incidents.push(Incident {
            id: id.clone(),
            location,
            priority,
            description,
            status: IncidentStatus::Pending,
            created_at_min: now_min,
            assigned_ambulance_id: None,
            eta_minutes: None,
            resolved_at_min: None,
        });
        id
    }

    pub fn get(&self, id: &str) -> Option<&Incident> {
        self.incidents.iter().find(|i| i.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Incident> {
        self.incidents.iter_mut().find(|i| i.id == id)
    }

    /// `Pending → Dispatched`, recording the assigned unit and the
    /// one-time ETA. Returns false (and changes nothing) when the incident
    /// is missing or not `Pending`.
    pub fn assign(&mut self, id: &str, ambulance_id: &str, eta_minutes: u32) -> bool {
        match self.get_mut(id) {
            Some(inc) if inc.status == IncidentStatus::Pending => {
                inc.status = IncidentStatus::Dispatched;
                inc.assigned_ambulance_id = Some(ambulance_id.to_string());
                inc.eta_minutes = Some(eta_minutes);
                true
            }
            _ => false,
        }
    }

    /// `Dispatched → OnScene` for the incident assigned to `ambulance_id`.
    /// Returns the incident id when a transition happened.
    pub fn mark_on_scene(&mut self, ambulance_id: &str) -> Option<String> {
        let inc = self.incidents.iter_mut().find(|i| {
            i.status == IncidentStatus::Dispatched
                && i.assigned_ambulance_id.as_deref() == Some(ambulance_id)
        })?;
        inc.status = IncidentStatus::OnScene;
        Some(inc.id.clone())
    }

    /// `OnScene → Resolved` for the incident assigned to `ambulance_id`,
    /// stamping `resolved_at_min`. Returns the incident id when a
    /// transition happened.
    pub fn resolve_for_vehicle(&mut self, ambulance_id: &str, now_min: f64) -> Option<String> {
        let inc = self.incidents.iter_mut().find(|i| {
            i.status == IncidentStatus::OnScene
                && i.assigned_ambulance_id.as_deref() == Some(ambulance_id)
        })?;
        inc.status = IncidentStatus::Resolved;
        inc.resolved_at_min = Some(now_min);
        Some(inc.id.clone())
    }

    /// `Resolved → Archived`. External action; never triggered by the tick.
    pub fn archive(&mut self, id: &str) -> Result<(), LedgerError> {
        match self.get_mut(id) {
            None => Err(LedgerError::UnknownIncident(id.to_string())),
            Some(inc) if inc.status == IncidentStatus::Resolved => {
                inc.status = IncidentStatus::Archived;
                Ok(())
            }
            Some(_) => Err(LedgerError::NotResolved(id.to_string())),
        }
    }

    /// Incidents currently occupying a vehicle (`Dispatched` or `OnScene`).
    pub fn active_for_vehicle(&self, ambulance_id: &str) -> Option<&Incident> {
        self.incidents.iter().find(|i| {
            matches!(
                i.status,
                IncidentStatus::Dispatched | IncidentStatus::OnScene
            ) && i.assigned_ambulance_id.as_deref() == Some(ambulance_id)
        })
    }
}
