//! Aggregate reporting over the incident ledger and fleet.
//!
//! Everything here is pure and recomputed on demand from the full incident
//! and vehicle lists; there is no incremental state to keep consistent with
//! the simulation.

use serde::Serialize;

use crate::clock::hour_of_timestamp;
use crate::fleet::Ambulance;
use crate::incidents::Incident;

/// Hotspot grid cell edge, degrees (~5.5 km at the equator).
pub const HEATMAP_CELL_DEG: f64 = 0.05;

/// Ranking weights: resolution 50%, response time 30%, utilization 20%.
const RANK_RESOLUTION_WEIGHT: f64 = 50.0;
const RANK_RESPONSE_WEIGHT: f64 = 30.0;
const RANK_UTILIZATION_WEIGHT: f64 = 20.0;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalyticsReport {
    pub total_incidents: usize,
    pub resolved_incidents: usize,
    /// Mean recorded ETA, minutes.
    pub average_response_time: f64,
    /// Resolved or archived over total, percent.
    pub incident_resolution_rate: f64,
    /// Incidents with an assigned unit over total, percent.
    pub dispatch_efficiency: f64,
    /// Mean report-to-resolution span, minutes.
    pub average_incident_duration: f64,
    pub by_ambulance: Vec<AmbulanceMetrics>,
    pub peak_hours: Vec<PeakHour>,
    pub incident_heatmap: Vec<HeatmapPoint>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AmbulanceMetrics {
    pub ambulance_id: String,
    pub total_dispatches: usize,
    pub average_response_time: f64,
    pub incidents_resolved: usize,
    /// This unit's dispatches over total incidents, percent.
    pub utilization_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PeakHour {
    /// Hour of day, 0-23.
    pub hour: u32,
    pub incident_count: usize,
    pub average_response_time: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HeatmapPoint {
    /// Cell center latitude.
    pub lat: f64,
    /// Cell center longitude.
    pub lng: f64,
    /// Cell count normalized by the busiest cell, 0-1.
    pub intensity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedAmbulance {
    pub ambulance_id: String,
    pub score: f64,
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Compute the full report from the current fleet and incident lists.
pub fn calculate_analytics(ambulances: &[Ambulance], incidents: &[Incident]) -> AnalyticsReport {
    let total_incidents = incidents.len();
    let resolved_incidents = incidents.iter().filter(|i| i.is_closed()).count();
    let dispatched_incidents = incidents
        .iter()
        .filter(|i| i.assigned_ambulance_id.is_some())
        .count();

    let etas: Vec<f64> = incidents
        .iter()
        .filter_map(|i| i.eta_minutes)
        .map(f64::from)
        .collect();
    let average_response_time = mean(&etas);

    let incident_resolution_rate = percentage(resolved_incidents, total_incidents);
    let dispatch_efficiency = percentage(dispatched_incidents, total_incidents);

    let durations: Vec<f64> = incidents
        .iter()
        .filter(|i| i.is_closed())
        .filter_map(|i| i.resolved_at_min.map(|r| r - i.created_at_min))
        .collect();
    let average_incident_duration = mean(&durations);

    let by_ambulance = ambulances
        .iter()
        .map(|amb| {
            let assigned: Vec<&Incident> = incidents
                .iter()
                .filter(|i| i.assigned_ambulance_id.as_deref() == Some(amb.id.as_str()))
                .collect();
            let resolved = assigned.iter().filter(|i| i.is_closed()).count();
            let etas: Vec<f64> = assigned
                .iter()
                .filter_map(|i| i.eta_minutes)
                .map(f64::from)
                .collect();
            AmbulanceMetrics {
                ambulance_id: amb.id.clone(),
                total_dispatches: assigned.len(),
                average_response_time: mean(&etas),
                incidents_resolved: resolved,
                utilization_rate: percentage(assigned.len(), total_incidents),
            }
        })
        .collect();

    AnalyticsReport {
        total_incidents,
        resolved_incidents,
        average_response_time,
        incident_resolution_rate,
        dispatch_efficiency,
        average_incident_duration,
        by_ambulance,
        peak_hours: peak_hour_histogram(incidents),
        incident_heatmap: incident_heatmap(incidents),
    }
}

/// Bucket incidents by hour of day (0-23) with per-bucket mean ETA.
pub fn peak_hour_histogram(incidents: &[Incident]) -> Vec<PeakHour> {
    let mut counts = [0usize; 24];
    let mut eta_sums = [0.0f64; 24];
    let mut eta_counts = [0usize; 24];

    for incident in incidents {
        let hour = hour_of_timestamp(incident.created_at_min) as usize;
        counts[hour] += 1;
        if let Some(eta) = incident.eta_minutes {
            eta_sums[hour] += f64::from(eta);
            eta_counts[hour] += 1;
        }
    }

    (0..24)
        .map(|hour| PeakHour {
            hour: hour as u32,
            incident_count: counts[hour],
            average_response_time: if eta_counts[hour] > 0 {
                eta_sums[hour] / eta_counts[hour] as f64
            } else {
                0.0
            },
        })
        .collect()
}

/// Top five hours by incident count, descending.
pub fn peak_incident_hours(peak_hours: &[PeakHour]) -> Vec<PeakHour> {
    let mut sorted = peak_hours.to_vec();
    sorted.sort_by(|a, b| b.incident_count.cmp(&a.incident_count));
    sorted.truncate(5);
    sorted
}

/// Bucket incident coordinates into fixed 0.05° cells and normalize counts
/// by the busiest cell. The busiest cell always has intensity exactly 1.
pub fn incident_heatmap(incidents: &[Incident]) -> Vec<HeatmapPoint> {
    if incidents.is_empty() {
        return Vec::new();
    }

    let mut cells: Vec<((i64, i64), usize)> = Vec::new();
    for incident in incidents {
        let cell = (
            (incident.location.lat / HEATMAP_CELL_DEG).floor() as i64,
            (incident.location.lng / HEATMAP_CELL_DEG).floor() as i64,
        );
        match cells.iter_mut().find(|(c, _)| *c == cell) {
            Some((_, count)) => *count += 1,
            None => cells.push((cell, 1)),
        }
    }

    let max_count = cells.iter().map(|(_, c)| *c).max().unwrap_or(0);
    cells
        .into_iter()
        .map(|((cell_lat, cell_lng), count)| HeatmapPoint {
            lat: cell_lat as f64 * HEATMAP_CELL_DEG + HEATMAP_CELL_DEG / 2.0,
            lng: cell_lng as f64 * HEATMAP_CELL_DEG + HEATMAP_CELL_DEG / 2.0,
            intensity: if max_count > 0 {
                count as f64 / max_count as f64
            } else {
                0.0
            },
        })
        .collect()
}

/// Cells with intensity above 0.5, sorted descending by intensity.
pub fn high_incident_zones(heatmap: &[HeatmapPoint]) -> Vec<HeatmapPoint> {
    let mut zones: Vec<HeatmapPoint> = heatmap.iter().filter(|p| p.intensity > 0.5).cloned().collect();
    zones.sort_by(|a, b| {
        b.intensity
            .partial_cmp(&a.intensity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    zones
}

/// Rank units: 50% resolution rate, 30% response time (lower is better,
/// 10-minute scale), 20% utilization. Descending, stable ties.
pub fn ambulance_ranking(report: &AnalyticsReport) -> Vec<RankedAmbulance> {
    let mut ranked: Vec<RankedAmbulance> = report
        .by_ambulance
        .iter()
        .map(|amb| {
            let resolution = amb.incidents_resolved as f64 / (amb.total_dispatches.max(1)) as f64;
            let response = ((10.0 - amb.average_response_time) / 10.0).max(0.0);
            let utilization = amb.utilization_rate / 100.0;
            RankedAmbulance {
                ambulance_id: amb.ambulance_id.clone(),
                score: resolution * RANK_RESOLUTION_WEIGHT
                    + response * RANK_RESPONSE_WEIGHT
                    + utilization * RANK_UTILIZATION_WEIGHT,
            }
        })
        .collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    ranked
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
