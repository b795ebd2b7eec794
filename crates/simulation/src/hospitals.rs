//! Hospital reference data: static for the session, consulted when a
//! vehicle leaves an incident scene to pick the nearest drop-off point.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::geo::{self, Location};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hospital {
    pub id: String,
    pub name: String,
    pub location: Location,
    pub total_beds: u32,
    pub available_beds: u32,
}

/// All hospitals known to the session. Populated once at bootstrap.
#[derive(Resource, Debug, Clone, Default)]
pub struct HospitalDirectory {
    pub hospitals: Vec<Hospital>,
}

impl HospitalDirectory {
    /// Nearest hospital by planar distance, or `None` when the directory is
    /// empty. Ties keep the first entry.
    pub fn nearest(&self, from: Location) -> Option<&Hospital> {
        let mut best: Option<(&Hospital, f64)> = None;
        for hospital in &self.hospitals {
            let d = geo::planar_distance(hospital.location, from);
            if best.as_ref().is_none_or(|(_, bd)| d < *bd) {
                best = Some((hospital, d));
            }
        }
        best.map(|(h, _)| h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hospital(id: &str, lat: f64, lng: f64) -> Hospital {
        Hospital {
            id: id.to_string(),
            name: format!("{id} Hospital"),
            location: Location::new(lat, lng),
            total_beds: 50,
            available_beds: 35,
        }
    }

    #[test]
    fn test_nearest_picks_closest() {
        let dir = HospitalDirectory {
            hospitals: vec![hospital("H-001", 0.0, 0.0), hospital("H-002", 1.0, 1.0)],
        };
        let near = dir.nearest(Location::new(0.9, 0.9)).unwrap();
        assert_eq!(near.id, "H-002");
    }

    #[test]
    fn test_nearest_empty_directory() {
        let dir = HospitalDirectory::default();
        assert!(dir.nearest(Location::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_nearest_tie_keeps_first() {
        let dir = HospitalDirectory {
            hospitals: vec![hospital("H-001", 0.0, 1.0), hospital("H-002", 1.0, 0.0)],
        };
        let near = dir.nearest(Location::new(0.0, 0.0)).unwrap();
        assert_eq!(near.id, "H-001");
    }
}
