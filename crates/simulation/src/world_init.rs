//! Session bootstrap: resolve the session center from a one-shot
//! geolocation source, then spawn the fixed ambulance roster and hospital
//! directory around it.

use std::sync::Arc;

use bevy::prelude::*;

use crate::config::{FALLBACK_CENTER, HOSPITAL_OFFSET_DEG, ROSTER_OFFSET_DEG};
use crate::fleet::{Ambulance, AmbulanceStatus, VehicleType};
use crate::geo::Location;
use crate::hospitals::{Hospital, HospitalDirectory};

/// One-shot geolocation source, consumed once at session start.
pub trait SessionLocator: Send + Sync + 'static {
    /// The session center, or `None` on failure (triggers the fixed
    /// fallback coordinate).
    fn locate(&self) -> Option<Location>;
}

/// A locator that always reports the given coordinate.
pub struct FixedLocator(pub Location);

impl SessionLocator for FixedLocator {
    fn locate(&self) -> Option<Location> {
        Some(self.0)
    }
}

/// The locator in use for this session. Defaults to failing over to
/// [`FALLBACK_CENTER`].
#[derive(Resource)]
pub struct Locator(pub Arc<dyn SessionLocator>);

struct NoLocation;

impl SessionLocator for NoLocation {
    fn locate(&self) -> Option<Location> {
        None
    }
}

impl Default for Locator {
    fn default() -> Self {
        Self(Arc::new(NoLocation))
    }
}

/// Resolved session center; everything is laid out relative to it.
#[derive(Resource, Debug, Clone, Copy)]
pub struct SessionCenter(pub Location);

/// The fixed roster spawned around a center. One ALS unit is deliberately
/// seeded `AtHospital` so every lifecycle path is live from the start.
pub fn roster_around(center: Location) -> Vec<Ambulance> {
    let o = ROSTER_OFFSET_DEG;
    let at = |lat: f64, lng: f64| Location::new(center.lat + lat, center.lng + lng);
    let mut roster = vec![
        Ambulance::new("AMB-001", at(o, 0.0), VehicleType::Als),
        Ambulance::new("AMB-002", at(0.0, o), VehicleType::Bls),
        Ambulance::new("AMB-003", at(-o, 0.0), VehicleType::Als),
        Ambulance::new("AMB-004", at(0.0, -o), VehicleType::Bls),
        Ambulance::new("AMB-005", at(o / 2.0, o / 2.0), VehicleType::Als),
        Ambulance::new("AMB-006", at(-o / 2.0, -o / 2.0), VehicleType::Als),
    ];
    roster[2].status = AmbulanceStatus::AtHospital;
    roster
}

/// The two session hospitals laid out around a center.
pub fn hospitals_around(center: Location) -> Vec<Hospital> {
    let o = HOSPITAL_OFFSET_DEG;
    vec![
        Hospital {
            id: "H-001".to_string(),
            name: "General Hospital".to_string(),
            location: Location::new(center.lat + o, center.lng - o / 2.0),
            total_beds: 50,
            available_beds: 35,
        },
        Hospital {
            id: "H-002".to_string(),
            name: "City Medical Center".to_string(),
            location: Location::new(center.lat - o, center.lng + o / 2.0),
            total_beds: 40,
            available_beds: 28,
        },
    ]
}

/// Startup: resolve the center, spawn the roster, fill the directory.
pub fn init_session(mut commands: Commands, locator: Res<Locator>) {
    let center = match locator.0.locate() {
        Some(center) => center,
        None => {
            warn!(
                "geolocation unavailable; using fallback center {:.4},{:.4}",
                FALLBACK_CENTER.lat, FALLBACK_CENTER.lng
            );
            FALLBACK_CENTER
        }
    };

    for ambulance in roster_around(center) {
        commands.spawn(ambulance);
    }
    commands.insert_resource(HospitalDirectory {
        hospitals: hospitals_around(center),
    });
    commands.insert_resource(SessionCenter(center));
    info!("session initialized at {:.4},{:.4}", center.lat, center.lng);
}

pub struct SessionPlugin;

impl Plugin for SessionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Locator>()
            .init_resource::<HospitalDirectory>()
            .add_systems(Startup, init_session);
    }
}
