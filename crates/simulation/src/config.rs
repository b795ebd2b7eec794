use crate::geo::Location;

/// Fixed tick rate of the simulation heartbeat.
pub const TICK_HZ: f64 = 10.0;

/// Session center used when no geolocation source is configured or the
/// configured source fails (downtown Los Angeles).
pub const FALLBACK_CENTER: Location = Location {
    lat: 34.0522,
    lng: -118.2437,
};

/// Roster spread around the session center, in degrees (~2 km at the equator).
pub const ROSTER_OFFSET_DEG: f64 = 0.02;

/// Hospital spread around the session center, in degrees (~3 km at the equator).
pub const HOSPITAL_OFFSET_DEG: f64 = 0.03;

/// Decimal places coordinates are rounded to when used as route cache keys
/// (5 decimals is roughly 1 m resolution).
pub const ROUTE_KEY_DECIMALS: u32 = 5;
