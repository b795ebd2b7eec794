//! Polyline following: advance a position along an ordered waypoint path by
//! a fixed per-tick step, with leftover step budget carried across legs.
//!
//! When no polyline is available callers use [`advance_direct`], which moves
//! straight at the destination and snaps exactly onto it once the remaining
//! distance is under one step.

use crate::geo::{self, Location};

/// Result of advancing along a waypoint path.
#[derive(Debug, Clone, PartialEq)]
pub struct Advance {
    /// Position after the step.
    pub position: Location,
    /// Waypoints still ahead of the new position.
    pub remaining: Vec<Location>,
    pub arrived: bool,
}

/// Advance `step` degrees along `path` from `current`.
///
/// Fewer than two waypoints means there is no path to follow: arrival is
/// immediate with the position unchanged, signalling the caller to fall back
/// to direct movement. Otherwise the active leg runs from the waypoint
/// nearest to `current` (ties keep the first index) to the one after it. A
/// leg whose remainder fits within the step is consumed fully and the
/// leftover budget recurses onto the shortened list; the list is strictly
/// smaller each call, so the recursion terminates within O(path) steps and
/// the final waypoint is never overshot.
pub fn advance_along(current: Location, path: &[Location], step: f64) -> Advance {
    if path.len() < 2 {
        return Advance {
            position: current,
            remaining: path.to_vec(),
            arrived: true,
        };
    }

    let mut closest = 0;
    let mut closest_dist = f64::INFINITY;
    for (i, wp) in path.iter().enumerate() {
        let d = geo::planar_distance(*wp, current);
        if d < closest_dist {
            closest_dist = d;
            closest = i;
        }
    }

    let leg_end = if closest + 1 < path.len() {
        path[closest + 1]
    } else {
        path[closest]
    };
    let leg_remaining = geo::planar_distance(current, leg_end);

    if leg_remaining <= step {
        // Consume the rest of this leg, carry leftover budget forward.
        let leftover = step - leg_remaining;
        let rest = &path[closest + 1..];
        if rest.is_empty() {
            return Advance {
                position: leg_end,
                remaining: Vec::new(),
                arrived: true,
            };
        }
        return advance_along(leg_end, rest, leftover);
    }

    let position = Location {
        lat: current.lat + (leg_end.lat - current.lat) / leg_remaining * step,
        lng: current.lng + (leg_end.lng - current.lng) / leg_remaining * step,
    };
    Advance {
        position,
        remaining: path.to_vec(),
        arrived: false,
    }
}

/// Straight-line fallback: one step toward `destination`, snapping exactly
/// onto it when closer than one step. Returns the new position and whether
/// the destination was reached.
pub fn advance_direct(current: Location, destination: Location, step: f64) -> (Location, bool) {
    let next = geo::step_toward(current, destination, step);
    (next, next == destination)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wp(lat: f64, lng: f64) -> Location {
        Location::new(lat, lng)
    }

    // ------------------------------------------------------------------
    // Degenerate paths: immediate arrival
    // ------------------------------------------------------------------

    #[test]
    fn test_empty_path_is_immediate_arrival() {
        let adv = advance_along(wp(3.0, 4.0), &[], 10.0);
        assert!(adv.arrived);
        assert_eq!(adv.position, wp(3.0, 4.0), "position must be unchanged");
    }

    #[test]
    fn test_single_waypoint_is_immediate_arrival() {
        let adv = advance_along(wp(0.0, 0.0), &[wp(5.0, 5.0)], 0.1);
        assert!(adv.arrived);
        assert_eq!(adv.position, wp(0.0, 0.0));
    }

    // ------------------------------------------------------------------
    // Walking a 3-waypoint path with step 0.5: arrives on the 4th call
    // ------------------------------------------------------------------

    #[test]
    fn test_three_waypoint_walk_no_overshoot() {
        let path = vec![wp(0.0, 0.0), wp(0.0, 1.0), wp(0.0, 2.0)];
        let mut pos = wp(0.0, 0.0);
        let mut remaining = path;
        let mut arrived = false;

        for call in 1..=4 {
            let adv = advance_along(pos, &remaining, 0.5);
            pos = adv.position;
            remaining = if adv.arrived { Vec::new() } else { adv.remaining };
            arrived = adv.arrived;
            assert!(
                pos.lng <= 2.0 + 1e-12,
                "call {call} overshot the final waypoint: {pos:?}"
            );
            if call < 4 {
                assert!(!arrived, "arrived too early on call {call}");
            }
        }

        assert!(arrived, "must arrive on the 4th advance");
        assert_eq!(pos, wp(0.0, 2.0));
    }

    // ------------------------------------------------------------------
    // Leg carry-over: a step longer than one leg spills into the next
    // ------------------------------------------------------------------

    #[test]
    fn test_step_carries_over_short_legs() {
        // Two 0.1-long legs, step 0.15: ends 0.05 into the second leg.
        let path = vec![wp(0.0, 0.0), wp(0.0, 0.1), wp(0.0, 0.2)];
        let adv = advance_along(wp(0.0, 0.0), &path, 0.15);
        assert!(!adv.arrived);
        assert!((adv.position.lng - 0.15).abs() < 1e-12, "{:?}", adv.position);
    }

    #[test]
    fn test_step_past_end_arrives_at_last_waypoint() {
        let path = vec![wp(0.0, 0.0), wp(0.0, 0.1)];
        let adv = advance_along(wp(0.0, 0.0), &path, 5.0);
        assert!(adv.arrived);
        assert_eq!(adv.position, wp(0.0, 0.1));
    }

    // ------------------------------------------------------------------
    // Nearest-waypoint scan: progress resumes from mid-path positions
    // ------------------------------------------------------------------

    #[test]
    fn test_resumes_from_nearest_waypoint() {
        let path = vec![wp(0.0, 0.0), wp(0.0, 1.0), wp(0.0, 2.0)];
        // Position just past the middle waypoint: active leg is (0,1)→(0,2).
        let adv = advance_along(wp(0.0, 1.02), &path, 0.5);
        assert!(!adv.arrived);
        assert!((adv.position.lng - 1.52).abs() < 1e-9, "{:?}", adv.position);
    }

    // ------------------------------------------------------------------
    // Straight-line fallback: exact snap
    // ------------------------------------------------------------------

    #[test]
    fn test_direct_snaps_exactly_on_destination() {
        let dest = wp(0.0004, 0.0);
        let (next, arrived) = advance_direct(wp(0.0, 0.0), dest, 0.0005);
        assert!(arrived);
        assert_eq!(next, dest, "must snap exactly, not merely near");
    }

    #[test]
    fn test_direct_partial_step_not_arrived() {
        let dest = wp(1.0, 0.0);
        let (next, arrived) = advance_direct(wp(0.0, 0.0), dest, 0.25);
        assert!(!arrived);
        assert!((next.lat - 0.25).abs() < 1e-12);
    }
}
