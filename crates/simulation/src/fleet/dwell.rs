//! Cancellable dwell timers, one per vehicle.
//!
//! Scene and hospital dwells are scheduled future transitions keyed by the
//! vehicle entity. Scheduling replaces any pending timer for the same
//! vehicle, so a superseded dwell can never fire a duplicate transition
//! against newer state.

use std::collections::BTreeMap;

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwellKind {
    Scene,
    Hospital,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DwellTimer {
    pub kind: DwellKind,
    pub remaining: u32,
}

/// Registry of pending dwell timers keyed by vehicle entity.
#[derive(Resource, Debug, Default)]
pub struct DwellTimers {
    timers: BTreeMap<Entity, DwellTimer>,
}

impl DwellTimers {
    /// Schedule a dwell for a vehicle, replacing any pending timer for it.
    pub fn schedule(&mut self, vehicle: Entity, kind: DwellKind, ticks: u32) {
        self.timers.insert(
            vehicle,
            DwellTimer {
                kind,
                remaining: ticks.max(1),
            },
        );
    }

    pub fn cancel(&mut self, vehicle: Entity) {
        self.timers.remove(&vehicle);
    }

    pub fn pending(&self, vehicle: Entity) -> Option<DwellTimer> {
        self.timers.get(&vehicle).copied()
    }

    /// Decrement every pending timer by one tick, removing and returning
    /// the ones that expired.
    pub fn tick_expired(&mut self) -> Vec<(Entity, DwellKind)> {
        let mut expired = Vec::new();
        self.timers.retain(|vehicle, timer| {
            timer.remaining -= 1;
            if timer.remaining == 0 {
                expired.push((*vehicle, timer.kind));
                false
            } else {
                true
            }
        });
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_expires_after_scheduled_ticks() {
        let mut timers = DwellTimers::default();
        let v = Entity::from_raw(1);
        timers.schedule(v, DwellKind::Scene, 3);

        assert!(timers.tick_expired().is_empty());
        assert!(timers.tick_expired().is_empty());
        assert_eq!(timers.tick_expired(), vec![(v, DwellKind::Scene)]);
        assert!(timers.pending(v).is_none());
    }

    #[test]
    fn test_reschedule_replaces_pending_timer() {
        let mut timers = DwellTimers::default();
        let v = Entity::from_raw(1);
        timers.schedule(v, DwellKind::Scene, 1);
        timers.schedule(v, DwellKind::Hospital, 2);

        // The superseded scene timer must not fire.
        assert!(timers.tick_expired().is_empty());
        assert_eq!(timers.tick_expired(), vec![(v, DwellKind::Hospital)]);
    }

    #[test]
    fn test_cancel_removes_timer() {
        let mut timers = DwellTimers::default();
        let v = Entity::from_raw(7);
        timers.schedule(v, DwellKind::Hospital, 1);
        timers.cancel(v);
        assert!(timers.tick_expired().is_empty());
    }

    #[test]
    fn test_zero_tick_schedule_fires_next_tick() {
        let mut timers = DwellTimers::default();
        let v = Entity::from_raw(2);
        timers.schedule(v, DwellKind::Scene, 0);
        assert_eq!(timers.tick_expired(), vec![(v, DwellKind::Scene)]);
    }

    #[test]
    fn test_independent_timers_per_vehicle() {
        let mut timers = DwellTimers::default();
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        timers.schedule(a, DwellKind::Scene, 1);
        timers.schedule(b, DwellKind::Hospital, 2);

        assert_eq!(timers.tick_expired(), vec![(a, DwellKind::Scene)]);
        assert_eq!(timers.tick_expired(), vec![(b, DwellKind::Hospital)]);
    }
}
