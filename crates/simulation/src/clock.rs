//! Simulated wall clock: day plus fractional hour, one sim-minute per tick.
//!
//! Incident timestamps are expressed in total sim-minutes since session
//! start so durations are a plain subtraction, and the hour-of-day for the
//! peak-hour analytics falls out of the same value.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::simulation_sets::SimulationSet;

#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct SimClock {
    pub day: u32,
    pub hour: f32,
    pub paused: bool,
}

impl Default for SimClock {
    fn default() -> Self {
        Self {
            day: 1,
            hour: 8.0, // shift start
            paused: false,
        }
    }
}

impl SimClock {
    /// Sim-minutes advanced per fixed tick.
    pub const MINUTES_PER_TICK: f32 = 1.0;

    pub fn tick(&mut self) {
        if self.paused {
            return;
        }
        self.hour += Self::MINUTES_PER_TICK / 60.0;
        if self.hour >= 24.0 {
            self.hour -= 24.0;
            self.day += 1;
        }
    }

    pub fn hour_of_day(&self) -> u32 {
        self.hour as u32
    }

    /// Total sim-minutes since the start of day 1.
    pub fn timestamp_minutes(&self) -> f64 {
        ((self.day as f64 - 1.0) * 24.0 + self.hour as f64) * 60.0
    }

    pub fn formatted(&self) -> String {
        let h = self.hour as u32;
        let m = ((self.hour - h as f32) * 60.0) as u32;
        format!("Day {} {:02}:{:02}", self.day, h, m)
    }
}

/// Hour-of-day (0-23) for a `timestamp_minutes` value.
pub fn hour_of_timestamp(minutes: f64) -> u32 {
    ((minutes / 60.0) as u64 % 24) as u32
}

pub fn tick_sim_clock(mut clock: ResMut<SimClock>) {
    clock.tick();
}

pub struct ClockPlugin;

impl Plugin for ClockPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimClock>()
            .add_systems(FixedUpdate, tick_sim_clock.in_set(SimulationSet::PreSim));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_wraps_at_24h() {
        let mut clock = SimClock {
            day: 1,
            hour: 23.9,
            paused: false,
        };
        for _ in 0..20 {
            clock.tick();
        }
        assert_eq!(clock.day, 2);
        assert!(clock.hour < 24.0);
        assert!(clock.hour >= 0.0);
    }

    #[test]
    fn test_clock_paused() {
        let mut clock = SimClock {
            paused: true,
            ..Default::default()
        };
        let hour_before = clock.hour;
        clock.tick();
        assert_eq!(clock.hour, hour_before);
    }

    #[test]
    fn test_timestamp_minutes_counts_across_days() {
        let clock = SimClock {
            day: 2,
            hour: 1.0,
            paused: false,
        };
        assert_eq!(clock.timestamp_minutes(), (24.0 + 1.0) * 60.0);
    }

    #[test]
    fn test_hour_of_timestamp() {
        // Day 1 08:00 -> 480 minutes -> hour 8.
        assert_eq!(hour_of_timestamp(480.0), 8);
        // Day 2 01:30 -> 1530 minutes -> hour 1.
        assert_eq!(hour_of_timestamp(1530.0), 1);
    }
}
