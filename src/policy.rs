//! Adaptive signal timing.
//!
//! The green phase length is derived from the latest congestion snapshot by
//! a fixed, ordered rule. The same function is used for backend data and for
//! simulated samples, so both modes agree on the derived value.

use serde::{Deserialize, Serialize};

use crate::data::{CongestionSnapshot, SignalPhase, SignalState};

/// Red-zone count above which the longest green phase is granted.
pub const RED_ZONE_LIMIT: u32 = 8;
/// Yellow-zone count above which an extended green phase is granted.
pub const YELLOW_ZONE_LIMIT: u32 = 5;

pub const HEAVY_GREEN_SECS: u32 = 60;
pub const MODERATE_GREEN_SECS: u32 = 40;
pub const BASE_GREEN_SECS: u32 = 30;

/// Green phase duration in seconds for the given snapshot.
///
/// First match wins: red zone over [`RED_ZONE_LIMIT`], then yellow zone over
/// [`YELLOW_ZONE_LIMIT`], then the base duration. Total for any input.
pub fn dynamic_green_duration(snapshot: &CongestionSnapshot) -> u32 {
    GREEN_SECS[active_rule(snapshot)]
}

const GREEN_SECS: [u32; 3] = [HEAVY_GREEN_SECS, MODERATE_GREEN_SECS, BASE_GREEN_SECS];

/// Index into [`rule_lines`] of the rule that applies to `snapshot`.
pub fn active_rule(snapshot: &CongestionSnapshot) -> usize {
    let counts = &snapshot.zone_counts;
    if counts.red > RED_ZONE_LIMIT {
        0
    } else if counts.yellow > YELLOW_ZONE_LIMIT {
        1
    } else {
        2
    }
}

/// Human-readable rule table, shown on the signal view.
pub fn rule_lines() -> [String; 3] {
    [
        format!("Red zone > {} vehicles -> {}s green", RED_ZONE_LIMIT, HEAVY_GREEN_SECS),
        format!("Yellow zone > {} vehicles -> {}s green", YELLOW_ZONE_LIMIT, MODERATE_GREEN_SECS),
        format!("Otherwise -> {}s green", BASE_GREEN_SECS),
    ]
}

/// Fixed durations for the non-green phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalTiming {
    /// Yellow phase length in seconds.
    pub yellow: u32,
    /// Red phase length in seconds.
    pub red: u32,
}

impl Default for SignalTiming {
    fn default() -> Self {
        Self { yellow: 5, red: 25 }
    }
}

impl SignalTiming {
    /// Full duration of `phase`; green is derived from `snapshot`.
    pub fn duration_for(&self, phase: SignalPhase, snapshot: &CongestionSnapshot) -> u32 {
        match phase {
            SignalPhase::Green => dynamic_green_duration(snapshot),
            SignalPhase::Yellow => self.yellow,
            SignalPhase::Red => self.red,
        }
    }
}

impl SignalState {
    /// State right after an operator forces `phase`: the countdown restarts
    /// at the phase's full duration.
    pub fn overridden(phase: SignalPhase, timing: &SignalTiming, snapshot: &CongestionSnapshot) -> Self {
        let duration = timing.duration_for(phase, snapshot);
        Self {
            phase,
            time_remaining: duration,
            configured_duration: duration,
            dynamic_green_duration: dynamic_green_duration(snapshot),
            timestamp: None,
        }
    }

    /// State at the start of the phase that follows this one in the cycle.
    pub fn advanced(&self, timing: &SignalTiming, snapshot: &CongestionSnapshot) -> Self {
        Self::overridden(self.phase.next(), timing, snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ZoneCounts;

    fn snapshot(green: u32, yellow: u32, red: u32) -> CongestionSnapshot {
        CongestionSnapshot::from_counts(ZoneCounts::new(green, yellow, red), 0)
    }

    #[test]
    fn test_scenarios() {
        assert_eq!(dynamic_green_duration(&snapshot(2, 3, 9)), 60);
        assert_eq!(dynamic_green_duration(&snapshot(2, 7, 4)), 40);
        assert_eq!(dynamic_green_duration(&snapshot(1, 1, 1)), 30);
    }

    #[test]
    fn test_active_rule_matches_duration() {
        assert_eq!(active_rule(&snapshot(2, 3, 9)), 0);
        assert_eq!(active_rule(&snapshot(2, 7, 4)), 1);
        assert_eq!(active_rule(&snapshot(1, 1, 1)), 2);
        assert!(rule_lines()[active_rule(&snapshot(2, 7, 4))].contains("40s"));
    }

    #[test]
    fn test_red_boundary() {
        assert_eq!(dynamic_green_duration(&snapshot(0, 0, 8)), 30);
        assert_eq!(dynamic_green_duration(&snapshot(0, 0, 9)), 60);
        assert_eq!(dynamic_green_duration(&snapshot(0, 6, 8)), 40);
    }

    #[test]
    fn test_yellow_boundary() {
        assert_eq!(dynamic_green_duration(&snapshot(0, 5, 0)), 30);
        assert_eq!(dynamic_green_duration(&snapshot(0, 6, 0)), 40);
    }

    #[test]
    fn test_red_wins_regardless_of_other_zones() {
        for green in [0, 3, 50] {
            for yellow in [0, 5, 6, 100] {
                assert_eq!(dynamic_green_duration(&snapshot(green, yellow, 9)), 60);
                assert_eq!(dynamic_green_duration(&snapshot(green, yellow, u32::MAX / 4)), 60);
            }
        }
    }

    #[test]
    fn test_zero_snapshot() {
        assert_eq!(dynamic_green_duration(&CongestionSnapshot::default()), 30);
    }

    #[test]
    fn test_override_resets_countdown() {
        let timing = SignalTiming::default();
        let busy = snapshot(2, 7, 4);

        let green = SignalState::overridden(SignalPhase::Green, &timing, &busy);
        assert_eq!(green.time_remaining, 40);
        assert_eq!(green.configured_duration, 40);

        let red = SignalState::overridden(SignalPhase::Red, &timing, &busy);
        assert_eq!(red.time_remaining, 25);
        assert_eq!(red.dynamic_green_duration, 40);
    }

    #[test]
    fn test_cycle_durations() {
        let timing = SignalTiming { yellow: 4, red: 20 };
        let quiet = snapshot(1, 1, 1);
        let green = SignalState::overridden(SignalPhase::Green, &timing, &quiet);
        let yellow = green.advanced(&timing, &quiet);
        let red = yellow.advanced(&timing, &quiet);
        assert_eq!((yellow.phase, yellow.configured_duration), (SignalPhase::Yellow, 4));
        assert_eq!((red.phase, red.configured_duration), (SignalPhase::Red, 20));
        assert_eq!(red.advanced(&timing, &quiet).phase, SignalPhase::Green);
    }
}
