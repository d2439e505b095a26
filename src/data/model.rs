//! Wire and domain types for the traffic backend.
//!
//! Field names follow the JSON produced by the controller backend
//! (`zone_counts.green_zone`, `current_signal`, ...). Decoded values are
//! checked with [`Validate`] before they are accepted by a channel; a value
//! that breaks an invariant is treated exactly like a failed read.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Number of spatial grid cells used for occupancy accounting (3x3).
pub const GRID_CELLS: u32 = 9;

/// Structural checks applied to every decoded response.
pub trait Validate {
    /// Returns a description of the first violated invariant, if any.
    fn validate(&self) -> Result<(), String>;
}

/// Vehicle counts per congestion zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneCounts {
    #[serde(rename = "green_zone")]
    pub green: u32,
    #[serde(rename = "yellow_zone")]
    pub yellow: u32,
    #[serde(rename = "red_zone")]
    pub red: u32,
}

impl ZoneCounts {
    pub fn new(green: u32, yellow: u32, red: u32) -> Self {
        Self { green, yellow, red }
    }

    /// Sum of all zones, saturating at `u32::MAX`.
    pub fn total(&self) -> u32 {
        self.green.saturating_add(self.yellow).saturating_add(self.red)
    }

    /// Sum of all zones, or `None` if it does not fit in a `u32`.
    pub fn checked_total(&self) -> Option<u32> {
        self.green.checked_add(self.yellow)?.checked_add(self.red)
    }
}

/// Current congestion reading from the detection service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CongestionSnapshot {
    pub zone_counts: ZoneCounts,
    pub total_vehicles: u32,
    #[serde(default)]
    pub occupied_grid_cells: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveDateTime>,
}

impl CongestionSnapshot {
    /// Build a snapshot whose total is derived from the zone counts.
    pub fn from_counts(zone_counts: ZoneCounts, occupied_grid_cells: u32) -> Self {
        Self {
            zone_counts,
            total_vehicles: zone_counts.total(),
            occupied_grid_cells,
            timestamp: None,
        }
    }
}

impl Validate for CongestionSnapshot {
    fn validate(&self) -> Result<(), String> {
        let sum = self
            .zone_counts
            .checked_total()
            .ok_or_else(|| "zone counts overflow".to_string())?;
        if self.total_vehicles != sum {
            return Err(format!(
                "total_vehicles {} does not match zone sum {}",
                self.total_vehicles, sum
            ));
        }
        if self.occupied_grid_cells > GRID_CELLS {
            return Err(format!(
                "occupied_grid_cells {} exceeds {}",
                self.occupied_grid_cells, GRID_CELLS
            ));
        }
        Ok(())
    }
}

/// Traffic signal phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalPhase {
    #[default]
    Green,
    Yellow,
    Red,
}

impl SignalPhase {
    pub const ALL: [SignalPhase; 3] = [SignalPhase::Green, SignalPhase::Yellow, SignalPhase::Red];

    /// Next phase in the fixed cycle GREEN → YELLOW → RED → GREEN.
    pub fn next(self) -> Self {
        match self {
            SignalPhase::Green => SignalPhase::Yellow,
            SignalPhase::Yellow => SignalPhase::Red,
            SignalPhase::Red => SignalPhase::Green,
        }
    }

    /// Wire label, as sent to `/api/force-signal`.
    pub fn label(&self) -> &'static str {
        match self {
            SignalPhase::Green => "GREEN",
            SignalPhase::Yellow => "YELLOW",
            SignalPhase::Red => "RED",
        }
    }
}

impl fmt::Display for SignalPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Signal controller status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalState {
    #[serde(rename = "current_signal")]
    pub phase: SignalPhase,
    pub time_remaining: u32,
    #[serde(rename = "signal_duration")]
    pub configured_duration: u32,
    pub dynamic_green_duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveDateTime>,
}

impl Default for SignalState {
    fn default() -> Self {
        Self {
            phase: SignalPhase::Green,
            time_remaining: crate::policy::BASE_GREEN_SECS,
            configured_duration: crate::policy::BASE_GREEN_SECS,
            dynamic_green_duration: crate::policy::BASE_GREEN_SECS,
            timestamp: None,
        }
    }
}

impl Validate for SignalState {
    fn validate(&self) -> Result<(), String> {
        if self.configured_duration == 0 {
            return Err("signal_duration must be positive".to_string());
        }
        if self.dynamic_green_duration == 0 {
            return Err("dynamic_green_duration must be positive".to_string());
        }
        if self.time_remaining > self.configured_duration {
            return Err(format!(
                "time_remaining {} exceeds signal_duration {}",
                self.time_remaining, self.configured_duration
            ));
        }
        Ok(())
    }
}

/// One historical congestion sample recorded by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: NaiveDateTime,
    pub zone_counts: ZoneCounts,
    pub total_vehicles: u32,
    pub signal_status: SignalPhase,
}

/// Body of `GET /api/history`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_entries: Option<usize>,
}

impl Validate for HistoryResponse {
    fn validate(&self) -> Result<(), String> {
        for entry in &self.history {
            let sum = entry.zone_counts.checked_total().ok_or_else(|| {
                format!("history entry at {} has zone counts overflow", entry.timestamp)
            })?;
            if entry.total_vehicles != sum {
                return Err(format!(
                    "history entry at {} has total {} but zones sum to {}",
                    entry.timestamp, entry.total_vehicles, sum
                ));
            }
        }
        if self.history.windows(2).any(|w| w[1].timestamp < w[0].timestamp) {
            return Err("history is not ordered by timestamp".to_string());
        }
        Ok(())
    }
}

/// Backend health as reported by `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub camera_active: bool,
    #[serde(default)]
    pub signal_controller_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveDateTime>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

impl Validate for HealthReport {
    fn validate(&self) -> Result<(), String> {
        match self.status.as_str() {
            "healthy" | "error" => Ok(()),
            other => Err(format!("unknown health status '{}'", other)),
        }
    }
}

/// Where the dashboard currently sources its data from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperatingMode {
    #[default]
    Live,
    Simulated,
}

impl OperatingMode {
    pub fn label(&self) -> &'static str {
        match self {
            OperatingMode::Live => "LIVE",
            OperatingMode::Simulated => "SIMULATED",
        }
    }
}
