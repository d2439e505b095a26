//! Trend series and statistics derived from the history feed.
//!
//! Everything here is computed from the history entries alone; the trend
//! surface never mixes in the current congestion or signal feeds.

use serde::Serialize;

use super::model::{HistoryEntry, SignalPhase};

/// Number of sparkline levels (matches the eight block characters).
const SPARKLINE_LEVELS: u8 = 8;

/// Chart series for the trend view, one point per history entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendSeries {
    pub green: Vec<(f64, f64)>,
    pub yellow: Vec<(f64, f64)>,
    pub red: Vec<(f64, f64)>,
    pub total: Vec<(f64, f64)>,
    /// Time labels for the x axis (first, middle, last).
    pub labels: Vec<String>,
    /// Largest value across all series, for the y axis bound.
    pub max_value: u32,
}

impl TrendSeries {
    pub fn from_history(entries: &[HistoryEntry]) -> Self {
        let mut series = TrendSeries::default();

        for (i, entry) in entries.iter().enumerate() {
            let x = i as f64;
            series.green.push((x, entry.zone_counts.green as f64));
            series.yellow.push((x, entry.zone_counts.yellow as f64));
            series.red.push((x, entry.zone_counts.red as f64));
            series.total.push((x, entry.total_vehicles as f64));
            series.max_value = series.max_value.max(entry.total_vehicles);
        }

        if let (Some(first), Some(last)) = (entries.first(), entries.last()) {
            let middle = &entries[entries.len() / 2];
            series.labels = [first, middle, last]
                .iter()
                .map(|e| e.timestamp.format("%H:%M:%S").to_string())
                .collect();
        }

        series
    }

    pub fn is_empty(&self) -> bool {
        self.total.is_empty()
    }

    /// Number of points in each series.
    pub fn len(&self) -> usize {
        self.total.len()
    }
}

/// Aggregate statistics over the history window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryStats {
    pub entries: usize,
    pub avg_green: f64,
    pub avg_yellow: f64,
    pub avg_red: f64,
    pub avg_total: f64,
    pub peak_total: u32,
    /// Entries recorded while the signal showed each phase (green, yellow, red).
    pub phase_counts: [usize; 3],
}

impl HistoryStats {
    /// Returns `None` for an empty history.
    pub fn from_history(entries: &[HistoryEntry]) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }

        let n = entries.len() as f64;
        let sum = |f: fn(&HistoryEntry) -> u32| entries.iter().map(|e| f(e) as f64).sum::<f64>();

        let mut phase_counts = [0usize; 3];
        for entry in entries {
            let idx = match entry.signal_status {
                SignalPhase::Green => 0,
                SignalPhase::Yellow => 1,
                SignalPhase::Red => 2,
            };
            phase_counts[idx] += 1;
        }

        Some(Self {
            entries: entries.len(),
            avg_green: round2(sum(|e| e.zone_counts.green) / n),
            avg_yellow: round2(sum(|e| e.zone_counts.yellow) / n),
            avg_red: round2(sum(|e| e.zone_counts.red) / n),
            avg_total: round2(sum(|e| e.total_vehicles) / n),
            peak_total: entries.iter().map(|e| e.total_vehicles).max().unwrap_or(0),
            phase_counts,
        })
    }
}

/// Total-vehicle sparkline levels (0-7), oldest first.
///
/// Returns an empty Vec if there are fewer than two entries.
pub fn total_sparkline(entries: &[HistoryEntry]) -> Vec<u8> {
    if entries.len() < 2 {
        return Vec::new();
    }

    let values: Vec<u32> = entries.iter().map(|e| e.total_vehicles).collect();
    let max = values.iter().copied().max().unwrap_or(0);
    let min = values.iter().copied().min().unwrap_or(0);
    let range = (max - min).max(1) as f64;
    let top = (SPARKLINE_LEVELS - 1) as f64;

    values
        .iter()
        .map(|&v| (((v - min) as f64 / range) * top) as u8)
        .map(|level| level.min(SPARKLINE_LEVELS - 1))
        .collect()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
