//! JSON state reports.
//!
//! The same report is produced by the `e` key in the TUI (from whatever the
//! dashboard currently shows) and by `--export` (from one fresh read of every
//! backend endpoint).

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::api::TrafficApi;
use crate::dashboard::DashboardView;
use crate::data::{
    CongestionSnapshot, HealthReport, HistoryStats, OperatingMode, SignalState, Validate,
};
use crate::policy;
use crate::source::HealthIndicator;

/// Point-in-time summary of the intersection.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Local>,
    pub mode: OperatingMode,
    pub source: String,
    pub health: Option<HealthReport>,
    pub signal: SignalState,
    pub congestion: CongestionSnapshot,
    /// Green duration the policy derives from `congestion`.
    pub derived_green_duration: u32,
    pub policy: Vec<String>,
    pub history: Option<HistoryStats>,
}

impl Report {
    /// Build a report from the dashboard's current view.
    pub fn from_view(view: &DashboardView) -> Self {
        let health = match &view.health {
            HealthIndicator::Reported(report) => Some(report.clone()),
            _ => None,
        };
        Self::build(
            view.mode,
            view.source.clone(),
            health,
            view.signal.latest.clone(),
            view.congestion.latest.clone(),
            HistoryStats::from_history(&view.history.latest.history),
        )
    }

    /// Read every endpoint once and build a report from the answers.
    pub async fn fetch(api: &dyn TrafficApi) -> Result<Self> {
        let health = api.health().await.context("Failed to read /api/health")?;
        let signal = api.signal_status().await.context("Failed to read /api/signal-status")?;
        let congestion = api.congestion().await.context("Failed to read /api/congestion")?;
        let history = api.history().await.context("Failed to read /api/history")?;

        signal.validate().map_err(anyhow::Error::msg).context("Invalid signal status")?;
        congestion.validate().map_err(anyhow::Error::msg).context("Invalid congestion snapshot")?;
        history.validate().map_err(anyhow::Error::msg).context("Invalid history")?;

        Ok(Self::build(
            OperatingMode::Live,
            api.description().to_string(),
            Some(health),
            signal,
            congestion,
            HistoryStats::from_history(&history.history),
        ))
    }

    fn build(
        mode: OperatingMode,
        source: String,
        health: Option<HealthReport>,
        signal: SignalState,
        congestion: CongestionSnapshot,
        history: Option<HistoryStats>,
    ) -> Self {
        Self {
            generated_at: Local::now(),
            mode,
            source,
            health,
            derived_green_duration: policy::dynamic_green_duration(&congestion),
            policy: policy::rule_lines().to_vec(),
            signal,
            congestion,
            history,
        }
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedApi;
    use crate::data::{HistoryEntry, SignalPhase, ZoneCounts};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_fetch_and_write() {
        let api = ScriptedApi::new();
        api.history.lock().push(HistoryEntry {
            timestamp: NaiveDate::from_ymd_opt(2025, 9, 14)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            zone_counts: ZoneCounts::new(2, 2, 2),
            total_vehicles: 6,
            signal_status: SignalPhase::Green,
        });

        let report = Report::fetch(&api).await.unwrap();
        assert_eq!(report.mode, OperatingMode::Live);
        assert_eq!(report.derived_green_duration, policy::HEAVY_GREEN_SECS);
        assert_eq!(report.history.as_ref().unwrap().entries, 1);

        let file = tempfile::NamedTempFile::new().unwrap();
        report.write_to(file.path()).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(written["mode"], "LIVE");
        assert_eq!(written["signal"]["current_signal"], "RED");
        assert_eq!(written["congestion"]["zone_counts"]["red_zone"], 9);
        assert_eq!(written["policy"].as_array().unwrap().len(), 3);
        assert_eq!(written["history"]["avg_total"], 6.0);
    }

    #[tokio::test]
    async fn test_fetch_fails_when_unreachable() {
        let api = ScriptedApi::new();
        api.set_reachable(false);
        let err = Report::fetch(&api).await.unwrap_err();
        assert!(err.to_string().contains("/api/health"));
    }
}
