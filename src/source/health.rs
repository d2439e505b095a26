//! Backend reachability monitor.
//!
//! The health poll is the only input to mode selection: the dashboard runs
//! in live mode while the backend answers and falls back to simulated data
//! once `failure_threshold` consecutive polls have failed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::channel::{ChannelState, PollingChannel};
use crate::api::{FetchError, TrafficApi};
use crate::data::{HealthReport, OperatingMode, Validate};

/// What the dashboard knows about backend health.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthIndicator {
    /// No health result yet.
    Unknown,
    /// The backend answered.
    Reported(HealthReport),
    /// The last health poll failed.
    Unreachable(String),
}

impl HealthIndicator {
    /// Derive the indicator from a health channel state.
    pub fn from_state(state: &ChannelState<Option<HealthReport>>) -> Self {
        if let Some(err) = &state.last_error {
            return HealthIndicator::Unreachable(err.clone());
        }
        match &state.latest {
            Some(report) => HealthIndicator::Reported(report.clone()),
            None => HealthIndicator::Unknown,
        }
    }

    pub fn camera_active(&self) -> Option<bool> {
        match self {
            HealthIndicator::Reported(report) => Some(report.camera_active),
            HealthIndicator::Unreachable(_) => Some(false),
            HealthIndicator::Unknown => None,
        }
    }

    pub fn controller_active(&self) -> Option<bool> {
        match self {
            HealthIndicator::Reported(report) => Some(report.signal_controller_active),
            HealthIndicator::Unreachable(_) => Some(false),
            HealthIndicator::Unknown => None,
        }
    }

    pub fn system_healthy(&self) -> Option<bool> {
        match self {
            HealthIndicator::Reported(report) => Some(report.is_healthy()),
            HealthIndicator::Unreachable(_) => Some(false),
            HealthIndicator::Unknown => None,
        }
    }
}

/// Operating mode implied by a health channel state.
///
/// Before the first result the mode is live (pending): live sources stay
/// active until the backend has actually been found unreachable.
pub fn mode_for(state: &ChannelState<Option<HealthReport>>, failure_threshold: u32) -> OperatingMode {
    if state.consecutive_failures >= failure_threshold.max(1) {
        OperatingMode::Simulated
    } else {
        OperatingMode::Live
    }
}

/// True before the first health result of the current run.
pub fn is_pending(state: &ChannelState<Option<HealthReport>>) -> bool {
    state.loading && state.consecutive_failures == 0
}

/// Polls `/api/health` and derives the operating mode from the result.
#[derive(Debug)]
pub struct HealthMonitor {
    channel: PollingChannel<Option<HealthReport>>,
    failure_threshold: u32,
}

impl HealthMonitor {
    pub fn new(
        api: Arc<dyn TrafficApi>,
        interval: Duration,
        timeout: Duration,
        failure_threshold: u32,
    ) -> Self {
        let channel = PollingChannel::new("health", interval, timeout, None, move || {
            let api = api.clone();
            async move {
                let report = api.health().await?;
                report.validate().map_err(FetchError::Invalid)?;
                Ok(Some(report))
            }
        });
        Self {
            channel,
            failure_threshold: failure_threshold.max(1),
        }
    }

    pub fn start(&mut self) {
        self.channel.start();
    }

    pub fn stop(&mut self) {
        self.channel.stop();
    }

    pub fn is_running(&self) -> bool {
        self.channel.is_running()
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    #[cfg(test)]
    fn mode(&self) -> OperatingMode {
        mode_for(&self.channel.state(), self.failure_threshold)
    }

    #[cfg(test)]
    fn is_pending(&self) -> bool {
        is_pending(&self.channel.state())
    }

    #[cfg(test)]
    fn indicator(&self) -> HealthIndicator {
        HealthIndicator::from_state(&self.channel.state())
    }

    #[cfg(test)]
    fn state(&self) -> ChannelState<Option<HealthReport>> {
        self.channel.state()
    }

    /// Subscribe to every health poll outcome.
    pub fn subscribe(&self) -> watch::Receiver<ChannelState<Option<HealthReport>>> {
        self.channel.subscribe()
    }
}
