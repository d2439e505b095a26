//! Mode arbitration and the dashboard read model.
//!
//! The [`Dashboard`] owns the health monitor and both data sources. An
//! arbitration task reacts to every health poll outcome; when the implied
//! mode changes it stops the active source and starts the other one, all
//! under the same lock that [`Dashboard::view`] takes. A view therefore
//! always comes from exactly one source.

use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::TrafficApi;
use crate::config::Settings;
use crate::data::{
    CongestionSnapshot, HealthReport, HistoryResponse, OperatingMode, SignalPhase, SignalState,
};
use crate::policy::SignalTiming;
use crate::source::{
    is_pending, mode_for, ChannelState, DataSource, HealthIndicator, HealthMonitor,
    LiveStateAggregator, SimulatedStateGenerator,
};

/// Process-wide mode, as published to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeState {
    pub mode: OperatingMode,
    pub health: HealthIndicator,
    /// True until the first health result arrives.
    pub pending: bool,
    pub switched_at: Option<DateTime<Local>>,
    /// Number of mode switches since start.
    pub switches: u32,
}

impl Default for ModeState {
    fn default() -> Self {
        Self {
            mode: OperatingMode::Live,
            health: HealthIndicator::Unknown,
            pending: true,
            switched_at: None,
            switches: 0,
        }
    }
}

/// Subscription point for the operating mode.
pub type ModeContext = watch::Receiver<ModeState>;

/// Error returned when a signal override cannot be sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverrideError {
    #[error("Signal override is unavailable in simulated mode")]
    Simulated,
}

/// Everything the display surfaces need, taken from one source at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub mode: OperatingMode,
    pub health: HealthIndicator,
    pub pending: bool,
    /// Description of the active source.
    pub source: String,
    pub signal: ChannelState<SignalState>,
    pub congestion: ChannelState<CongestionSnapshot>,
    pub history: ChannelState<HistoryResponse>,
    pub live_feed_url: Option<String>,
    pub timing: SignalTiming,
}

#[derive(Debug)]
struct Sources {
    mode: OperatingMode,
    live: LiveStateAggregator,
    simulated: SimulatedStateGenerator,
}

impl Sources {
    fn active(&self) -> &dyn DataSource {
        match self.mode {
            OperatingMode::Live => &self.live,
            OperatingMode::Simulated => &self.simulated,
        }
    }

    fn active_mut(&mut self) -> &mut dyn DataSource {
        match self.mode {
            OperatingMode::Live => &mut self.live,
            OperatingMode::Simulated => &mut self.simulated,
        }
    }

    /// Make `mode` the active source. Returns true if anything changed.
    fn switch_to(&mut self, mode: OperatingMode) -> bool {
        if self.mode == mode {
            return false;
        }
        self.active_mut().stop();
        self.mode = mode;
        self.active_mut().start();
        true
    }

    fn stop_all(&mut self) {
        self.live.stop();
        self.simulated.stop();
    }
}

/// Arbitrates between live and simulated data.
#[derive(Debug)]
pub struct Dashboard {
    health: HealthMonitor,
    sources: Arc<Mutex<Sources>>,
    mode_tx: Arc<watch::Sender<ModeState>>,
    arbiter: Option<JoinHandle<()>>,
    timing: SignalTiming,
}

impl Dashboard {
    pub fn new(api: Arc<dyn TrafficApi>, settings: &Settings) -> Self {
        let health = HealthMonitor::new(
            api.clone(),
            settings.intervals.health,
            settings.request_timeout,
            settings.failure_threshold,
        );
        let live = LiveStateAggregator::new(api, &settings.intervals, settings.request_timeout);
        let simulated = SimulatedStateGenerator::new(
            settings.intervals.simulation,
            settings.timing,
            settings.simulation.seed,
        );
        let (mode_tx, _) = watch::channel(ModeState::default());

        Self {
            health,
            sources: Arc::new(Mutex::new(Sources {
                mode: OperatingMode::Live,
                live,
                simulated,
            })),
            mode_tx: Arc::new(mode_tx),
            arbiter: None,
            timing: settings.timing,
        }
    }

    /// Start health polling and the live sources, then hand control to the
    /// arbitration task.
    pub fn start(&mut self) {
        if self.arbiter.is_some() {
            return;
        }

        {
            let mut sources = self.sources.lock();
            sources.stop_all();
            sources.mode = OperatingMode::Live;
            sources.live.start();
            self.mode_tx.send_replace(ModeState::default());
        }
        self.health.start();
        info!(threshold = self.health.failure_threshold(), "dashboard started in live mode");

        let mut health_rx = self.health.subscribe();
        let sources = self.sources.clone();
        let mode_tx = self.mode_tx.clone();
        let threshold = self.health.failure_threshold();

        self.arbiter = Some(tokio::spawn(async move {
            loop {
                let state = health_rx.borrow_and_update().clone();
                arbitrate(&sources, &mode_tx, &state, threshold);
                if health_rx.changed().await.is_err() {
                    break;
                }
            }
        }));
    }

    /// Stop health polling and every source.
    pub fn stop(&mut self) {
        if let Some(arbiter) = self.arbiter.take() {
            arbiter.abort();
        }
        self.health.stop();
        self.sources.lock().stop_all();
        info!("dashboard stopped");
    }

    pub fn is_running(&self) -> bool {
        self.arbiter.is_some()
    }

    pub fn mode(&self) -> OperatingMode {
        self.sources.lock().mode
    }

    /// Subscribe to mode and health changes.
    pub fn mode_context(&self) -> ModeContext {
        self.mode_tx.subscribe()
    }

    /// Consistent snapshot of the active source.
    pub fn view(&self) -> DashboardView {
        let sources = self.sources.lock();
        let mode_state = self.mode_tx.borrow().clone();
        let active = sources.active();
        let feeds = active.view();

        DashboardView {
            mode: sources.mode,
            health: mode_state.health,
            pending: mode_state.pending,
            source: active.description().to_string(),
            signal: feeds.signal,
            congestion: feeds.congestion,
            history: feeds.history,
            live_feed_url: match sources.mode {
                OperatingMode::Live => sources.live.live_feed_url(),
                OperatingMode::Simulated => None,
            },
            timing: self.timing,
        }
    }

    /// Request a signal override.
    ///
    /// In live mode the request is forwarded without waiting for the
    /// backend. Simulated data has no controller to override, so the request
    /// is refused.
    pub fn force_signal(&self, phase: SignalPhase) -> Result<JoinHandle<()>, OverrideError> {
        let sources = self.sources.lock();
        match sources.mode {
            OperatingMode::Live => Ok(sources.live.force_signal(phase)),
            OperatingMode::Simulated => {
                warn!(%phase, "signal override refused in simulated mode");
                Err(OverrideError::Simulated)
            }
        }
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        if let Some(arbiter) = self.arbiter.take() {
            arbiter.abort();
        }
    }
}

/// Apply one health outcome: switch sources if the mode changed and publish.
fn arbitrate(
    sources: &Mutex<Sources>,
    mode_tx: &watch::Sender<ModeState>,
    state: &ChannelState<Option<HealthReport>>,
    threshold: u32,
) {
    let mode = mode_for(state, threshold);
    let indicator = HealthIndicator::from_state(state);
    let pending = is_pending(state);

    let mut sources = sources.lock();
    let from = sources.mode;
    let switched = sources.switch_to(mode);
    if switched {
        info!(from = from.label(), to = mode.label(), "operating mode switched");
    }

    mode_tx.send_if_modified(|current| {
        let before = current.clone();
        current.mode = mode;
        current.health = indicator;
        current.pending = pending;
        if switched {
            current.switched_at = Some(Local::now());
            current.switches += 1;
        }
        *current != before
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedApi;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.simulation.seed = Some(11);
        settings
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_mode_keeps_live_sources() {
        let api = Arc::new(ScriptedApi::new());
        let dashboard = Dashboard::new(api, &settings());

        let view = dashboard.view();
        assert_eq!(view.mode, OperatingMode::Live);
        assert_eq!(view.health, HealthIndicator::Unknown);
        assert!(view.pending);
        assert!(view.signal.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_to_simulated_and_back() {
        let api = Arc::new(ScriptedApi::new());
        let settings = settings();
        let health_interval = settings.intervals.health;
        let mut dashboard = Dashboard::new(api.clone(), &settings);
        let mut mode_rx = dashboard.mode_context();

        dashboard.start();
        settle().await;

        let view = dashboard.view();
        assert_eq!(view.mode, OperatingMode::Live);
        assert!(!view.pending);
        assert_eq!(view.signal.latest.phase, SignalPhase::Red);
        assert_eq!(view.signal.latest.time_remaining, 12);
        assert_eq!(view.live_feed_url, None);
        assert!(mode_rx.has_changed().unwrap());
        assert_eq!(mode_rx.borrow_and_update().mode, OperatingMode::Live);

        // Backend goes away: the next health poll flips the mode
        api.set_reachable(false);
        tokio::time::sleep(health_interval).await;
        settle().await;

        assert_eq!(dashboard.mode(), OperatingMode::Simulated);
        let view = dashboard.view();
        assert_eq!(view.mode, OperatingMode::Simulated);
        assert!(matches!(view.health, HealthIndicator::Unreachable(_)));
        assert_eq!(view.source, "simulated (seed 11)");
        assert!(!view.signal.loading);
        assert!((10..70).contains(&view.signal.latest.time_remaining));
        assert_eq!(
            view.congestion.latest.total_vehicles,
            view.congestion.latest.zone_counts.total()
        );
        {
            let sources = dashboard.sources.lock();
            assert!(!sources.live.is_active());
            assert!(sources.simulated.is_active());
        }
        assert_eq!(
            dashboard.force_signal(SignalPhase::Green).unwrap_err(),
            OverrideError::Simulated
        );

        // Live channels stay quiet while simulated
        let signal_calls = api.signal_calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(api.signal_calls.load(Ordering::SeqCst), signal_calls);

        // Backend returns
        api.set_reachable(true);
        tokio::time::sleep(health_interval).await;
        settle().await;

        let view = dashboard.view();
        assert_eq!(view.mode, OperatingMode::Live);
        assert_eq!(view.signal.latest.phase, SignalPhase::Red);
        {
            let sources = dashboard.sources.lock();
            assert!(sources.live.is_active());
            assert!(!sources.simulated.is_active());
        }

        let state = mode_rx.borrow_and_update().clone();
        assert_eq!(state.mode, OperatingMode::Live);
        assert_eq!(state.switches, 2);
        assert!(state.switched_at.is_some());

        dashboard.stop();
        assert!(!dashboard.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_at_startup_goes_simulated() {
        let api = Arc::new(ScriptedApi::new());
        api.set_reachable(false);
        let mut dashboard = Dashboard::new(api, &settings());

        dashboard.start();
        settle().await;

        let view = dashboard.view();
        assert_eq!(view.mode, OperatingMode::Simulated);
        assert!(!view.pending);
        assert!(!view.history.latest.history.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_signal_in_live_mode() {
        let api = Arc::new(ScriptedApi::new());
        let mut dashboard = Dashboard::new(api.clone(), &settings());
        dashboard.start();
        settle().await;

        dashboard.force_signal(SignalPhase::Yellow).unwrap().await.unwrap();
        assert_eq!(*api.forced.lock(), vec![SignalPhase::Yellow]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_threshold_tolerates_transient_failures() {
        let api = Arc::new(ScriptedApi::new());
        let mut settings = settings();
        settings.failure_threshold = 2;
        let interval = settings.intervals.health;
        let mut dashboard = Dashboard::new(api.clone(), &settings);
        dashboard.start();
        settle().await;

        api.set_reachable(false);
        tokio::time::sleep(interval).await;
        settle().await;
        assert_eq!(dashboard.mode(), OperatingMode::Live);
        assert!(matches!(dashboard.view().health, HealthIndicator::Unreachable(_)));

        tokio::time::sleep(interval).await;
        settle().await;
        assert_eq!(dashboard.mode(), OperatingMode::Simulated);
    }
}
