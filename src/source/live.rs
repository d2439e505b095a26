//! Live data from the traffic backend.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::channel::PollingChannel;
use super::{DataSource, SourceView};
use crate::api::TrafficApi;
use crate::config::Intervals;
use crate::data::{
    CongestionSnapshot, HistoryResponse, OperatingMode, SignalPhase, SignalState,
};

/// Three independent channels over the backend read endpoints.
///
/// Signal status, congestion and history refresh on their own intervals and
/// are exposed side by side; nothing here merges them.
#[derive(Debug)]
pub struct LiveStateAggregator {
    api: Arc<dyn TrafficApi>,
    signal: PollingChannel<SignalState>,
    congestion: PollingChannel<CongestionSnapshot>,
    history: PollingChannel<HistoryResponse>,
    description: String,
}

impl LiveStateAggregator {
    pub fn new(api: Arc<dyn TrafficApi>, intervals: &Intervals, timeout: Duration) -> Self {
        let signal = {
            let api = api.clone();
            PollingChannel::validated("signal", intervals.signal, timeout, SignalState::default(), move || {
                let api = api.clone();
                async move { api.signal_status().await }
            })
        };
        let congestion = {
            let api = api.clone();
            PollingChannel::validated(
                "congestion",
                intervals.congestion,
                timeout,
                CongestionSnapshot::default(),
                move || {
                    let api = api.clone();
                    async move { api.congestion().await }
                },
            )
        };
        let history = {
            let api = api.clone();
            PollingChannel::validated(
                "history",
                intervals.history,
                timeout,
                HistoryResponse::default(),
                move || {
                    let api = api.clone();
                    async move { api.history().await }
                },
            )
        };

        let description = format!("live ({})", api.description());
        Self {
            api,
            signal,
            congestion,
            history,
            description,
        }
    }

    pub fn signal(&self) -> &PollingChannel<SignalState> {
        &self.signal
    }

    pub fn congestion(&self) -> &PollingChannel<CongestionSnapshot> {
        &self.congestion
    }

    pub fn history(&self) -> &PollingChannel<HistoryResponse> {
        &self.history
    }

    /// URL of the backend camera stream, if any.
    pub fn live_feed_url(&self) -> Option<String> {
        self.api.live_feed_url()
    }

    /// Ask the backend to switch the signal to `phase`.
    ///
    /// Fire-and-forget: the request runs on its own task and a failure is
    /// only logged. The signal channel reflects the change on its next tick.
    pub fn force_signal(&self, phase: SignalPhase) -> JoinHandle<()> {
        let api = self.api.clone();
        info!(%phase, "forcing signal");
        tokio::spawn(async move {
            if let Err(err) = api.force_signal(phase).await {
                warn!(%phase, error = %err, "signal override failed");
            }
        })
    }
}

impl DataSource for LiveStateAggregator {
    fn start(&mut self) {
        self.signal.start();
        self.congestion.start();
        self.history.start();
    }

    fn stop(&mut self) {
        self.signal.stop();
        self.congestion.stop();
        self.history.stop();
    }

    fn is_active(&self) -> bool {
        self.signal.is_running()
    }

    fn view(&self) -> SourceView {
        SourceView {
            signal: self.signal.state(),
            congestion: self.congestion.state(),
            history: self.history.state(),
        }
    }

    fn mode(&self) -> OperatingMode {
        OperatingMode::Live
    }

    fn description(&self) -> &str {
        &self.description
    }
}
