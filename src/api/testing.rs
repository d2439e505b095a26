//! Scripted backend used by unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{FetchError, TrafficApi};
use crate::data::{
    CongestionSnapshot, HealthReport, HistoryEntry, HistoryResponse, SignalPhase, SignalState,
    ZoneCounts,
};

/// In-memory backend whose reachability can be toggled.
#[derive(Debug)]
pub struct ScriptedApi {
    reachable: AtomicBool,
    pub signal: Mutex<SignalState>,
    pub congestion: Mutex<CongestionSnapshot>,
    pub history: Mutex<Vec<HistoryEntry>>,
    pub forced: Mutex<Vec<SignalPhase>>,
    pub health_calls: AtomicUsize,
    pub signal_calls: AtomicUsize,
    pub congestion_calls: AtomicUsize,
    pub history_calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self {
            reachable: AtomicBool::new(true),
            signal: Mutex::new(SignalState {
                phase: SignalPhase::Red,
                time_remaining: 12,
                configured_duration: 25,
                dynamic_green_duration: 60,
                timestamp: None,
            }),
            congestion: Mutex::new(CongestionSnapshot::from_counts(ZoneCounts::new(1, 2, 9), 5)),
            history: Mutex::new(Vec::new()),
            forced: Mutex::new(Vec::new()),
            health_calls: AtomicUsize::new(0),
            signal_calls: AtomicUsize::new(0),
            congestion_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), FetchError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(FetchError::Connection("connection refused".to_string()))
        }
    }
}

#[async_trait]
impl TrafficApi for ScriptedApi {
    async fn health(&self) -> Result<HealthReport, FetchError> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(HealthReport {
            status: "healthy".to_string(),
            camera_active: true,
            signal_controller_active: true,
            timestamp: None,
        })
    }

    async fn signal_status(&self) -> Result<SignalState, FetchError> {
        self.signal_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.signal.lock().clone())
    }

    async fn congestion(&self) -> Result<CongestionSnapshot, FetchError> {
        self.congestion_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.congestion.lock().clone())
    }

    async fn history(&self) -> Result<HistoryResponse, FetchError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let history = self.history.lock().clone();
        Ok(HistoryResponse {
            total_entries: Some(history.len()),
            history,
        })
    }

    async fn force_signal(&self, phase: SignalPhase) -> Result<(), FetchError> {
        self.check()?;
        self.forced.lock().push(phase);
        Ok(())
    }

    fn description(&self) -> &str {
        "scripted"
    }
}
