//! Traffic backend API.
//!
//! The dashboard only talks to the backend through the [`TrafficApi`] trait.
//! [`HttpTrafficApi`] is the production implementation; tests substitute
//! scripted fakes.

mod error;
mod http;
#[cfg(test)]
pub(crate) mod testing;

pub use error::FetchError;
pub use http::HttpTrafficApi;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::data::{CongestionSnapshot, HealthReport, HistoryResponse, SignalPhase, SignalState};

/// Read and override operations exposed by the traffic backend.
///
/// Implementations must return fully decoded values; validation of data
/// invariants happens in the polling layer.
#[async_trait]
pub trait TrafficApi: Send + Sync + Debug {
    /// `GET /api/health`
    async fn health(&self) -> Result<HealthReport, FetchError>;

    /// `GET /api/signal-status`
    async fn signal_status(&self) -> Result<SignalState, FetchError>;

    /// `GET /api/congestion`
    async fn congestion(&self) -> Result<CongestionSnapshot, FetchError>;

    /// `GET /api/history`
    async fn history(&self) -> Result<HistoryResponse, FetchError>;

    /// `POST /api/force-signal`
    async fn force_signal(&self, phase: SignalPhase) -> Result<(), FetchError>;

    /// URL of the camera stream, if the backend exposes one.
    fn live_feed_url(&self) -> Option<String> {
        None
    }

    /// Returns a human-readable description of the backend.
    fn description(&self) -> &str;
}
