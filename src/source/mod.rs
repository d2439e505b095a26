//! Data sources feeding the dashboard.
//!
//! Both the live backend aggregator and the simulated generator implement
//! [`DataSource`], so switching between live and simulated operation is a
//! matter of swapping which source is active.

mod channel;
mod health;
mod live;
mod simulated;

pub use channel::{ChannelState, PollingChannel, ReadFuture};
pub use health::{is_pending, mode_for, HealthIndicator, HealthMonitor};
pub use live::LiveStateAggregator;
pub use simulated::SimulatedStateGenerator;

use std::fmt::Debug;

use crate::data::{CongestionSnapshot, HistoryResponse, OperatingMode, SignalState};

/// The three feeds a source exposes, captured at one instant.
///
/// The feeds are independent: each carries its own error and loading state
/// and nothing here merges them.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceView {
    pub signal: ChannelState<SignalState>,
    pub congestion: ChannelState<CongestionSnapshot>,
    pub history: ChannelState<HistoryResponse>,
}

/// Trait for sources of signal, congestion and history data.
///
/// Implementations own their polling tasks. `start` and `stop` must be
/// called from within a tokio runtime.
///
/// # Example
///
/// ```
/// use signalwatch::{DataSource, SimulatedStateGenerator};
/// use signalwatch::policy::SignalTiming;
/// use std::time::Duration;
///
/// tokio_test::block_on(async {
///     let mut source = SimulatedStateGenerator::new(
///         Duration::from_secs(3),
///         SignalTiming::default(),
///         Some(7),
///     );
///     source.start();
///     tokio::task::yield_now().await;
///     let view = source.view();
///     println!("{} vehicles", view.congestion.latest.total_vehicles);
///     source.stop();
/// });
/// ```
pub trait DataSource: Send + Debug {
    /// Begin producing data. Resets every feed to its loading state.
    fn start(&mut self);

    /// Stop producing data. No feed changes after this returns.
    fn stop(&mut self);

    /// True between `start` and `stop`.
    fn is_active(&self) -> bool;

    /// Current state of every feed.
    fn view(&self) -> SourceView;

    /// Which operating mode this source serves.
    fn mode(&self) -> OperatingMode;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;
}
