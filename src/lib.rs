//! # signalwatch
//!
//! An operations dashboard TUI and library for an adaptive traffic-signal
//! controller.
//!
//! The dashboard polls a traffic backend for signal status, congestion and
//! history, shows each feed as it refreshes, and lets an operator force the
//! signal. When the backend cannot be reached it switches to simulated data
//! and switches back once the backend answers again.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           Application                            │
//! │  ┌─────────┐    ┌───────────┐    ┌─────────┐    ┌──────────┐     │
//! │  │  app    │───▶│ dashboard │───▶│   ui    │───▶│ Terminal │     │
//! │  │ (state) │    │  (view)   │    │(render) │    │          │     │
//! │  └─────────┘    └─────┬─────┘    └─────────┘    └──────────┘     │
//! │                       │ mode arbitration                         │
//! │                       ▼                                          │
//! │  ┌──────────────────────────────────────────┐                    │
//! │  │ source   HealthMonitor                   │                    │
//! │  │          LiveStateAggregator ◀── api ◀───┼── HTTP backend     │
//! │  │          SimulatedStateGenerator         │                    │
//! │  └──────────────────────────────────────────┘                    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`api`]**: The [`TrafficApi`] trait and its reqwest implementation
//! - **[`source`]**: [`PollingChannel`], the health monitor, and the live and
//!   simulated [`DataSource`] implementations
//! - **[`dashboard`]**: Mode arbitration and the [`DashboardView`] read model
//! - **[`policy`]**: Green-time derivation from congestion
//! - **[`data`]**: Wire types, invariant checks, and history statistics
//! - **[`ui`]**: Terminal rendering using ratatui
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch a backend
//! signalwatch --backend http://localhost:5000 --log-file signalwatch.log
//!
//! # One-shot JSON report
//! signalwatch --backend http://localhost:5000 --export state.json
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::sync::Arc;
//! use signalwatch::{Dashboard, HttpTrafficApi, Settings};
//!
//! # tokio_test::block_on(async {
//! let settings = Settings::default();
//! let api = HttpTrafficApi::new(&settings.backend_url, settings.request_timeout).unwrap();
//! let mut dashboard = Dashboard::new(Arc::new(api), &settings);
//! dashboard.start();
//!
//! let mut mode = dashboard.mode_context();
//! mode.changed().await.unwrap();
//! println!("now {}", mode.borrow().mode.label());
//! # });
//! ```
//!
//! ### Deriving green time
//!
//! ```
//! use signalwatch::data::{CongestionSnapshot, ZoneCounts};
//! use signalwatch::policy::dynamic_green_duration;
//!
//! let snapshot = CongestionSnapshot::from_counts(ZoneCounts::new(2, 3, 9), 4);
//! assert_eq!(dynamic_green_duration(&snapshot), 60);
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod events;
pub mod policy;
pub mod report;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use api::{FetchError, HttpTrafficApi, TrafficApi};
pub use app::App;
pub use config::Settings;
pub use dashboard::{Dashboard, DashboardView, ModeContext, ModeState, OverrideError};
pub use data::{
    CongestionSnapshot, HealthReport, HistoryEntry, OperatingMode, SignalPhase, SignalState,
    ZoneCounts,
};
pub use report::Report;
pub use source::{
    ChannelState, DataSource, HealthIndicator, HealthMonitor, LiveStateAggregator,
    PollingChannel, SimulatedStateGenerator, SourceView,
};
