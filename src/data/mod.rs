//! Data models and processing for the traffic backend feeds.
//!
//! ## Submodules
//!
//! - [`model`]: Wire types ([`CongestionSnapshot`], [`SignalState`], [`HistoryEntry`],
//!   [`HealthReport`]) and their invariant checks
//! - [`history`]: Chart series and statistics derived from the history feed
//! - [`duration`]: Parsing and formatting of interval strings (e.g., "10s", "500ms")
//!
//! ## Data Flow
//!
//! ```text
//! backend JSON ──▶ serde ──▶ Validate::validate() ──▶ PollingChannel latest
//!                                                          │
//!                                     history feed ──▶ TrendSeries / HistoryStats
//! ```

pub mod duration;
pub mod history;
pub mod model;

pub use history::{HistoryStats, TrendSeries};
pub use model::{
    CongestionSnapshot, HealthReport, HistoryEntry, HistoryResponse, OperatingMode, SignalPhase,
    SignalState, Validate, ZoneCounts, GRID_CELLS,
};
