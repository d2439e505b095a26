//! Application state and navigation logic.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::dashboard::{Dashboard, DashboardView};
use crate::data::{HistoryStats, SignalPhase, TrendSeries};
use crate::report::Report;
use crate::ui::Theme;

/// How long a status message stays in the status bar.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Current phase, countdown and green-time derivation.
    Signal,
    /// Vehicle counts per zone and grid occupancy.
    Congestion,
    /// Historical chart and statistics.
    Trends,
}

impl View {
    pub const ALL: [View; 3] = [View::Signal, View::Congestion, View::Trends];

    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Signal => View::Congestion,
            View::Congestion => View::Trends,
            View::Trends => View::Signal,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        match self {
            View::Signal => View::Trends,
            View::Congestion => View::Signal,
            View::Trends => View::Congestion,
        }
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Signal => "Signal",
            View::Congestion => "Congestion",
            View::Trends => "Trends",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            View::Signal => 0,
            View::Congestion => 1,
            View::Trends => 2,
        }
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    dashboard: Dashboard,
    /// Read model captured at the last refresh; every surface renders from it.
    pub view: DashboardView,
    pub trend: TrendSeries,
    pub stats: Option<HistoryStats>,

    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App over a dashboard, detecting the terminal theme.
    pub fn new(dashboard: Dashboard) -> Self {
        Self::with_theme(dashboard, Theme::auto_detect())
    }

    pub fn with_theme(dashboard: Dashboard, theme: Theme) -> Self {
        let view = dashboard.view();
        let mut app = Self {
            running: true,
            current_view: View::Signal,
            show_help: false,
            dashboard,
            view,
            trend: TrendSeries::default(),
            stats: None,
            theme,
            status_message: None,
        };
        app.refresh();
        app
    }

    /// Take a fresh view from the dashboard and derive the trend data.
    pub fn refresh(&mut self) {
        self.view = self.dashboard.view();
        let history = &self.view.history.latest.history;
        self.trend = TrendSeries::from_history(history);
        self.stats = HistoryStats::from_history(history);
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn dashboard_mut(&mut self) -> &mut Dashboard {
        &mut self.dashboard
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_MESSAGE_TTL {
                return Some(msg);
            }
        }
        None
    }

    /// Switch to the next view (cycles through Signal → Congestion → Trends).
    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Ask the controller to switch to `phase`.
    ///
    /// Only reports that the request was sent; the signal view shows the
    /// outcome once the next signal poll lands.
    pub fn force_signal(&mut self, phase: SignalPhase) {
        match self.dashboard.force_signal(phase) {
            Ok(_) => self.set_status_message(format!("Requested {} signal", phase)),
            Err(e) => self.set_status_message(e.to_string()),
        }
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the current view to a JSON file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        if self.view.signal.loading && self.view.congestion.loading {
            anyhow::bail!("No data to export");
        }
        Report::from_view(&self.view).write_to(path)
    }
}
