//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::duration::format_duration;
use crate::data::OperatingMode;
use crate::source::HealthIndicator;

/// Render the header bar with mode and backend health.
///
/// Displays: mode badge, camera, controller and system indicators, source.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let view = &app.view;

    let mode = if view.pending {
        Span::styled(" CHECKING ", Style::default().add_modifier(Modifier::DIM | Modifier::BOLD))
    } else {
        Span::styled(format!(" {} ", view.mode.label()), app.theme.mode_style(view.mode))
    };

    let mut spans = vec![
        mode,
        Span::styled(" SIGNALWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
    ];
    spans.extend(indicator("camera", view.health.camera_active(), app));
    spans.extend(indicator("controller", view.health.controller_active(), app));
    spans.extend(indicator("system", view.health.system_healthy(), app));
    spans.push(Span::raw("│ "));
    spans.push(Span::styled(
        view.source.clone(),
        Style::default().add_modifier(Modifier::DIM),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn indicator<'a>(label: &'a str, active: Option<bool>, app: &App) -> [Span<'a>; 2] {
    let symbol = match active {
        Some(true) => "●",
        Some(false) => "✖",
        None => "○",
    };
    [
        Span::styled(symbol, app.theme.indicator_style(active)),
        Span::raw(format!(" {}  ", label)),
    ]
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, v)| Line::from(format!(" {}:{} ", i + 1, v.label())))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.current_view.index())
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows: feed errors or data age, available controls.
/// Also displays temporary status messages.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Check for temporary status message first
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let view = &app.view;
    let controls = match view.mode {
        OperatingMode::Live => "g/y/r:force Tab:switch e:export ?:help q:quit",
        OperatingMode::Simulated => "Tab:switch e:export ?:help q:quit",
    };

    let errors: Vec<String> = [
        ("signal", &view.signal.last_error),
        ("congestion", &view.congestion.last_error),
        ("history", &view.history.last_error),
    ]
    .iter()
    .filter_map(|(name, err)| err.as_ref().map(|e| format!("{}: {}", name, e)))
    .collect();

    let (status, style) = if !errors.is_empty() {
        (
            format!(" {} | {}", errors.join(" | "), controls),
            Style::default().fg(app.theme.red),
        )
    } else if let Some(age) = view.signal.age() {
        (
            format!(" Updated {} ago | {}", format_duration(age), controls),
            Style::default().add_modifier(Modifier::DIM),
        )
    } else {
        (
            format!(" Loading... | {}", controls),
            Style::default().add_modifier(Modifier::DIM),
        )
    };

    frame.render_widget(Paragraph::new(status).style(style), area);
}

/// Text shown when a feed has nothing to display yet.
pub fn placeholder(loading: bool, error: Option<&str>) -> String {
    match (loading, error) {
        (true, Some(err)) => format!("Waiting for data ({})", err),
        (true, None) => "Loading...".to_string(),
        _ => String::new(),
    }
}

/// Describe the health indicator in one line.
pub fn health_summary(health: &HealthIndicator) -> String {
    match health {
        HealthIndicator::Unknown => "Checking backend...".to_string(),
        HealthIndicator::Reported(report) => format!("Backend status: {}", report.status),
        HealthIndicator::Unreachable(err) => format!("Backend unreachable: {}", err),
    }
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Navigation",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  Tab/←→      Switch view"),
        Line::from("  1/2/3       Signal/Congestion/Trends"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Signal override (live only)",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  g           Force green"),
        Line::from("  y           Force yellow"),
        Line::from("  r           Force red"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  e           Export to JSON"),
        Line::from("  q/Esc       Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 20u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
