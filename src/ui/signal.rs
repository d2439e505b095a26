//! Signal view rendering.
//!
//! Shows the current phase with its countdown, how the green duration was
//! derived, and what a manual override would do.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::{OperatingMode, SignalPhase, SignalState};
use crate::policy;
use crate::ui::common::{health_summary, placeholder};

/// Render the Signal view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let [left, right] =
        Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)]).areas(area);

    render_phase(frame, app, left);
    render_timing(frame, app, right);
}

fn block<'a>(title: &'a str, app: &App) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
}

fn render_phase(frame: &mut Frame, app: &App, area: Rect) {
    let feed = &app.view.signal;
    let outer = block(" Signal ", app);
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    if feed.loading {
        let text = placeholder(true, feed.last_error.as_deref());
        frame.render_widget(Paragraph::new(text), inner);
        return;
    }

    let signal = &feed.latest;
    let [lamps, countdown, details] = Layout::vertical([
        Constraint::Length(5),
        Constraint::Length(3),
        Constraint::Min(2),
    ])
    .areas(inner);

    frame.render_widget(Paragraph::new(lamp_lines(signal.phase, app)), lamps);

    let ratio = if signal.configured_duration == 0 {
        0.0
    } else {
        (signal.time_remaining as f64 / signal.configured_duration as f64).clamp(0.0, 1.0)
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Remaining "))
        .gauge_style(Style::default().fg(app.theme.phase_color(signal.phase)))
        .ratio(ratio)
        .label(format!("{}s / {}s", signal.time_remaining, signal.configured_duration));
    frame.render_widget(gauge, countdown);

    let mut lines = vec![Line::from(vec![
        Span::raw(" Phase: "),
        Span::styled(signal.phase.label(), app.theme.phase_style(signal.phase)),
    ])];
    if let Some(ts) = signal.timestamp {
        lines.push(Line::from(format!(" Reported at {}", ts.format("%H:%M:%S"))));
    }
    if let Some(err) = &feed.last_error {
        lines.push(Line::from(Span::styled(
            format!(" Stale: {}", err),
            Style::default().fg(app.theme.red),
        )));
    }
    frame.render_widget(Paragraph::new(lines), details);
}

/// Three stacked lamps with only the active phase lit.
fn lamp_lines(active: SignalPhase, app: &App) -> Vec<Line<'static>> {
    SignalPhase::ALL
        .iter()
        .map(|&phase| {
            let (symbol, style) = if phase == active {
                ("  ██████  ", app.theme.phase_style(phase))
            } else {
                ("  ░░░░░░  ", Style::default().add_modifier(Modifier::DIM))
            };
            Line::from(vec![
                Span::styled(symbol, style),
                Span::styled(format!(" {}", phase.label()), style),
            ])
        })
        .collect()
}

fn render_timing(frame: &mut Frame, app: &App, area: Rect) {
    let view = &app.view;
    let congestion = &view.congestion.latest;
    let signal = &view.signal.latest;
    let timing = &view.timing;
    let rule = policy::active_rule(congestion);

    let mut lines = vec![
        Line::from(vec![
            Span::raw(" Dynamic green: "),
            Span::styled(
                format!("{}s", signal.dynamic_green_duration),
                app.theme.phase_style(SignalPhase::Green),
            ),
        ]),
        Line::from(format!(
            " Cycle: green {}s → yellow {}s → red {}s",
            timing.duration_for(SignalPhase::Green, congestion),
            timing.yellow,
            timing.red
        )),
    ];

    if !view.signal.loading {
        let next = signal.advanced(timing, congestion);
        lines.push(Line::from(format!(
            " Next: {} for {}s",
            next.phase.label(),
            next.configured_duration
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" Green time rule", app.theme.header)));
    for (i, text) in policy::rule_lines().iter().enumerate() {
        let style = if i == rule && !view.congestion.loading {
            Style::default().fg(app.theme.highlight).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        let marker = if i == rule { "▶" } else { " " };
        lines.push(Line::from(Span::styled(format!(" {} {}", marker, text), style)));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" Manual override", app.theme.header)));
    match view.mode {
        OperatingMode::Live => {
            for (key, phase) in [('g', SignalPhase::Green), ('y', SignalPhase::Yellow), ('r', SignalPhase::Red)] {
                let forced = SignalState::overridden(phase, timing, congestion);
                lines.push(Line::from(vec![
                    Span::raw(format!("  {}  ", key)),
                    Span::styled(phase.label(), app.theme.phase_style(phase)),
                    Span::raw(format!(" for {}s", forced.configured_duration)),
                ]));
            }
        }
        OperatingMode::Simulated => {
            lines.push(Line::from(Span::styled(
                "  Unavailable while showing simulated data",
                Style::default().add_modifier(Modifier::DIM),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(format!(" {}", health_summary(&view.health))));
    if let Some(url) = &view.live_feed_url {
        lines.push(Line::from(Span::styled(
            format!(" Camera feed: {}", url),
            Style::default().add_modifier(Modifier::DIM),
        )));
    }

    frame.render_widget(Paragraph::new(lines).block(block(" Timing ", app)), area);
}
