//! Congestion view rendering.
//!
//! Vehicle counts per zone as bars, plus grid occupancy.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::GRID_CELLS;
use crate::policy::{RED_ZONE_LIMIT, YELLOW_ZONE_LIMIT};
use crate::ui::common::placeholder;

/// Render the Congestion view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let feed = &app.view.congestion;
    let outer = Block::default()
        .title(" Congestion ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    if feed.loading {
        let text = placeholder(true, feed.last_error.as_deref());
        frame.render_widget(Paragraph::new(text), inner);
        return;
    }

    let snapshot = &feed.latest;
    let counts = snapshot.zone_counts;

    let [bars, occupancy, summary] = Layout::vertical([
        Constraint::Min(6),
        Constraint::Length(3),
        Constraint::Length(3),
    ])
    .areas(inner);

    let bar = |label: &'static str, value: u32, color: Color| {
        Bar::default()
            .label(Line::from(label))
            .value(u64::from(value))
            .style(Style::default().fg(color))
            .value_style(Style::default().fg(color).add_modifier(Modifier::REVERSED))
    };
    let chart = BarChart::default()
        .data(BarGroup::default().bars(&[
            bar("Green", counts.green, app.theme.green),
            bar("Yellow", counts.yellow, app.theme.yellow),
            bar("Red", counts.red, app.theme.red),
        ]))
        .bar_width(9)
        .bar_gap(3);
    frame.render_widget(chart, bars);

    let cells = snapshot.occupied_grid_cells.min(GRID_CELLS);
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Grid occupancy "))
        .gauge_style(Style::default().fg(app.theme.highlight))
        .ratio(f64::from(cells) / f64::from(GRID_CELLS))
        .label(format!("{}/{} cells", cells, GRID_CELLS));
    frame.render_widget(gauge, occupancy);

    let mut lines = vec![Line::from(vec![
        Span::raw(" Total vehicles: "),
        Span::styled(
            snapshot.total_vehicles.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "   (red > {} or yellow > {} extends green)",
            RED_ZONE_LIMIT, YELLOW_ZONE_LIMIT
        )),
    ])];
    if let Some(err) = &feed.last_error {
        lines.push(Line::from(Span::styled(
            format!(" Stale: {}", err),
            Style::default().fg(app.theme.red),
        )));
    } else if let Some(ts) = snapshot.timestamp {
        lines.push(Line::from(format!(" Reported at {}", ts.format("%H:%M:%S"))));
    }
    frame.render_widget(Paragraph::new(lines), summary);
}
