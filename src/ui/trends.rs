//! Trends view rendering.
//!
//! Chart of zone counts over the history window, with summary statistics.
//! Reads the history feed only.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::history::total_sparkline;
use crate::ui::common::placeholder;

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render the Trends view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let feed = &app.view.history;
    let [chart_area, stats_area] =
        Layout::vertical([Constraint::Min(8), Constraint::Length(6)]).areas(area);

    let block = Block::default()
        .title(" Congestion history ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if app.trend.is_empty() {
        let text = if feed.loading {
            placeholder(true, feed.last_error.as_deref())
        } else {
            "No history recorded yet".to_string()
        };
        frame.render_widget(Paragraph::new(text).block(block), chart_area);
        render_stats(frame, app, stats_area);
        return;
    }

    let trend = &app.trend;
    let datasets = vec![
        dataset("green", &trend.green, app.theme.green),
        dataset("yellow", &trend.yellow, app.theme.yellow),
        dataset("red", &trend.red, app.theme.red),
        dataset("total", &trend.total, app.theme.total),
    ];

    let x_max = (trend.len().saturating_sub(1)).max(1) as f64;
    let y_max = (trend.max_value.max(1) as f64 * 1.1).ceil();
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .labels(trend.labels.iter().map(|l| Span::raw(l.clone())).collect::<Vec<_>>())
                .style(Style::default().fg(app.theme.border)),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format!("{}", (y_max / 2.0).round())),
                    Span::raw(format!("{}", y_max)),
                ])
                .style(Style::default().fg(app.theme.border)),
        );
    frame.render_widget(chart, chart_area);

    render_stats(frame, app, stats_area);
}

fn dataset<'a>(name: &'a str, data: &'a [(f64, f64)], color: ratatui::style::Color) -> Dataset<'a> {
    Dataset::default()
        .name(name)
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(data)
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Statistics ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let Some(stats) = &app.stats else {
        frame.render_widget(Paragraph::new(" -").block(block), area);
        return;
    };

    let sparkline: String = total_sparkline(&app.view.history.latest.history)
        .iter()
        .map(|&level| SPARKLINE_CHARS[level as usize])
        .collect();

    let lines = vec![
        Line::from(vec![
            Span::raw(format!(" {} samples  avg ", stats.entries)),
            Span::styled(format!("{:.2}", stats.avg_green), Style::default().fg(app.theme.green)),
            Span::raw(" / "),
            Span::styled(format!("{:.2}", stats.avg_yellow), Style::default().fg(app.theme.yellow)),
            Span::raw(" / "),
            Span::styled(format!("{:.2}", stats.avg_red), Style::default().fg(app.theme.red)),
            Span::raw(format!("  total {:.2}  peak {}", stats.avg_total, stats.peak_total)),
        ]),
        Line::from(format!(
            " Signal while sampled: green {}  yellow {}  red {}",
            stats.phase_counts[0], stats.phase_counts[1], stats.phase_counts[2]
        )),
        Line::from(vec![
            Span::raw(" Total "),
            Span::styled(sparkline, Style::default().fg(app.theme.highlight)),
        ]),
        Line::from(Span::styled(
            format!(" Source: {}", app.view.source),
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
