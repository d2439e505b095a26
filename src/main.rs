use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use signalwatch::app::{App, View};
use signalwatch::config::{Overrides, Settings};
use signalwatch::{events, ui, Dashboard, HttpTrafficApi, Report, TrafficApi};

/// Redraw period of the TUI loop.
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "signalwatch")]
#[command(about = "Operations dashboard for an adaptive traffic-signal controller")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL (e.g., http://localhost:5000)
    #[arg(short, long)]
    backend: Option<String>,

    /// Seed for simulated data, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Consecutive failed health checks before switching to simulated data
    #[arg(long)]
    failure_threshold: Option<u32>,

    /// Write logs to this file (the TUI owns the terminal)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Read every endpoint once, write a JSON report to this file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = Overrides {
        backend_url: args.backend,
        seed: args.seed,
        failure_threshold: args.failure_threshold,
        log_file: args.log_file,
    };
    let settings = Settings::load(args.config.as_deref(), &overrides)?;

    // Export mode logs to stderr; the TUI only logs when a file is configured
    let _guard = init_tracing(settings.log_file.as_deref(), args.export.is_some())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let api: Arc<dyn TrafficApi> =
        Arc::new(HttpTrafficApi::new(&settings.backend_url, settings.request_timeout)?);

    // Handle export mode (non-interactive)
    if let Some(export_path) = args.export {
        return runtime.block_on(export_to_file(api.as_ref(), &export_path));
    }

    runtime.block_on(run_tui(api, settings))
}

fn init_tracing(log_file: Option<&Path>, to_stderr: bool) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("signalwatch=info"));

    let (writer, guard) = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_appender::non_blocking(file)
        }
        None if to_stderr => tracing_appender::non_blocking(io::stderr()),
        None => return Ok(None),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(log_file.is_none())
        .with_target(true)
        .try_init();

    Ok(Some(guard))
}

/// Run the TUI against the backend, falling back to simulated data when needed
async fn run_tui(api: Arc<dyn TrafficApi>, settings: Settings) -> Result<()> {
    let mut dashboard = Dashboard::new(api, &settings);
    dashboard.start();
    info!(backend = %settings.backend_url, "dashboard running");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let mut app = App::new(dashboard);

    // Run the main loop
    let result = run_app(&mut terminal, &mut app).await;

    app.dashboard_mut().stop();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 16;

    while app.running {
        app.refresh();

        terminal.draw(|frame| {
            let area = frame.area();

            // Check for minimum terminal size
            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered = ratatui::layout::Rect::new(
                    0,
                    (area.height / 2).saturating_sub(2),
                    area.width,
                    5.min(area.height),
                );
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(12),   // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);

            match app.current_view {
                View::Signal => ui::signal::render(frame, app, chunks[2]),
                View::Congestion => ui::congestion::render(frame, app, chunks[2]),
                View::Trends => ui::trends::render(frame, app, chunks[2]),
            }

            ui::common::render_status_bar(frame, app, chunks[3]);

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Drain pending input without blocking the runtime
        while let Some(event) = events::poll_event(Duration::ZERO)? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                _ => {}
            }
        }

        // Yield so polling tasks run between frames
        tokio::time::sleep(FRAME_INTERVAL).await;
    }

    Ok(())
}

/// Read the backend once and write a JSON report
async fn export_to_file(api: &dyn TrafficApi, export_path: &Path) -> Result<()> {
    let report = Report::fetch(api).await?;
    report.write_to(export_path)?;

    println!("Exported signal state to: {}", export_path.display());
    Ok(())
}
