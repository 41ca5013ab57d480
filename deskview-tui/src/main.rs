//! DeskView TUI: six-panel terminal dashboard.
//!
//! Panels:
//! 1. Cash: desk cash levels
//! 2. Positions: desk/trader/book positions
//! 3. Bonds: bond-level positions
//! 4. Currencies: currency-level positions
//! 5. Exclusions: excluded trades
//! 6. Export: download or generate reports for an event

use std::fs::{self, File};
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use deskview_core::{DashboardConfig, HttpPortfolioApi, PortfolioApi};
use deskview_runner::Dashboard;
use deskview_tui::app::AppState;
use deskview_tui::worker::{self, WorkerCommand, WorkerResponse};
use deskview_tui::{input, persistence, ui};

fn main() -> Result<()> {
    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    // Paths
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("deskview");
    let state_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("deskview")
        .join("state.json");

    init_logging(&data_dir)?;

    // Config: DESKVIEW_CONFIG, else the default location if present, else defaults.
    let config_path = std::env::var_os("DESKVIEW_CONFIG").map(PathBuf::from);
    let config = Arc::new(
        DashboardConfig::load(config_path.as_deref()).context("failed to load configuration")?,
    );
    info!(base_url = %config.base_url, "starting deskview-tui");

    let api: Arc<dyn PortfolioApi> =
        Arc::new(HttpPortfolioApi::new(&config).context("failed to build HTTP client")?);

    // Pollers and export worker
    let dashboard =
        Dashboard::start(&config, Arc::clone(&api)).context("failed to start pollers")?;
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let worker_handle = worker::spawn_worker(cmd_rx, resp_tx, Arc::clone(&api), Arc::clone(&config))
        .context("failed to spawn export worker")?;

    let mut app = AppState::new(Arc::clone(&config), cmd_tx.clone(), resp_rx);
    persistence::apply(&mut app, persistence::load(&state_path));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app, &dashboard);

    // Save state before exit
    let persisted = persistence::extract(&app);
    if let Err(e) = persistence::save(&state_path, &persisted) {
        tracing::warn!(error = %e, "failed to save UI state");
    }

    // Stop pollers, then the worker
    dashboard.stop();
    let _ = cmd_tx.send(WorkerCommand::Shutdown);
    let _ = worker_handle.join();
    info!("deskview-tui stopped");

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn init_logging(data_dir: &std::path::Path) -> Result<()> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;
    let log_path = data_dir.join("deskview.log");
    let file = File::options()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    dashboard: &Dashboard,
) -> Result<()> {
    loop {
        // 1. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 2. Fold in poll results and worker responses (non-blocking)
        for update in dashboard.drain() {
            app.apply_poll(update);
        }
        while let Ok(resp) = app.worker_rx.try_recv() {
            handle_worker_response(app, resp);
        }

        // 3. Header countdown
        app.dashboard.header.countdown.advance(Instant::now());

        // 4. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        // 5. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}

fn handle_worker_response(app: &mut AppState, resp: WorkerResponse) {
    match resp {
        WorkerResponse::ExportDone(outcome) => {
            app.export.in_progress = false;
            app.record_outcome(outcome);
        }
    }
}
