//! DeskView CLI: snapshot, watch, and report export commands.
//!
//! Commands:
//! - `snapshot`: fetch one portfolio view once and print it as a table
//! - `watch`: poll a view every interval and reprint it
//! - `latest`: print the latest event id
//! - `export download`: download (or open) the five reports for an event
//! - `export generate`: ask the backend to generate reports for an event

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use deskview_core::format::render_text_table;
use deskview_core::{parse_target, DashboardConfig, EventId, HttpPortfolioApi, PortfolioApi};
use deskview_runner::{
    spawn_poller, BrowserSink, DirectorySink, ExportOutcome, PollUpdate, ReportExporter,
    ReportSink, Snapshot, ViewId,
};

#[derive(Parser)]
#[command(
    name = "deskview",
    about = "DeskView CLI: portfolio snapshots and report export"
)]
struct Cli {
    /// Path to a TOML config file. Defaults to <config dir>/deskview/config.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend origin, overriding the config file (e.g. http://localhost:8000).
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Raise log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one view once and print it.
    Snapshot {
        #[arg(value_enum)]
        view: ViewArg,
    },
    /// Poll a view every interval and reprint it.
    Watch {
        #[arg(value_enum)]
        view: ViewArg,

        /// Stop after this many refreshes. Runs until interrupted when omitted.
        #[arg(long)]
        count: Option<u64>,
    },
    /// Print the latest event id.
    Latest,
    /// Report export commands.
    Export {
        #[command(subcommand)]
        action: ExportAction,
    },
}

#[derive(Subcommand)]
enum ExportAction {
    /// Download the five reports for an event.
    Download {
        /// Target event id (1..=latest).
        #[arg(allow_hyphen_values = true)]
        target: String,

        /// Open each report URL in the browser instead of saving it.
        #[arg(long, default_value_t = false)]
        browser: bool,

        /// Report directory. Defaults to the configured report_dir.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Skip the confirmation prompt.
        #[arg(short, long, default_value_t = false)]
        yes: bool,
    },
    /// Ask the backend to generate reports for an event.
    Generate {
        /// Target event id (1..=latest).
        #[arg(allow_hyphen_values = true)]
        target: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ViewArg {
    Cash,
    Position,
    Bond,
    Currency,
    Exclusions,
}

impl From<ViewArg> for ViewId {
    fn from(v: ViewArg) -> Self {
        match v {
            ViewArg::Cash => ViewId::Cash,
            ViewArg::Position => ViewId::Position,
            ViewArg::Bond => ViewId::Bond,
            ViewArg::Currency => ViewId::Currency,
            ViewArg::Exclusions => ViewId::Exclusions,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Arc::new(load_config(cli.config, cli.base_url)?);
    let api: Arc<dyn PortfolioApi> =
        Arc::new(HttpPortfolioApi::new(&config).context("failed to build HTTP client")?);

    match cli.command {
        Commands::Snapshot { view } => run_snapshot(api.as_ref(), view.into()),
        Commands::Watch { view, count } => run_watch(api, &config, view.into(), count),
        Commands::Latest => {
            let latest = api
                .latest_event_id()
                .context("failed to fetch latest event id")?;
            println!("{latest}");
            Ok(())
        }
        Commands::Export { action } => match action {
            ExportAction::Download {
                target,
                browser,
                out,
                yes,
            } => run_download(api.as_ref(), &config, &target, browser, out, yes),
            ExportAction::Generate { target } => run_generate(api.as_ref(), &target),
        },
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<PathBuf>, base_url: Option<String>) -> Result<DashboardConfig> {
    let config = DashboardConfig::load(path.as_deref()).context("failed to load configuration")?;
    match base_url {
        Some(url) => config.with_base_url(url).context("invalid --base-url"),
        None => Ok(config),
    }
}

fn print_snapshot(view: ViewId, snapshot: &Snapshot) {
    match snapshot.table() {
        Some(table) => {
            println!("{}", view.feed().label());
            println!("{}", render_text_table(table.headers, &table.rows));
            println!("{} rows", snapshot.len());
        }
        None => {
            if let Snapshot::LatestEvent(id) = snapshot {
                println!("{id}");
            }
        }
    }
}

fn run_snapshot(api: &dyn PortfolioApi, view: ViewId) -> Result<()> {
    let snapshot = Snapshot::fetch(api, view.feed())
        .with_context(|| format!("failed to fetch {} snapshot", view.name()))?;
    print_snapshot(view, &snapshot);
    Ok(())
}

fn run_watch(
    api: Arc<dyn PortfolioApi>,
    config: &DashboardConfig,
    view: ViewId,
    count: Option<u64>,
) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let handle = spawn_poller(view.name(), config.poll_interval(), tx, move |seq| PollUpdate {
        view,
        seq,
        received_at: Local::now(),
        result: Snapshot::fetch(api.as_ref(), view.feed()),
    })
    .context("failed to start poller")?;

    let mut refreshes = 0u64;
    for update in rx.iter() {
        println!(
            "== {} @ {} (refresh {}) ==",
            view.name(),
            update.received_at.format("%H:%M:%S"),
            update.seq + 1
        );
        match &update.result {
            Ok(snapshot) => print_snapshot(view, snapshot),
            // Keep polling; the next refresh may succeed.
            Err(e) => warn!(view = view.name(), error = %e, "refresh failed"),
        }
        refreshes += 1;
        if count.is_some_and(|n| refreshes >= n) {
            break;
        }
    }

    handle.join();
    Ok(())
}

/// Reject malformed or non-positive targets before touching the network,
/// then fetch the latest id for the upper-bound check.
fn latest_for_target(api: &dyn PortfolioApi, target: &str) -> Result<EventId> {
    parse_target(target)?;
    api.latest_event_id()
        .context("failed to fetch latest event id; cannot validate target")
}

fn confirm_on_stdin(target: EventId, sink: &str) -> bool {
    let verb = if sink == "browser" { "open" } else { "download" };
    eprint!("This will {verb} 5 reports for event {target}. Continue? [y/N] ");
    let _ = io::stderr().flush();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes" | "YES")
}

fn run_download(
    api: &dyn PortfolioApi,
    config: &DashboardConfig,
    target: &str,
    browser: bool,
    out: Option<PathBuf>,
    yes: bool,
) -> Result<()> {
    let latest = latest_for_target(api, target)?;
    let exporter = ReportExporter::new(api);

    let mut browser_sink;
    let mut dir_sink;
    let sink: &mut dyn ReportSink = if browser {
        browser_sink = BrowserSink::new(config.opener.clone());
        &mut browser_sink
    } else {
        dir_sink = DirectorySink::new(api, out.unwrap_or_else(|| config.report_dir.clone()));
        &mut dir_sink
    };
    let sink_name = sink.name().to_string();

    let outcome = exporter.download(
        target,
        Some(latest),
        |t| yes || confirm_on_stdin(t, &sink_name),
        sink,
    );
    report_outcome(outcome)
}

fn run_generate(api: &dyn PortfolioApi, target: &str) -> Result<()> {
    let latest = latest_for_target(api, target)?;
    let outcome = ReportExporter::new(api).submit_generate(target, Some(latest));
    report_outcome(outcome)
}

fn report_outcome(outcome: ExportOutcome) -> Result<()> {
    if let ExportOutcome::Downloaded { deliveries, .. } = &outcome {
        for d in deliveries {
            match &d.result {
                Ok(where_to) => println!("  ok    {:<26} {where_to}", d.kind.report_type()),
                Err(e) => eprintln!("  FAIL  {:<26} {e}", d.kind.report_type()),
            }
        }
    }
    match &outcome {
        ExportOutcome::Rejected(e) => bail!("{e}"),
        ExportOutcome::Cancelled { .. } | ExportOutcome::Generated { .. } => {}
        _ if !outcome.is_success() => bail!(outcome.summary()),
        _ => {}
    }
    println!("{}", outcome.summary());
    Ok(())
}
