//! Background worker thread: export actions run here so the UI never waits
//! on the network.
//!
//! Communication with the TUI main thread is via `mpsc` channels. Targets
//! arrive already validated.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info};

use deskview_core::{DashboardConfig, EventId, PortfolioApi};
use deskview_runner::{BrowserSink, DirectorySink, ExportOutcome, ReportExporter};

/// Commands sent from the TUI to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerCommand {
    Download { target: EventId, browser: bool },
    Generate { target: EventId },
    Shutdown,
}

/// Responses sent from the worker back to the TUI.
#[derive(Debug, Clone)]
pub enum WorkerResponse {
    ExportDone(ExportOutcome),
}

/// Spawn the export worker thread.
pub fn spawn_worker(
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    api: Arc<dyn PortfolioApi>,
    config: Arc<DashboardConfig>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("deskview-worker".into())
        .spawn(move || worker_loop(rx, tx, api.as_ref(), &config))
}

fn worker_loop(
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    api: &dyn PortfolioApi,
    config: &DashboardConfig,
) {
    loop {
        match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(cmd) => {
                let Some(outcome) = handle_command(cmd, api, config) else {
                    continue;
                };
                if tx.send(WorkerResponse::ExportDone(outcome)).is_err() {
                    break;
                }
            }
        }
    }
    debug!("export worker stopped");
}

fn handle_command(
    cmd: WorkerCommand,
    api: &dyn PortfolioApi,
    config: &DashboardConfig,
) -> Option<ExportOutcome> {
    let exporter = ReportExporter::new(api);
    let outcome = match cmd {
        WorkerCommand::Download { target, browser: true } => {
            let mut sink = BrowserSink::new(config.opener.clone());
            exporter.deliver_all(target, &mut sink)
        }
        WorkerCommand::Download { target, browser: false } => {
            let mut sink = DirectorySink::new(api, &config.report_dir);
            exporter.deliver_all(target, &mut sink)
        }
        WorkerCommand::Generate { target } => exporter.generate(target),
        WorkerCommand::Shutdown => return None, // handled in loop
    };
    info!(success = outcome.is_success(), "{}", outcome.summary());
    Some(outcome)
}
