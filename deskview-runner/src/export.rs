//! Report export: validate a target event id, then either hand the five
//! report requests to a sink or ask the server to generate them.
//!
//! Validation runs once per submission. A rejected id never reaches the
//! backend. Sink failures on one report do not stop the remaining ones.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use thiserror::Error;
use tracing::{info, warn};

use deskview_core::{validate_target_id, ApiError, EventId, PortfolioApi, ReportKind, ValidationError};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("failed to write {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("failed to open {url}: {message}")]
    Open { url: String, message: String },
}

/// One report to hand off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub kind: ReportKind,
    pub target: EventId,
    pub url: String,
}

/// Where downloaded reports go.
pub trait ReportSink {
    fn name(&self) -> &str;

    /// Deliver one report; returns a short description of where it went.
    fn deliver(&mut self, request: &ReportRequest) -> Result<String, ExportError>;
}

/// Opens each report URL with the platform's URL opener, leaving the
/// download itself to the browser.
#[derive(Debug, Clone, Default)]
pub struct BrowserSink {
    opener: Option<String>,
}

impl BrowserSink {
    /// `opener` is a command line such as `"firefox --new-tab"`; the URL is
    /// appended as the last argument.
    pub fn new(opener: Option<String>) -> Self {
        Self { opener }
    }

    fn command(&self, url: &str) -> Command {
        if let Some(opener) = self.opener.as_deref().filter(|s| !s.trim().is_empty()) {
            let mut parts = opener.split_whitespace();
            let program = parts.next().unwrap_or(opener);
            let mut cmd = Command::new(program);
            cmd.args(parts).arg(url);
            return cmd;
        }
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(url);
            cmd
        } else if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", ""]).arg(url);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(url);
            cmd
        }
    }
}

impl ReportSink for BrowserSink {
    fn name(&self) -> &str {
        "browser"
    }

    /// Spawns the opener and returns at once. Only a failure to start the
    /// process counts; the child's exit status is not inspected.
    fn deliver(&mut self, request: &ReportRequest) -> Result<String, ExportError> {
        let mut child = self
            .command(&request.url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ExportError::Open {
                url: request.url.clone(),
                message: e.to_string(),
            })?;
        // Reap in the background so a long-lived opener leaves no zombie.
        thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(format!("opened {}", request.url))
    }
}

/// Fetches each report and writes it under `<root>/output_<target>/`.
pub struct DirectorySink<'a> {
    api: &'a dyn PortfolioApi,
    root: PathBuf,
}

impl<'a> DirectorySink<'a> {
    pub fn new(api: &'a dyn PortfolioApi, root: impl Into<PathBuf>) -> Self {
        Self {
            api,
            root: root.into(),
        }
    }

    pub fn target_dir(&self, target: EventId) -> PathBuf {
        self.root.join(format!("output_{target}"))
    }
}

impl ReportSink for DirectorySink<'_> {
    fn name(&self) -> &str {
        "directory"
    }

    fn deliver(&mut self, request: &ReportRequest) -> Result<String, ExportError> {
        let report = self.api.download_report(request.kind, request.target)?;
        let dir = self.target_dir(request.target);
        fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;
        let path = dir.join(&report.filename);
        fs::write(&path, &report.body).map_err(|e| io_error(&path, e))?;
        let rows = count_csv_rows(&report.body);
        Ok(format!("{} ({rows} rows)", path.display()))
    }
}

fn io_error(path: &Path, e: std::io::Error) -> ExportError {
    ExportError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Data rows in a CSV body, header excluded. Malformed rows are not counted.
pub fn count_csv_rows(body: &[u8]) -> usize {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body)
        .records()
        .filter(Result::is_ok)
        .count()
}

/// Result of delivering one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDelivery {
    pub kind: ReportKind,
    pub url: String,
    pub result: Result<String, String>,
}

/// What one export submission came to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Input failed validation; no request was made.
    Rejected(ValidationError),
    /// User declined the download confirmation; no request was made.
    Cancelled { target: EventId },
    Downloaded {
        target: EventId,
        deliveries: Vec<ReportDelivery>,
    },
    /// Server reply, verbatim.
    Generated { target: EventId, message: String },
    GenerateFailed { target: EventId, error: String },
}

impl ExportOutcome {
    pub fn is_success(&self) -> bool {
        match self {
            ExportOutcome::Downloaded { deliveries, .. } => {
                deliveries.iter().all(|d| d.result.is_ok())
            }
            ExportOutcome::Generated { .. } => true,
            _ => false,
        }
    }

    /// One-line summary for a status bar or terminal.
    pub fn summary(&self) -> String {
        match self {
            ExportOutcome::Rejected(e) => e.to_string(),
            ExportOutcome::Cancelled { target } => format!("Download of event {target} cancelled"),
            ExportOutcome::Downloaded { target, deliveries } => {
                let ok = deliveries.iter().filter(|d| d.result.is_ok()).count();
                format!(
                    "Downloaded {ok}/{} reports for event {target}",
                    deliveries.len()
                )
            }
            ExportOutcome::Generated { message, .. } => message.clone(),
            ExportOutcome::GenerateFailed { target, error } => {
                format!("Generating reports for event {target} failed: {error}")
            }
        }
    }
}

/// Drives both export actions against one backend.
pub struct ReportExporter<'a> {
    api: &'a dyn PortfolioApi,
}

impl<'a> ReportExporter<'a> {
    pub fn new(api: &'a dyn PortfolioApi) -> Self {
        Self { api }
    }

    /// The five requests for a target, in report order.
    pub fn requests(&self, target: EventId) -> Vec<ReportRequest> {
        ReportKind::ALL
            .iter()
            .map(|&kind| ReportRequest {
                kind,
                target,
                url: self.api.report_url(kind, target),
            })
            .collect()
    }

    /// Validate, confirm, then deliver all five reports.
    pub fn download(
        &self,
        input: &str,
        latest: Option<EventId>,
        confirm: impl FnOnce(EventId) -> bool,
        sink: &mut dyn ReportSink,
    ) -> ExportOutcome {
        let target = match validate_target_id(input, latest) {
            Ok(t) => t,
            Err(e) => return ExportOutcome::Rejected(e),
        };
        if !confirm(target) {
            info!(%target, "report download cancelled");
            return ExportOutcome::Cancelled { target };
        }
        self.deliver_all(target, sink)
    }

    /// Deliver all five reports for an already validated target.
    pub fn deliver_all(&self, target: EventId, sink: &mut dyn ReportSink) -> ExportOutcome {
        info!(%target, sink = sink.name(), "downloading reports");
        let deliveries = self
            .requests(target)
            .into_iter()
            .map(|request| {
                let result = sink.deliver(&request).map_err(|e| {
                    warn!(report = request.kind.report_type(), %target, error = %e, "report delivery failed");
                    e.to_string()
                });
                ReportDelivery {
                    kind: request.kind,
                    url: request.url,
                    result,
                }
            })
            .collect();
        ExportOutcome::Downloaded { target, deliveries }
    }

    /// Validate, then ask the server to generate reports.
    pub fn submit_generate(&self, input: &str, latest: Option<EventId>) -> ExportOutcome {
        match validate_target_id(input, latest) {
            Ok(target) => self.generate(target),
            Err(e) => ExportOutcome::Rejected(e),
        }
    }

    /// One generate request for an already validated target.
    pub fn generate(&self, target: EventId) -> ExportOutcome {
        info!(%target, "requesting report generation");
        match self.api.generate_reports(target) {
            Ok(message) => ExportOutcome::Generated { target, message },
            Err(e) => {
                warn!(%target, error = %e, "report generation failed");
                ExportOutcome::GenerateFailed {
                    target,
                    error: e.to_string(),
                }
            }
        }
    }
}
