//! Application state: single-owner, main-thread only.
//!
//! All TUI state lives here, including every view's polled data. Pollers
//! and the export worker communicate via channels.

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use deskview_core::{validate_target_id, DashboardConfig, EventId};
use deskview_runner::{DashboardState, ExportOutcome, PollUpdate, ViewId};

use crate::worker::{WorkerCommand, WorkerResponse};

pub const ERROR_HISTORY_CAP: usize = 50;
const EXPORT_LOG_CAP: usize = 20;
/// Longest target id input accepted from the keyboard.
pub const TARGET_INPUT_MAX: usize = 19;

/// Which panel is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Panel {
    Cash,
    Positions,
    Bonds,
    Currencies,
    Exclusions,
    Export,
}

impl Panel {
    pub const COUNT: usize = 6;

    pub fn index(self) -> usize {
        match self {
            Panel::Cash => 0,
            Panel::Positions => 1,
            Panel::Bonds => 2,
            Panel::Currencies => 3,
            Panel::Exclusions => 4,
            Panel::Export => 5,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Panel::Cash),
            1 => Some(Panel::Positions),
            2 => Some(Panel::Bonds),
            3 => Some(Panel::Currencies),
            4 => Some(Panel::Exclusions),
            5 => Some(Panel::Export),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Panel::Cash => "Cash",
            Panel::Positions => "Positions",
            Panel::Bonds => "Bonds",
            Panel::Currencies => "Currencies",
            Panel::Exclusions => "Exclusions",
            Panel::Export => "Export",
        }
    }

    /// The polled table shown by this panel, if any.
    pub fn view(self) -> Option<ViewId> {
        match self {
            Panel::Cash => Some(ViewId::Cash),
            Panel::Positions => Some(ViewId::Position),
            Panel::Bonds => Some(ViewId::Bond),
            Panel::Currencies => Some(ViewId::Currency),
            Panel::Exclusions => Some(ViewId::Exclusions),
            Panel::Export => None,
        }
    }

    pub fn next(self) -> Panel {
        Self::cycle(self.index() + 1)
    }

    pub fn prev(self) -> Panel {
        Self::cycle(self.index() + Self::COUNT - 1)
    }

    fn cycle(i: usize) -> Panel {
        Panel::from_index(i % Self::COUNT).unwrap_or(Panel::Cash)
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// An error record for the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    pub context: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Validation,
    Export,
    Other,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Network => "NET",
            ErrorCategory::Validation => "INPUT",
            ErrorCategory::Export => "EXPORT",
            ErrorCategory::Other => "ERR",
        }
    }
}

/// One line in the export panel's log.
#[derive(Debug, Clone)]
pub struct ExportLogEntry {
    pub timestamp: NaiveDateTime,
    pub ok: bool,
    pub text: String,
}

/// Export panel state.
#[derive(Debug, Default)]
pub struct ExportPanelState {
    pub input: String,
    /// Last target id that passed validation.
    pub last_target: Option<EventId>,
    /// Open reports in the browser instead of saving them.
    pub use_browser: bool,
    pub in_progress: bool,
    pub log: VecDeque<ExportLogEntry>,
}

impl ExportPanelState {
    pub fn push_digit(&mut self, c: char) {
        if c.is_ascii_digit() && self.input.len() < TARGET_INPUT_MAX {
            self.input.push(c);
        }
    }

    pub fn push_log(&mut self, ok: bool, text: String) {
        self.log.push_front(ExportLogEntry {
            timestamp: chrono::Local::now().naive_local(),
            ok,
            text,
        });
        self.log.truncate(EXPORT_LOG_CAP);
    }
}

/// Which overlay (if any) is shown on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    None,
    ErrorHistory,
    /// Waiting for the user to confirm a five-report download.
    ConfirmDownload(EventId),
}

/// Top-level application state.
pub struct AppState {
    // Navigation
    pub active_panel: Panel,
    pub running: bool,

    // Polled data
    pub dashboard: DashboardState,
    /// Scroll offset per table panel, indexed by `Panel::index`.
    pub scroll: [usize; 5],

    pub export: ExportPanelState,

    // Worker communication
    pub worker_tx: Sender<WorkerCommand>,
    pub worker_rx: Receiver<WorkerResponse>,

    // Cross-cutting
    pub config: Arc<DashboardConfig>,
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,
    pub overlay: Overlay,
}

impl AppState {
    pub fn new(
        config: Arc<DashboardConfig>,
        worker_tx: Sender<WorkerCommand>,
        worker_rx: Receiver<WorkerResponse>,
    ) -> Self {
        Self {
            active_panel: Panel::Cash,
            running: true,
            dashboard: DashboardState::new(&config),
            scroll: [0; 5],
            export: ExportPanelState::default(),
            worker_tx,
            worker_rx,
            config,
            status_message: None,
            error_history: VecDeque::with_capacity(ERROR_HISTORY_CAP),
            error_scroll: 0,
            overlay: Overlay::None,
        }
    }

    /// Push an error to the history, capping at 50.
    pub fn push_error(&mut self, category: ErrorCategory, message: String, context: String) {
        let record = ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.clone(),
            context,
        };
        self.error_history.push_front(record);
        if self.error_history.len() > ERROR_HISTORY_CAP {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }

    /// Fold a poll result into view state.
    ///
    /// Only the first failure of a streak goes to the error history; later
    /// ones just refresh the status line.
    pub fn apply_poll(&mut self, update: PollUpdate) {
        let view = update.view;
        if let Err(message) = self.dashboard.apply(update) {
            if self.failure_streak(view) == 1 {
                self.push_error(ErrorCategory::Network, message, format!("{} poll", view.name()));
            } else {
                self.set_warning(format!("{} stale: {message}", view.name()));
            }
        }
    }

    fn failure_streak(&self, view: ViewId) -> u32 {
        let d = &self.dashboard;
        match view {
            ViewId::Cash => d.cash.consecutive_failures(),
            ViewId::Position => d.positions.consecutive_failures(),
            ViewId::Bond => d.bonds.consecutive_failures(),
            ViewId::Currency => d.currencies.consecutive_failures(),
            ViewId::Exclusions => d.exclusions.consecutive_failures(),
            ViewId::Header => d.header.latest.consecutive_failures(),
            ViewId::Exporter => d.exporter_latest.consecutive_failures(),
        }
    }

    /// Validate the typed target id; `None` (with the reason recorded) when rejected.
    fn validated_target(&mut self) -> Option<EventId> {
        match validate_target_id(&self.export.input, self.dashboard.latest_for_export()) {
            Ok(target) => {
                self.export.last_target = Some(target);
                Some(target)
            }
            Err(e) => {
                let text = e.to_string();
                self.export.push_log(false, text.clone());
                self.push_error(ErrorCategory::Validation, text, "export".into());
                None
            }
        }
    }

    /// `d` on the export panel: validate, then ask for confirmation.
    pub fn submit_download(&mut self) {
        if self.export.in_progress {
            self.set_warning("An export is already running");
            return;
        }
        if let Some(target) = self.validated_target() {
            self.overlay = Overlay::ConfirmDownload(target);
        }
    }

    /// Confirmation accepted: hand the download to the worker.
    pub fn confirm_download(&mut self, target: EventId) {
        self.overlay = Overlay::None;
        let browser = self.export.use_browser;
        if self
            .worker_tx
            .send(WorkerCommand::Download { target, browser })
            .is_ok()
        {
            self.export.in_progress = true;
            self.set_status(format!("Downloading 5 reports for event {target}..."));
        } else {
            self.push_error(ErrorCategory::Other, "export worker is not running".into(), String::new());
        }
    }

    pub fn decline_download(&mut self, target: EventId) {
        self.overlay = Overlay::None;
        self.record_outcome(ExportOutcome::Cancelled { target });
    }

    /// `g` on the export panel: validate, then ask the server to generate.
    pub fn submit_generate(&mut self) {
        if self.export.in_progress {
            self.set_warning("An export is already running");
            return;
        }
        let Some(target) = self.validated_target() else {
            return;
        };
        if self.worker_tx.send(WorkerCommand::Generate { target }).is_ok() {
            self.export.in_progress = true;
            self.set_status(format!("Generating reports for event {target}..."));
        } else {
            self.push_error(ErrorCategory::Other, "export worker is not running".into(), String::new());
        }
    }

    /// Surface an export outcome in the status bar and export log.
    pub fn record_outcome(&mut self, outcome: ExportOutcome) {
        let summary = outcome.summary();
        match &outcome {
            ExportOutcome::Downloaded { deliveries, .. } => {
                for d in deliveries {
                    let (ok, text) = match &d.result {
                        Ok(where_to) => (true, format!("{}: {where_to}", d.kind.report_type())),
                        Err(e) => (false, format!("{}: {e}", d.kind.report_type())),
                    };
                    self.export.push_log(ok, text);
                }
            }
            _ => self.export.push_log(outcome.is_success(), summary.clone()),
        }
        match outcome {
            ExportOutcome::Generated { .. } => self.set_status(summary),
            ExportOutcome::Downloaded { .. } if outcome.is_success() => self.set_status(summary),
            ExportOutcome::Downloaded { .. } | ExportOutcome::Cancelled { .. } => {
                self.set_warning(summary)
            }
            ExportOutcome::GenerateFailed { .. } => {
                self.push_error(ErrorCategory::Export, summary, "generate".into())
            }
            ExportOutcome::Rejected(_) => {
                self.push_error(ErrorCategory::Validation, summary, "export".into())
            }
        }
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let Some(view) = self.active_panel.view() else {
            return;
        };
        let rows = self.dashboard.freshness(view).0;
        let i = self.active_panel.index();
        let max = rows.saturating_sub(1);
        let next = self.scroll[i] as isize + delta;
        self.scroll[i] = next.clamp(0, max as isize) as usize;
    }

    pub fn scroll_to(&mut self, top: bool) {
        if let Some(view) = self.active_panel.view() {
            let rows = self.dashboard.freshness(view).0;
            self.scroll[self.active_panel.index()] = if top { 0 } else { rows.saturating_sub(1) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::test_app;
    use chrono::Local;
    use deskview_core::ApiError;
    use deskview_runner::Snapshot;

    fn latest(app: &mut AppState, id: u64) {
        app.apply_poll(PollUpdate {
            view: ViewId::Exporter,
            seq: 0,
            received_at: Local::now(),
            result: Ok(Snapshot::LatestEvent(EventId(id))),
        });
    }

    #[test]
    fn panel_cycle() {
        assert_eq!(Panel::Cash.next(), Panel::Positions);
        assert_eq!(Panel::Export.next(), Panel::Cash);
        assert_eq!(Panel::Cash.prev(), Panel::Export);
        assert_eq!(Panel::Positions.prev(), Panel::Cash);
    }

    #[test]
    fn panel_from_index() {
        for i in 0..Panel::COUNT {
            let p = Panel::from_index(i).unwrap();
            assert_eq!(p.index(), i);
        }
        assert!(Panel::from_index(Panel::COUNT).is_none());
    }

    #[test]
    fn only_table_panels_have_views() {
        assert_eq!(Panel::Bonds.view(), Some(ViewId::Bond));
        assert_eq!(Panel::Export.view(), None);
    }

    #[test]
    fn error_history_caps_at_50() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        for i in 0..60 {
            app.push_error(ErrorCategory::Other, format!("error {i}"), String::new());
        }
        assert_eq!(app.error_history.len(), 50);
        assert!(app.error_history[0].message.contains("59"));
    }

    #[test]
    fn repeated_poll_failures_record_one_error() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        for seq in 0..3 {
            app.apply_poll(PollUpdate {
                view: ViewId::Cash,
                seq,
                received_at: Local::now(),
                result: Err(ApiError::Network("refused".into())),
            });
        }
        assert_eq!(app.error_history.len(), 1);
        assert!(matches!(app.status_message, Some((_, StatusLevel::Warning))));
    }

    #[test]
    fn digits_only_in_target_input() {
        let mut export = ExportPanelState::default();
        for c in "1a2-3".chars() {
            export.push_digit(c);
        }
        assert_eq!(export.input, "123");
    }

    #[test]
    fn download_waits_for_confirmation() {
        let (mut app, cmd_rx, _resp_tx) = test_app();
        latest(&mut app, 10);
        app.export.input = "5".into();
        app.submit_download();
        assert_eq!(app.overlay, Overlay::ConfirmDownload(EventId(5)));
        assert!(cmd_rx.try_recv().is_err());

        app.confirm_download(EventId(5));
        assert!(matches!(
            cmd_rx.try_recv(),
            Ok(WorkerCommand::Download { target: EventId(5), browser: false })
        ));
        assert!(app.export.in_progress);
    }

    #[test]
    fn invalid_target_sends_nothing() {
        let (mut app, cmd_rx, _resp_tx) = test_app();
        latest(&mut app, 10);
        for input in ["0", "11", ""] {
            app.export.input = input.into();
            app.submit_download();
            app.submit_generate();
        }
        assert!(cmd_rx.try_recv().is_err());
        assert_eq!(app.overlay, Overlay::None);
        assert_eq!(app.error_history[0].category, ErrorCategory::Validation);
    }

    #[test]
    fn generate_goes_straight_to_worker() {
        let (mut app, cmd_rx, _resp_tx) = test_app();
        latest(&mut app, 10);
        app.export.input = "7".into();
        app.submit_generate();
        assert!(matches!(
            cmd_rx.try_recv(),
            Ok(WorkerCommand::Generate { target: EventId(7) })
        ));
        assert_eq!(app.export.last_target, Some(EventId(7)));
    }

    #[test]
    fn generated_reply_shown_verbatim() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        app.record_outcome(ExportOutcome::Generated {
            target: EventId(3),
            message: "Reports written".into(),
        });
        assert_eq!(
            app.status_message,
            Some(("Reports written".to_string(), StatusLevel::Info))
        );
        assert_eq!(app.export.log[0].text, "Reports written");
    }

    #[test]
    fn declined_download_is_logged() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        app.overlay = Overlay::ConfirmDownload(EventId(2));
        app.decline_download(EventId(2));
        assert_eq!(app.overlay, Overlay::None);
        assert!(app.export.log[0].text.contains("cancelled"));
    }
}
