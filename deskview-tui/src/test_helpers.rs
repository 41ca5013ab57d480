//! Test helpers: an always-succeeding backend and a wired-up `AppState`.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use deskview_core::{
    ApiError, BondPositionRecord, CurrencyPositionRecord, DashboardConfig, DeskCashRecord,
    EventId, ExclusionRecord, PortfolioApi, PositionRecord, ReportFile, ReportKind,
};

use crate::app::AppState;
use crate::worker::{WorkerCommand, WorkerResponse};

pub struct StubApi;

impl PortfolioApi for StubApi {
    fn cash_portfolio(&self) -> Result<Vec<DeskCashRecord>, ApiError> {
        Ok(vec![DeskCashRecord {
            desk: "DK01".into(),
            cash: 1_250.5,
            updated: 1,
        }])
    }
    fn position_portfolio(&self) -> Result<Vec<PositionRecord>, ApiError> {
        Ok(Vec::new())
    }
    fn bond_portfolio(&self) -> Result<Vec<BondPositionRecord>, ApiError> {
        Ok(Vec::new())
    }
    fn currency_portfolio(&self) -> Result<Vec<CurrencyPositionRecord>, ApiError> {
        Ok(Vec::new())
    }
    fn exclusions(&self) -> Result<Vec<ExclusionRecord>, ApiError> {
        Ok(Vec::new())
    }
    fn latest_event_id(&self) -> Result<EventId, ApiError> {
        Ok(EventId(10))
    }
    fn generate_reports(&self, target: EventId) -> Result<String, ApiError> {
        Ok(format!("generated {target}"))
    }
    fn download_report(&self, kind: ReportKind, target: EventId) -> Result<ReportFile, ApiError> {
        Ok(ReportFile {
            kind,
            target,
            filename: kind.default_filename(target),
            body: b"Desk\nDK01\n".to_vec(),
        })
    }
    fn report_url(&self, kind: ReportKind, target: EventId) -> String {
        format!("http://localhost:8000/{}?target_id={target}", kind.path())
    }
}

/// An `AppState` plus the far ends of its worker channels.
pub fn test_app() -> (AppState, Receiver<WorkerCommand>, Sender<WorkerResponse>) {
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let app = AppState::new(
        Arc::new(DashboardConfig::default()),
        cmd_tx,
        resp_rx,
    );
    (app, cmd_rx, resp_tx)
}
