//! Shared test fixtures: an in-memory `PortfolioApi` that records every call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use deskview_core::{
    ApiError, BondPositionRecord, CurrencyPositionRecord, DeskCashRecord, EventId,
    ExclusionRecord, PortfolioApi, PositionRecord, ReportFile, ReportKind,
};

pub struct FakeApi {
    pub latest: Mutex<EventId>,
    pub cash: Mutex<Vec<DeskCashRecord>>,
    pub fail: AtomicBool,
    pub generate_reply: String,
    pub calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new(latest: EventId) -> Self {
        Self {
            latest: Mutex::new(latest),
            cash: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            generate_reply: "Reports generated".to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.split('?').next() == Some(path))
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: String) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);
        if self.fail.load(Ordering::SeqCst) {
            Err(ApiError::Network("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

impl PortfolioApi for FakeApi {
    fn cash_portfolio(&self) -> Result<Vec<DeskCashRecord>, ApiError> {
        self.record("api/get_cash_portfolio".into())?;
        Ok(self.cash.lock().unwrap().clone())
    }

    fn position_portfolio(&self) -> Result<Vec<PositionRecord>, ApiError> {
        self.record("api/get_position_portfolio".into())?;
        Ok(Vec::new())
    }

    fn bond_portfolio(&self) -> Result<Vec<BondPositionRecord>, ApiError> {
        self.record("api/get_bond_portfolio".into())?;
        Ok(Vec::new())
    }

    fn currency_portfolio(&self) -> Result<Vec<CurrencyPositionRecord>, ApiError> {
        self.record("api/get_currency_portfolio".into())?;
        Ok(Vec::new())
    }

    fn exclusions(&self) -> Result<Vec<ExclusionRecord>, ApiError> {
        self.record("api/get_exclusion_data".into())?;
        Ok(Vec::new())
    }

    fn latest_event_id(&self) -> Result<EventId, ApiError> {
        self.record("api/get_latest_event_id".into())?;
        Ok(*self.latest.lock().unwrap())
    }

    fn generate_reports(&self, target: EventId) -> Result<String, ApiError> {
        self.record(format!("api/output_reports?target_id={target}"))?;
        Ok(self.generate_reply.clone())
    }

    fn download_report(&self, kind: ReportKind, target: EventId) -> Result<ReportFile, ApiError> {
        self.record(format!("{}?target_id={target}", kind.path()))?;
        Ok(ReportFile {
            kind,
            target,
            filename: kind.default_filename(target),
            body: b"Desk,Cash\nDK01,1.00\nDK02,2.00\n".to_vec(),
        })
    }

    fn report_url(&self, kind: ReportKind, target: EventId) -> String {
        format!("http://backend/{}?target_id={target}", kind.path())
    }
}

pub fn cash_rows(n: usize) -> Vec<DeskCashRecord> {
    (0..n)
        .map(|i| DeskCashRecord {
            desk: format!("DK{i:02}"),
            cash: 100.0 + i as f64 * 1.5,
            updated: i as i64,
        })
        .collect()
}
