//! End-to-end export against an in-memory backend.

use std::sync::Mutex;

use deskview_core::{
    ApiError, BondPositionRecord, CurrencyPositionRecord, DeskCashRecord, EventId,
    ExclusionRecord, PortfolioApi, PositionRecord, ReportFile, ReportKind,
};
use deskview_runner::{DirectorySink, ExportOutcome, ReportExporter};

/// Serves fixed CSV bodies and remembers every report request.
#[derive(Default)]
struct CsvBackend {
    requests: Mutex<Vec<(ReportKind, EventId)>>,
    generated: Mutex<Vec<EventId>>,
}

impl PortfolioApi for CsvBackend {
    fn cash_portfolio(&self) -> Result<Vec<DeskCashRecord>, ApiError> {
        Ok(Vec::new())
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
        self.generated.lock().unwrap().push(target);
        Ok(format!("Reports for event {target} written to out/output_{target}"))
    }

    fn download_report(&self, kind: ReportKind, target: EventId) -> Result<ReportFile, ApiError> {
        self.requests.lock().unwrap().push((kind, target));
        if kind == ReportKind::Exclusions {
            return Err(ApiError::Status {
                status: 404,
                path: kind.path().into(),
                body: "not found".into(),
            });
        }
        Ok(ReportFile {
            kind,
            target,
            filename: format!("{}_{target}.csv", kind.report_type()),
            body: b"Desk,Value\nDK01,1.00\n".to_vec(),
        })
    }

    fn report_url(&self, kind: ReportKind, target: EventId) -> String {
        format!("http://localhost:8000/{}?target_id={target}", kind.path())
    }
}

#[test]
fn download_writes_reports_and_keeps_going_past_failures() {
    let dir = tempfile::tempdir().unwrap();
    let backend = CsvBackend::default();
    let exporter = ReportExporter::new(&backend);
    let mut sink = DirectorySink::new(&backend, dir.path());

    let outcome = exporter.download("6", Some(EventId(10)), |_| true, &mut sink);

    let requests = backend.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 5);
    assert!(requests.iter().all(|(_, t)| *t == EventId(6)));

    let ExportOutcome::Downloaded { target, deliveries } = outcome else {
        panic!("expected a download outcome");
    };
    assert_eq!(target, EventId(6));
    assert_eq!(deliveries.iter().filter(|d| d.result.is_ok()).count(), 4);
    assert!(deliveries[4].result.as_ref().unwrap_err().contains("404"));

    let written = std::fs::read_to_string(
        dir.path().join("output_6").join("cash_level_portfolio_6.csv"),
    )
    .unwrap();
    assert!(written.starts_with("Desk,Value"));
}

#[test]
fn confirmation_sees_the_validated_target() {
    let backend = CsvBackend::default();
    let exporter = ReportExporter::new(&backend);
    let dir = tempfile::tempdir().unwrap();
    let mut sink = DirectorySink::new(&backend, dir.path());

    let mut asked = None;
    let outcome = exporter.download(" 3", Some(EventId(10)), |t| {
        asked = Some(t);
        false
    }, &mut sink);

    assert_eq!(asked, Some(EventId(3)));
    assert_eq!(outcome, ExportOutcome::Cancelled { target: EventId(3) });
    assert!(backend.requests.lock().unwrap().is_empty());
}

#[test]
fn generate_passes_the_reply_through() {
    let backend = CsvBackend::default();
    let outcome = ReportExporter::new(&backend).submit_generate("10", Some(EventId(10)));
    assert_eq!(
        outcome.summary(),
        "Reports for event 10 written to out/output_10"
    );
    assert_eq!(*backend.generated.lock().unwrap(), vec![EventId(10)]);
}

#[test]
fn above_latest_never_reaches_backend() {
    let backend = CsvBackend::default();
    let exporter = ReportExporter::new(&backend);
    let outcome = exporter.submit_generate("11", Some(EventId(10)));
    assert!(matches!(outcome, ExportOutcome::Rejected(_)));
    assert!(backend.generated.lock().unwrap().is_empty());
}
