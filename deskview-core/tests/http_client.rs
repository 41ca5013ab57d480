//! HTTP client against a fake backend served by axum on a private runtime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::Query;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::get;
use axum::Router;

use deskview_core::{
    ApiError, DashboardConfig, EventId, HttpPortfolioApi, PortfolioApi, ReportKind,
};

// ── Fake backend ─────────────────────────────────────────────────────

fn serve(router: Router) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.set_nonblocking(true).expect("nonblocking");
    let addr = listener.local_addr().expect("addr");
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).expect("listener");
            axum::serve(listener, router).await.expect("serve");
        });
    });
    format!("http://{addr}")
}

fn client(base: &str) -> HttpPortfolioApi {
    let config = DashboardConfig::default()
        .with_base_url(base)
        .expect("valid url");
    HttpPortfolioApi::new(&config).expect("client")
}

const CASH_BODY: &str = r#"[
    {"model": "api.desk", "pk": "DK01", "fields": {"cash": "1234.50000", "updated": 4}},
    {"model": "api.desk", "pk": "DK02", "fields": {"cash": "-20.00000", "updated": 4}}
]"#;

// ── Snapshots ────────────────────────────────────────────────────────

#[test]
fn fetches_cash_snapshot_with_json_headers() {
    let seen_accept = Arc::new(Mutex::new(None::<String>));
    let seen = seen_accept.clone();
    let router = Router::new().route(
        "/api/get_cash_portfolio",
        get(move |headers: HeaderMap| {
            let seen = seen.clone();
            async move {
                *seen.lock().unwrap() = headers
                    .get(header::ACCEPT)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                ([(header::CONTENT_TYPE, "application/json")], CASH_BODY)
            }
        }),
    );
    let api = client(&serve(router));

    let rows = api.cash_portfolio().expect("cash snapshot");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].desk, "DK01");
    assert_eq!(rows[0].cash, 1234.5);
    assert_eq!(rows[1].cash, -20.0);
    assert_eq!(seen_accept.lock().unwrap().as_deref(), Some("application/json"));
}

#[test]
fn fetches_double_encoded_exclusions() {
    let inner = r#"[{"model": "api.eventexceptionlog", "pk": 7, "fields": {"desk": "DK01", "trader": "TR01", "book": "BK01", "buy_sell": "sell", "quantity": 3, "bond": "BD0001", "price": null, "exclusion_type": "INSUFFICIENT_CASH"}}]"#;
    let body = serde_json::to_string(inner).unwrap();
    let router = Router::new().route(
        "/api/get_exclusion_data",
        get(move || {
            let body = body.clone();
            async move { body }
        }),
    );
    let api = client(&serve(router));

    let rows = api.exclusions().expect("exclusions");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "7");
    assert_eq!(rows[0].price, None);
}

#[test]
fn fetches_position_and_currency_aggregates() {
    let router = Router::new()
        .route(
            "/api/get_position_portfolio",
            get(|| async {
                r#"[{"desk": "DK01", "trader": "TR01", "book": "BK01", "position": 150, "NV": 15075.123}]"#
            }),
        )
        .route(
            "/api/get_currency_portfolio",
            get(|| async { r#"[{"desk": "DK01", "currency": "EUR", "position": "10", "NV": "9.5"}]"# }),
        );
    let api = client(&serve(router));

    let positions = api.position_portfolio().unwrap();
    assert_eq!(positions[0].position, 150.0);
    assert_eq!(positions[0].nv, 15075.123);

    let currencies = api.currency_portfolio().unwrap();
    assert_eq!(currencies[0].currency, "EUR");
    assert_eq!(currencies[0].nv, 9.5);
}

#[test]
fn latest_event_id_is_a_bare_number() {
    let router = Router::new().route("/api/get_latest_event_id", get(|| async { "42" }));
    let api = client(&serve(router));
    assert_eq!(api.latest_event_id().unwrap(), EventId(42));
}

// ── Errors ───────────────────────────────────────────────────────────

#[test]
fn error_status_carries_code_and_body() {
    let router = Router::new().route(
        "/api/get_bond_portfolio",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database locked") }),
    );
    let api = client(&serve(router));

    match api.bond_portfolio() {
        Err(ApiError::Status { status, path, body }) => {
            assert_eq!(status, 500);
            assert_eq!(path, "api/get_bond_portfolio");
            assert_eq!(body, "database locked");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[test]
fn malformed_body_is_a_decode_error() {
    let router = Router::new().route("/api/get_cash_portfolio", get(|| async { "<html>oops</html>" }));
    let api = client(&serve(router));
    assert!(matches!(api.cash_portfolio(), Err(ApiError::Decode { .. })));
}

#[test]
fn unreachable_backend_is_a_network_error() {
    // Bind then drop to get a port nothing listens on.
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let api = client(&format!("http://127.0.0.1:{port}"));
    assert!(matches!(
        api.latest_event_id(),
        Err(ApiError::Network(_)) | Err(ApiError::Timeout(_))
    ));
}

// ── Reports ──────────────────────────────────────────────────────────

#[test]
fn generate_reports_returns_body_verbatim() {
    let hits = Arc::new(AtomicUsize::new(0));
    let seen_target = Arc::new(Mutex::new(None::<String>));
    let (h, s) = (hits.clone(), seen_target.clone());
    let router = Router::new().route(
        "/api/output_reports",
        get(move |Query(q): Query<HashMap<String, String>>| {
            let (h, s) = (h.clone(), s.clone());
            async move {
                h.fetch_add(1, Ordering::SeqCst);
                *s.lock().unwrap() = q.get("target_id").cloned();
                "Reports for event 5 written to out/output_5"
            }
        }),
    );
    let api = client(&serve(router));

    let msg = api.generate_reports(EventId(5)).unwrap();
    assert_eq!(msg, "Reports for event 5 written to out/output_5");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(seen_target.lock().unwrap().as_deref(), Some("5"));
}

#[test]
fn generate_failure_keeps_the_whole_body() {
    let detail = format!("report writer failed: {}", "x".repeat(400));
    let body = detail.clone();
    let router = Router::new().route(
        "/api/output_reports",
        get(move || {
            let body = body.clone();
            async move { (StatusCode::INTERNAL_SERVER_ERROR, body) }
        }),
    );
    let api = client(&serve(router));

    match api.generate_reports(EventId(2)) {
        Err(ApiError::Status { status, body, .. }) => {
            assert_eq!(status, 500);
            assert_eq!(body, detail);
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[test]
fn snapshot_error_body_is_shortened() {
    let router = Router::new().route(
        "/api/get_cash_portfolio",
        get(|| async { (StatusCode::BAD_GATEWAY, "y".repeat(1000)) }),
    );
    let api = client(&serve(router));

    match api.cash_portfolio() {
        Err(ApiError::Status { body, .. }) => {
            assert!(body.len() < 300, "{}", body.len());
            assert!(body.ends_with("..."));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[test]
fn download_report_uses_content_disposition_name() {
    let router = Router::new()
        .route(
            "/api/get_cash_report",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let id = q.get("target_id").cloned().unwrap_or_default();
                (
                    [
                        (header::CONTENT_TYPE, "text/csv".to_string()),
                        (
                            header::CONTENT_DISPOSITION,
                            format!("attachment; filename=cash_level_portfolio_{id}.csv"),
                        ),
                    ],
                    "Desk,Cash\nDK01,1.00\n",
                )
            }),
        )
        .route(
            "/api/get_bond_report",
            get(|| async { "Desk,Trader,Book,BondID,Position,Value\n" }),
        );
    let api = client(&serve(router));

    let cash = api.download_report(ReportKind::Cash, EventId(3)).unwrap();
    assert_eq!(cash.filename, "cash_level_portfolio_3.csv");
    assert_eq!(cash.body, b"Desk,Cash\nDK01,1.00\n");

    let bond = api.download_report(ReportKind::Bond, EventId(3)).unwrap();
    assert_eq!(bond.filename, "bond_level_portfolio_3.csv");
}
