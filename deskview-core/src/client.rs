//! Portfolio API trait and its blocking HTTP implementation.
//!
//! The `PortfolioApi` trait abstracts over the backend so pollers and the
//! exporter can run against a fake in tests. `HttpPortfolioApi` is the real
//! thing: one `reqwest::blocking::Client` bound to the configured origin,
//! sending and accepting JSON.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_DISPOSITION, CONTENT_TYPE};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::DashboardConfig;
use crate::domain::{
    decode_event_id, decode_snapshot, BondPositionRecord, CurrencyPositionRecord,
    DeskCashRecord, EventId, ExclusionRecord, PositionRecord,
};
use crate::endpoint::{self, Feed, ReportKind, GENERATE_REPORTS_PATH};

/// Structured error types for backend calls.
///
/// Displayable in both CLI and TUI contexts.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("network unreachable: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("HTTP {status} from {path}: {body}")]
    Status {
        status: u16,
        path: String,
        body: String,
    },

    #[error("unexpected response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// A downloaded CSV report.
#[derive(Debug, Clone)]
pub struct ReportFile {
    pub kind: ReportKind,
    pub target: EventId,
    /// Server-supplied attachment name, or the backend's naming convention.
    pub filename: String,
    pub body: Vec<u8>,
}

/// The backend as seen by the dashboard.
pub trait PortfolioApi: Send + Sync {
    fn cash_portfolio(&self) -> Result<Vec<DeskCashRecord>, ApiError>;
    fn position_portfolio(&self) -> Result<Vec<PositionRecord>, ApiError>;
    fn bond_portfolio(&self) -> Result<Vec<BondPositionRecord>, ApiError>;
    fn currency_portfolio(&self) -> Result<Vec<CurrencyPositionRecord>, ApiError>;
    fn exclusions(&self) -> Result<Vec<ExclusionRecord>, ApiError>;
    fn latest_event_id(&self) -> Result<EventId, ApiError>;

    /// Ask the server to write all five reports for `target`; returns the body verbatim.
    fn generate_reports(&self, target: EventId) -> Result<String, ApiError>;

    /// Fetch one CSV report for `target`.
    fn download_report(&self, kind: ReportKind, target: EventId) -> Result<ReportFile, ApiError>;

    /// Absolute URL of one report, for handing to a browser.
    fn report_url(&self, kind: ReportKind, target: EventId) -> String;
}

/// Blocking HTTP client for the portfolio backend.
pub struct HttpPortfolioApi {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpPortfolioApi {
    pub fn new(config: &DashboardConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::blocking::Client::builder().default_headers(headers);
        // reqwest's blocking client defaults to 30s; `None` here means no timeout.
        builder = builder.timeout(config.request_timeout());

        let client = builder
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {e}")))?;

        reqwest::Url::parse(&config.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", config.base_url)))?;

        debug!(
            base_url = %config.base_url,
            timeout = %describe_timeout(config.request_timeout()),
            "HTTP client ready"
        );
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn feed_text(&self, feed: Feed) -> Result<String, ApiError> {
        let url = endpoint::join(&self.base_url, feed.path());
        let (body, _) = self.get(feed.path(), &url, Some(ERROR_BODY_LIMIT))?;
        Ok(body_text(body))
    }

    fn feed_snapshot<T: serde::de::DeserializeOwned>(&self, feed: Feed) -> Result<Vec<T>, ApiError> {
        let text = self.feed_text(feed)?;
        let rows = decode_snapshot(&text).map_err(|e| ApiError::Decode {
            path: feed.path().to_string(),
            message: e.to_string(),
        })?;
        debug!(path = feed.path(), rows = rows.len(), "snapshot fetched");
        Ok(rows)
    }

    /// Issue one GET and return the body plus the attachment filename, if any.
    ///
    /// An error body is cut to `error_body_limit` characters; `None` keeps it whole.
    fn get(
        &self,
        path: &str,
        url: &str,
        error_body_limit: Option<usize>,
    ) -> Result<(Vec<u8>, Option<String>), ApiError> {
        let resp = self.client.get(url).send().map_err(|e| classify(path, e))?;
        let status = resp.status();
        let filename = resp
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_filename);
        let body = resp.bytes().map_err(|e| classify(path, e))?.to_vec();

        if !status.is_success() {
            let body = body_text(body);
            warn!(path, status = status.as_u16(), "backend returned an error status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                path: path.to_string(),
                body: match error_body_limit {
                    Some(max) => truncate(&body, max),
                    None => body,
                },
            });
        }
        Ok((body, filename))
    }
}

impl PortfolioApi for HttpPortfolioApi {
    fn cash_portfolio(&self) -> Result<Vec<DeskCashRecord>, ApiError> {
        self.feed_snapshot(Feed::Cash)
    }

    fn position_portfolio(&self) -> Result<Vec<PositionRecord>, ApiError> {
        self.feed_snapshot(Feed::Position)
    }

    fn bond_portfolio(&self) -> Result<Vec<BondPositionRecord>, ApiError> {
        self.feed_snapshot(Feed::Bond)
    }

    fn currency_portfolio(&self) -> Result<Vec<CurrencyPositionRecord>, ApiError> {
        self.feed_snapshot(Feed::Currency)
    }

    fn exclusions(&self) -> Result<Vec<ExclusionRecord>, ApiError> {
        self.feed_snapshot(Feed::Exclusions)
    }

    fn latest_event_id(&self) -> Result<EventId, ApiError> {
        let text = self.feed_text(Feed::LatestEvent)?;
        decode_event_id(text.trim()).map_err(|e| ApiError::Decode {
            path: Feed::LatestEvent.path().to_string(),
            message: e.to_string(),
        })
    }

    fn generate_reports(&self, target: EventId) -> Result<String, ApiError> {
        let url = endpoint::with_target(&self.base_url, GENERATE_REPORTS_PATH, target);
        // Generation failures are shown to the user as the server wrote them.
        let (body, _) = self.get(GENERATE_REPORTS_PATH, &url, None)?;
        Ok(body_text(body))
    }

    fn download_report(&self, kind: ReportKind, target: EventId) -> Result<ReportFile, ApiError> {
        let url = self.report_url(kind, target);
        let (body, filename) = self.get(kind.path(), &url, Some(ERROR_BODY_LIMIT))?;
        Ok(ReportFile {
            kind,
            target,
            filename: filename.unwrap_or_else(|| kind.default_filename(target)),
            body,
        })
    }

    fn report_url(&self, kind: ReportKind, target: EventId) -> String {
        endpoint::with_target(&self.base_url, kind.path(), target)
    }
}

fn classify(path: &str, e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout(format!("{path}: {e}"))
    } else if e.is_builder() {
        ApiError::InvalidUrl(e.to_string())
    } else {
        ApiError::Network(format!("{path}: {e}"))
    }
}

fn body_text(body: Vec<u8>) -> String {
    String::from_utf8(body).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

const ERROR_BODY_LIMIT: usize = 200;

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Extract the file name from a `Content-Disposition: attachment; filename=...` header.
///
/// Only the final path component is kept so a hostile name cannot escape the
/// report directory.
pub fn attachment_filename(header: &str) -> Option<String> {
    let raw = header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))?;
    let name = raw.trim().trim_matches('"');
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

fn describe_timeout(timeout: Option<Duration>) -> String {
    match timeout {
        Some(t) => format!("{}ms", t.as_millis()),
        None => "none".to_string(),
    }
}
