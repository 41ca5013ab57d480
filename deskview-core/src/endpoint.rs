//! Backend endpoint paths and report kinds.

use serde::{Deserialize, Serialize};

use crate::domain::EventId;

/// Path of the server-side report generation endpoint.
pub const GENERATE_REPORTS_PATH: &str = "api/output_reports";

/// Query parameter carrying the target event id.
pub const TARGET_PARAM: &str = "target_id";

/// A polled snapshot collection (or the latest event id scalar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    Cash,
    Position,
    Bond,
    Currency,
    Exclusions,
    LatestEvent,
}

impl Feed {
    pub fn path(self) -> &'static str {
        match self {
            Feed::Cash => "api/get_cash_portfolio",
            Feed::Position => "api/get_position_portfolio",
            Feed::Bond => "api/get_bond_portfolio",
            Feed::Currency => "api/get_currency_portfolio",
            Feed::Exclusions => "api/get_exclusion_data",
            Feed::LatestEvent => "api/get_latest_event_id",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Feed::Cash => "Cash Level Portfolio",
            Feed::Position => "Position Level Portfolio",
            Feed::Bond => "Bond Level Portfolio",
            Feed::Currency => "Currency Level Portfolio",
            Feed::Exclusions => "Exclusions",
            Feed::LatestEvent => "Latest Event",
        }
    }
}

/// One of the five downloadable CSV reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Cash,
    Position,
    Bond,
    Currency,
    Exclusions,
}

impl ReportKind {
    pub const ALL: [ReportKind; 5] = [
        ReportKind::Cash,
        ReportKind::Position,
        ReportKind::Bond,
        ReportKind::Currency,
        ReportKind::Exclusions,
    ];

    pub fn path(self) -> &'static str {
        match self {
            ReportKind::Cash => "api/get_cash_report",
            ReportKind::Position => "api/get_position_report",
            ReportKind::Bond => "api/get_bond_report",
            ReportKind::Currency => "api/get_currency_report",
            ReportKind::Exclusions => "api/get_exclusion_report",
        }
    }

    /// Report type name used by the backend for file names.
    pub fn report_type(self) -> &'static str {
        match self {
            ReportKind::Cash => "cash_level_portfolio",
            ReportKind::Position => "position_level_portfolio",
            ReportKind::Bond => "bond_level_portfolio",
            ReportKind::Currency => "currency_level_portfolio",
            ReportKind::Exclusions => "exclusions",
        }
    }

    /// File name used when the server does not supply one.
    pub fn default_filename(self, target: EventId) -> String {
        format!("{}_{}.csv", self.report_type(), target)
    }
}

/// Join a base origin and an endpoint path with exactly one slash between them.
pub fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// `<base>/<path>?target_id=<target>`
pub fn with_target(base: &str, path: &str, target: EventId) -> String {
    format!("{}?{}={}", join(base, path), TARGET_PARAM, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn report_paths_are_distinct() {
        let paths: HashSet<_> = ReportKind::ALL.iter().map(|k| k.path()).collect();
        assert_eq!(paths.len(), 5);
    }

    #[test]
    fn join_normalises_slashes() {
        assert_eq!(
            join("http://localhost:8000/", "api/get_cash_portfolio"),
            "http://localhost:8000/api/get_cash_portfolio"
        );
        assert_eq!(
            join("http://localhost:8000", "/api/get_latest_event_id"),
            "http://localhost:8000/api/get_latest_event_id"
        );
    }

    #[test]
    fn target_url_carries_id() {
        let url = with_target("http://h:1", ReportKind::Bond.path(), EventId(7));
        assert_eq!(url, "http://h:1/api/get_bond_report?target_id=7");
    }

    #[test]
    fn default_filename_matches_backend_convention() {
        assert_eq!(
            ReportKind::Exclusions.default_filename(EventId(12)),
            "exclusions_12.csv"
        );
        assert_eq!(
            ReportKind::Cash.default_filename(EventId(3)),
            "cash_level_portfolio_3.csv"
        );
    }
}
