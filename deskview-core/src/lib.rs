//! DeskView Core: domain records, configuration, API client, formatting, validation.
//!
//! This crate holds everything that talks to the portfolio backend or shapes
//! its data, with no threads and no terminal code:
//! - Snapshot records (desk cash, positions, bonds, currencies, exclusions)
//! - Event identifiers and target-id validation
//! - Endpoint paths and report kinds
//! - The `PortfolioApi` trait and its blocking HTTP implementation
//! - Two-decimal formatting and table rows for every record type

pub mod client;
pub mod config;
pub mod domain;
pub mod endpoint;
pub mod format;
pub mod validate;

pub use client::{ApiError, HttpPortfolioApi, PortfolioApi, ReportFile};
pub use config::{ConfigError, DashboardConfig};
pub use domain::{
    BondPositionRecord, CurrencyPositionRecord, DeskCashRecord, EventId, ExclusionRecord,
    PositionRecord,
};
pub use endpoint::{Feed, ReportKind};
pub use format::{format_money, format_quantity, TableRow};
pub use validate::{parse_target, validate_target_id, ValidationError};
