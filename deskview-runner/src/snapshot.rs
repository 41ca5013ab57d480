//! Views, polled snapshots, and their table form.

use chrono::{DateTime, Local};

use deskview_core::format::table_rows;
use deskview_core::{
    ApiError, BondPositionRecord, CurrencyPositionRecord, DeskCashRecord, EventId,
    ExclusionRecord, Feed, PortfolioApi, PositionRecord, TableRow,
};

/// Each independently polled view on the dashboard.
///
/// The header and the exporter both track the latest event id, each with
/// its own poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewId {
    Cash,
    Position,
    Bond,
    Currency,
    Exclusions,
    Header,
    Exporter,
}

impl ViewId {
    pub const ALL: [ViewId; 7] = [
        ViewId::Cash,
        ViewId::Position,
        ViewId::Bond,
        ViewId::Currency,
        ViewId::Exclusions,
        ViewId::Header,
        ViewId::Exporter,
    ];

    /// The five table views.
    pub const TABLES: [ViewId; 5] = [
        ViewId::Cash,
        ViewId::Position,
        ViewId::Bond,
        ViewId::Currency,
        ViewId::Exclusions,
    ];

    pub fn feed(self) -> Feed {
        match self {
            ViewId::Cash => Feed::Cash,
            ViewId::Position => Feed::Position,
            ViewId::Bond => Feed::Bond,
            ViewId::Currency => Feed::Currency,
            ViewId::Exclusions => Feed::Exclusions,
            ViewId::Header | ViewId::Exporter => Feed::LatestEvent,
        }
    }

    /// Short name for threads and logs.
    pub fn name(self) -> &'static str {
        match self {
            ViewId::Cash => "cash",
            ViewId::Position => "position",
            ViewId::Bond => "bond",
            ViewId::Currency => "currency",
            ViewId::Exclusions => "exclusions",
            ViewId::Header => "header",
            ViewId::Exporter => "exporter",
        }
    }
}

/// One polled response body, typed by feed.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Cash(Vec<DeskCashRecord>),
    Position(Vec<PositionRecord>),
    Bond(Vec<BondPositionRecord>),
    Currency(Vec<CurrencyPositionRecord>),
    Exclusions(Vec<ExclusionRecord>),
    LatestEvent(EventId),
}

impl Snapshot {
    /// Fetch one feed.
    pub fn fetch(api: &dyn PortfolioApi, feed: Feed) -> Result<Snapshot, ApiError> {
        Ok(match feed {
            Feed::Cash => Snapshot::Cash(api.cash_portfolio()?),
            Feed::Position => Snapshot::Position(api.position_portfolio()?),
            Feed::Bond => Snapshot::Bond(api.bond_portfolio()?),
            Feed::Currency => Snapshot::Currency(api.currency_portfolio()?),
            Feed::Exclusions => Snapshot::Exclusions(api.exclusions()?),
            Feed::LatestEvent => Snapshot::LatestEvent(api.latest_event_id()?),
        })
    }

    /// Number of records (1 for the scalar event id).
    pub fn len(&self) -> usize {
        match self {
            Snapshot::Cash(v) => v.len(),
            Snapshot::Position(v) => v.len(),
            Snapshot::Bond(v) => v.len(),
            Snapshot::Currency(v) => v.len(),
            Snapshot::Exclusions(v) => v.len(),
            Snapshot::LatestEvent(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Table form; `None` for the scalar event id.
    pub fn table(&self) -> Option<Table> {
        match self {
            Snapshot::Cash(v) => Some(Table::of(v)),
            Snapshot::Position(v) => Some(Table::of(v)),
            Snapshot::Bond(v) => Some(Table::of(v)),
            Snapshot::Currency(v) => Some(Table::of(v)),
            Snapshot::Exclusions(v) => Some(Table::of(v)),
            Snapshot::LatestEvent(_) => None,
        }
    }
}

/// Rendered cells for one view.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: &'static [&'static str],
    pub money_columns: &'static [usize],
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn of<T: TableRow>(records: &[T]) -> Self {
        Self {
            headers: T::HEADERS,
            money_columns: T::MONEY_COLUMNS,
            rows: table_rows(records),
        }
    }
}

/// A poll result on its way to the view-state owner.
#[derive(Debug)]
pub struct PollUpdate {
    pub view: ViewId,
    pub seq: u64,
    pub received_at: DateTime<Local>,
    pub result: Result<Snapshot, ApiError>,
}
