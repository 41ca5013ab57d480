//! Composition root: one poller per view, one owner of all view state.
//!
//! `Dashboard` owns the poller handles and the receiving end of the update
//! channel. `DashboardState` is plain data folded from `PollUpdate`s on the
//! consumer's thread, so no view state is shared across threads.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;

use chrono::Local;
use tracing::{debug, warn};

use deskview_core::{
    ApiError, BondPositionRecord, CurrencyPositionRecord, DashboardConfig, DeskCashRecord,
    EventId, ExclusionRecord, PortfolioApi, PositionRecord,
};

use crate::countdown::Countdown;
use crate::poller::{spawn_poller, PollHandle};
use crate::snapshot::{PollUpdate, Snapshot, Table, ViewId};
use crate::view::{Applied, ViewState};

/// Running pollers for a set of views.
pub struct Dashboard {
    handles: Vec<PollHandle>,
    updates: Receiver<PollUpdate>,
}

impl Dashboard {
    /// Start one poller for every view.
    pub fn start(config: &DashboardConfig, api: Arc<dyn PortfolioApi>) -> std::io::Result<Self> {
        Self::start_views(config, api, &ViewId::ALL)
    }

    /// Start pollers for a subset of views.
    pub fn start_views(
        config: &DashboardConfig,
        api: Arc<dyn PortfolioApi>,
        views: &[ViewId],
    ) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let interval = config.poll_interval();
        let mut handles = Vec::with_capacity(views.len());

        for &view in views {
            let api = Arc::clone(&api);
            let handle = spawn_poller(view.name(), interval, tx.clone(), move |seq| {
                let result = Snapshot::fetch(api.as_ref(), view.feed());
                debug!(view = view.name(), seq, ok = result.is_ok(), "poll complete");
                PollUpdate {
                    view,
                    seq,
                    received_at: Local::now(),
                    result,
                }
            });
            match handle {
                Ok(h) => handles.push(h),
                Err(e) => {
                    for h in handles {
                        h.join();
                    }
                    return Err(e);
                }
            }
        }

        Ok(Self {
            handles,
            updates: rx,
        })
    }

    pub fn updates(&self) -> &Receiver<PollUpdate> {
        &self.updates
    }

    /// Everything received so far, without blocking.
    pub fn drain(&self) -> Vec<PollUpdate> {
        let mut out = Vec::new();
        loop {
            match self.updates.try_recv() {
                Ok(update) => out.push(update),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        out
    }

    pub fn running(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_cancelled()).count()
    }

    /// Cancel every poller and wait for all threads to exit.
    pub fn stop(self) {
        for handle in &self.handles {
            handle.cancel();
        }
        for handle in self.handles {
            handle.join();
        }
    }
}

/// Latest event id as shown in the header, plus the refresh countdown.
#[derive(Debug, Clone)]
pub struct HeaderState {
    pub latest: ViewState<Option<EventId>>,
    pub countdown: Countdown,
}

/// Everything the dashboard displays.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub cash: ViewState<Vec<DeskCashRecord>>,
    pub positions: ViewState<Vec<PositionRecord>>,
    pub bonds: ViewState<Vec<BondPositionRecord>>,
    pub currencies: ViewState<Vec<CurrencyPositionRecord>>,
    pub exclusions: ViewState<Vec<ExclusionRecord>>,
    pub header: HeaderState,
    /// The exporter's own copy of the latest event id, used for validation.
    pub exporter_latest: ViewState<Option<EventId>>,
}

impl DashboardState {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            cash: ViewState::default(),
            positions: ViewState::default(),
            bonds: ViewState::default(),
            currencies: ViewState::default(),
            exclusions: ViewState::default(),
            header: HeaderState {
                latest: ViewState::default(),
                countdown: Countdown::new(config.countdown_secs),
            },
            exporter_latest: ViewState::default(),
        }
    }

    /// Fold one update into its view. Returns the error text on failure.
    pub fn apply(&mut self, update: PollUpdate) -> Result<Applied, String> {
        let PollUpdate {
            view,
            seq,
            received_at: at,
            result,
        } = update;

        let applied = match view {
            ViewId::Cash => route(&mut self.cash, seq, at, result, |s| match s {
                Snapshot::Cash(v) => Some(v),
                _ => None,
            }),
            ViewId::Position => route(&mut self.positions, seq, at, result, |s| match s {
                Snapshot::Position(v) => Some(v),
                _ => None,
            }),
            ViewId::Bond => route(&mut self.bonds, seq, at, result, |s| match s {
                Snapshot::Bond(v) => Some(v),
                _ => None,
            }),
            ViewId::Currency => route(&mut self.currencies, seq, at, result, |s| match s {
                Snapshot::Currency(v) => Some(v),
                _ => None,
            }),
            ViewId::Exclusions => route(&mut self.exclusions, seq, at, result, |s| match s {
                Snapshot::Exclusions(v) => Some(v),
                _ => None,
            }),
            ViewId::Header => route(&mut self.header.latest, seq, at, result, latest_id),
            ViewId::Exporter => route(&mut self.exporter_latest, seq, at, result, latest_id),
        };

        match applied {
            Applied::Replaced => Ok(applied),
            Applied::KeptStale => {
                let message = self.last_error(view).unwrap_or_default().to_string();
                warn!(view = view.name(), seq, error = %message, "poll failed, keeping previous data");
                Err(message)
            }
        }
    }

    pub fn last_error(&self, view: ViewId) -> Option<&str> {
        match view {
            ViewId::Cash => self.cash.last_error(),
            ViewId::Position => self.positions.last_error(),
            ViewId::Bond => self.bonds.last_error(),
            ViewId::Currency => self.currencies.last_error(),
            ViewId::Exclusions => self.exclusions.last_error(),
            ViewId::Header => self.header.latest.last_error(),
            ViewId::Exporter => self.exporter_latest.last_error(),
        }
    }

    /// Table form of a table view; `None` for the header and exporter.
    pub fn table(&self, view: ViewId) -> Option<Table> {
        match view {
            ViewId::Cash => Some(Table::of(self.cash.data())),
            ViewId::Position => Some(Table::of(self.positions.data())),
            ViewId::Bond => Some(Table::of(self.bonds.data())),
            ViewId::Currency => Some(Table::of(self.currencies.data())),
            ViewId::Exclusions => Some(Table::of(self.exclusions.data())),
            ViewId::Header | ViewId::Exporter => None,
        }
    }

    /// Row count and refresh time for a view, for status lines.
    pub fn freshness(&self, view: ViewId) -> (usize, Option<chrono::DateTime<Local>>) {
        match view {
            ViewId::Cash => (self.cash.data().len(), self.cash.updated_at()),
            ViewId::Position => (self.positions.data().len(), self.positions.updated_at()),
            ViewId::Bond => (self.bonds.data().len(), self.bonds.updated_at()),
            ViewId::Currency => (self.currencies.data().len(), self.currencies.updated_at()),
            ViewId::Exclusions => (self.exclusions.data().len(), self.exclusions.updated_at()),
            ViewId::Header => (
                usize::from(self.header.latest.data().is_some()),
                self.header.latest.updated_at(),
            ),
            ViewId::Exporter => (
                usize::from(self.exporter_latest.data().is_some()),
                self.exporter_latest.updated_at(),
            ),
        }
    }

    pub fn latest_for_header(&self) -> Option<EventId> {
        *self.header.latest.data()
    }

    pub fn latest_for_export(&self) -> Option<EventId> {
        *self.exporter_latest.data()
    }
}

fn latest_id(snapshot: Snapshot) -> Option<Option<EventId>> {
    match snapshot {
        Snapshot::LatestEvent(id) => Some(Some(id)),
        _ => None,
    }
}

fn route<T>(
    state: &mut ViewState<T>,
    seq: u64,
    at: chrono::DateTime<Local>,
    result: Result<Snapshot, ApiError>,
    extract: impl FnOnce(Snapshot) -> Option<T>,
) -> Applied {
    let typed = result.and_then(|snapshot| {
        extract(snapshot).ok_or_else(|| ApiError::Decode {
            path: String::from("<routing>"),
            message: "snapshot does not belong to this view".into(),
        })
    });
    state.apply(seq, at, typed)
}
