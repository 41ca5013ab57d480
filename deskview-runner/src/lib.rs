//! DeskView Runner: polling lifecycle, view state, report export, composition.
//!
//! Every data-bound view runs its own cancellable periodic task on a named
//! thread and reports through one channel to the single owner of view state.
//! The exporter validates a target event id once per submission and hands
//! five report requests to a sink (browser or directory), or asks the server
//! to generate them.

pub mod countdown;
pub mod dashboard;
pub mod export;
pub mod poller;
pub mod snapshot;
pub mod view;

pub use countdown::Countdown;
pub use dashboard::{Dashboard, DashboardState, HeaderState};
pub use export::{
    BrowserSink, DirectorySink, ExportError, ExportOutcome, ReportDelivery, ReportExporter,
    ReportRequest, ReportSink,
};
pub use poller::{spawn_poller, CancelToken, PollHandle};
pub use snapshot::{PollUpdate, Snapshot, Table, ViewId};
pub use view::{Applied, ViewState};

#[cfg(test)]
mod test_helpers;
