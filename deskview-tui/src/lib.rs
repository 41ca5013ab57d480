//! DeskView TUI: live portfolio snapshots and report export in the terminal.
//!
//! Provides:
//! - Header with the latest event id and a refresh countdown
//! - Five auto-refreshing tables (cash, positions, bonds, currencies, exclusions)
//! - Export panel: download or generate the five reports for an event
//! - Error history overlay and persisted UI state

pub mod app;
pub mod input;
pub mod persistence;
pub mod theme;
pub mod ui;
pub mod worker;

pub use app::{AppState, Panel};
pub use theme::Theme;

#[cfg(test)]
mod test_helpers;
