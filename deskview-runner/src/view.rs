//! Per-view display state.
//!
//! The most recently arrived poll result wins. A failed poll leaves the
//! previous data on screen and records the error for the status line.

use chrono::{DateTime, Local};

use deskview_core::ApiError;

/// What `ViewState::apply` did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Data replaced.
    Replaced,
    /// Poll failed; previous data kept.
    KeptStale,
}

#[derive(Debug, Clone)]
pub struct ViewState<T> {
    data: T,
    last_seq: Option<u64>,
    updated_at: Option<DateTime<Local>>,
    last_error: Option<String>,
    consecutive_failures: u32,
    refresh_count: u64,
}

impl<T: Default> Default for ViewState<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> ViewState<T> {
    pub fn new(initial: T) -> Self {
        Self {
            data: initial,
            last_seq: None,
            updated_at: None,
            last_error: None,
            consecutive_failures: 0,
            refresh_count: 0,
        }
    }

    /// Fold one poll result into the view.
    ///
    /// Arrival order decides; `seq` is kept for display only.
    pub fn apply(
        &mut self,
        seq: u64,
        at: DateTime<Local>,
        result: Result<T, ApiError>,
    ) -> Applied {
        self.last_seq = Some(seq);
        match result {
            Ok(data) => {
                self.data = data;
                self.updated_at = Some(at);
                self.last_error = None;
                self.consecutive_failures = 0;
                self.refresh_count += 1;
                Applied::Replaced
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                Applied::KeptStale
            }
        }
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn last_seq(&self) -> Option<u64> {
        self.last_seq
    }

    pub fn updated_at(&self) -> Option<DateTime<Local>> {
        self.updated_at
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn refresh_count(&self) -> u64 {
        self.refresh_count
    }

    /// True once at least one poll has succeeded.
    pub fn has_data(&self) -> bool {
        self.updated_at.is_some()
    }

    /// Showing data from before the most recent failed poll.
    pub fn is_stale(&self) -> bool {
        self.last_error.is_some()
    }
}
