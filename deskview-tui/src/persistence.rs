//! UI state persistence: JSON save/load across restarts.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::app::{AppState, Panel};

/// Serializable subset of app state that persists across restarts.
/// Snapshot data is never persisted.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub active_panel: Panel,
    pub last_target: Option<u64>,
    pub use_browser: bool,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            active_panel: Panel::Cash,
            last_target: None,
            use_browser: false,
        }
    }
}

/// Read the state file. A missing file is normal on first run; an
/// unreadable or corrupt one is logged and replaced by defaults.
pub fn load(path: &Path) -> PersistedState {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return PersistedState::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read UI state");
            return PersistedState::default();
        }
    };
    serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "ignoring corrupt UI state");
        PersistedState::default()
    })
}

/// Write the state file through a sibling temp file so a crash mid-write
/// leaves the previous state intact.
pub fn save(path: &Path, state: &PersistedState) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(state)?)
        .with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

pub fn extract(app: &AppState) -> PersistedState {
    PersistedState {
        active_panel: app.active_panel,
        last_target: app.export.last_target.map(|t| t.value()),
        use_browser: app.export.use_browser,
    }
}

/// Apply persisted state. The last target pre-fills the export input.
pub fn apply(app: &mut AppState, state: PersistedState) {
    app.active_panel = state.active_panel;
    if let Some(target) = state.last_target {
        app.export.input = target.to_string();
    }
    app.export.use_browser = state.use_browser;
}
