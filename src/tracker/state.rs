use std::sync::Arc;

use serde::Serialize;

use crate::db::SleepNight;

/// What the tracker screen knows: the night being recorded and the history.
#[derive(Debug, Clone, Default)]
pub struct TrackerState {
    pub tonight: Option<SleepNight>,
    pub nights: Arc<Vec<SleepNight>>,
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_visible(&self) -> bool {
        self.tonight.is_none()
    }

    pub fn stop_visible(&self) -> bool {
        self.tonight.is_some()
    }

    pub fn clear_visible(&self) -> bool {
        !self.nights.is_empty()
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            tonight: self.tonight.clone(),
            nights: Arc::clone(&self.nights),
            start_visible: self.start_visible(),
            stop_visible: self.stop_visible(),
            clear_visible: self.clear_visible(),
        }
    }
}

/// Immutable copy of [`TrackerState`] with the derived button flags.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSnapshot {
    pub tonight: Option<SleepNight>,
    pub nights: Arc<Vec<SleepNight>>,
    pub start_visible: bool,
    pub stop_visible: bool,
    pub clear_visible: bool,
}

impl Default for TrackerSnapshot {
    fn default() -> Self {
        TrackerState::default().snapshot()
    }
}
