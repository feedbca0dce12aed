use std::sync::Arc;

use serde::Serialize;

use crate::db::SleepNight;

/// Ratings at or below this are flagged unless configured otherwise.
pub const DEFAULT_LOW_QUALITY_THRESHOLD: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RowStyle {
    Normal,
    Flagged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NightRow {
    pub night_id: i64,
    pub quality_text: String,
    pub style: RowStyle,
}

/// Turns the history into list rows. Any new list means a full redraw.
#[derive(Debug)]
pub struct SleepNightAdapter {
    data: Arc<Vec<SleepNight>>,
    low_quality_threshold: i32,
    needs_redraw: bool,
}

impl SleepNightAdapter {
    pub fn new(low_quality_threshold: i32) -> Self {
        Self {
            data: Arc::new(Vec::new()),
            low_quality_threshold,
            needs_redraw: false,
        }
    }

    pub fn set_data(&mut self, data: Arc<Vec<SleepNight>>) {
        if Arc::ptr_eq(&self.data, &data) {
            return;
        }
        self.data = data;
        self.needs_redraw = true;
    }

    pub fn item_count(&self) -> usize {
        self.data.len()
    }

    pub fn bind(&self, position: usize) -> Option<NightRow> {
        let night = self.data.get(position)?;
        let style = if night.sleep_quality <= self.low_quality_threshold {
            RowStyle::Flagged
        } else {
            RowStyle::Normal
        };

        Some(NightRow {
            night_id: night.night_id,
            quality_text: night.sleep_quality.to_string(),
            style,
        })
    }

    pub fn rows(&self) -> Vec<NightRow> {
        (0..self.item_count())
            .filter_map(|position| self.bind(position))
            .collect()
    }

    /// Returns whether the list changed since the last call, and resets it.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }
}

impl Default for SleepNightAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_LOW_QUALITY_THRESHOLD)
    }
}
