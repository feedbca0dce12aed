//! Sleep night data model.

use serde::{Deserialize, Serialize};

use crate::db::helpers::current_time_millis;

/// Rating stored until the user scores the night.
pub const UNRATED_QUALITY: i32 = -1;
pub const MIN_QUALITY: i32 = 0;
pub const MAX_QUALITY: i32 = 5;

/// One recorded sleep session.
///
/// `end_time_milli == start_time_milli` marks a night that is still being
/// tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepNight {
    /// Assigned by storage on insert; `0` until then.
    pub night_id: i64,
    pub start_time_milli: i64,
    pub end_time_milli: i64,
    pub sleep_quality: i32,
}

impl SleepNight {
    /// A night starting now, not yet stopped or rated.
    pub fn new() -> Self {
        Self::starting_at(current_time_millis())
    }

    pub fn starting_at(start_time_milli: i64) -> Self {
        Self {
            night_id: 0,
            start_time_milli,
            end_time_milli: start_time_milli,
            sleep_quality: UNRATED_QUALITY,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.end_time_milli == self.start_time_milli
    }

    pub fn is_rated(&self) -> bool {
        self.sleep_quality != UNRATED_QUALITY
    }

    pub fn duration_ms(&self) -> i64 {
        (self.end_time_milli - self.start_time_milli).max(0)
    }
}
