use anyhow::{bail, Result};
use chrono::Utc;
use rusqlite::Row;

use crate::db::models::{SleepNight, MAX_QUALITY, MIN_QUALITY};

pub fn current_time_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn validate_quality(quality: i32) -> Result<i32> {
    if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
        bail!("sleep quality {quality} outside {MIN_QUALITY}..={MAX_QUALITY}");
    }
    Ok(quality)
}

pub fn row_to_night(row: &Row) -> Result<SleepNight> {
    Ok(SleepNight {
        night_id: row.get("night_id")?,
        start_time_milli: row.get("start_time_milli")?,
        end_time_milli: row.get("end_time_milli")?,
        sleep_quality: row.get("quality_rating")?,
    })
}
