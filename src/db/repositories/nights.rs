use std::sync::Arc;

use anyhow::Result;
use rusqlite::{params, OptionalExtension};
use tokio::sync::watch;

use crate::db::{
    connection::{Database, WeakDatabase},
    helpers::row_to_night,
    models::SleepNight,
};

const NIGHT_COLUMNS: &str = "night_id, start_time_milli, end_time_milli, quality_rating";

impl Database {
    /// Appends `night` and returns the id storage assigned to it.
    pub async fn insert_night(&self, night: &SleepNight) -> Result<i64> {
        let record = night.clone();
        self.execute_write(move |conn| {
            conn.execute(
                "INSERT INTO sleep_history (start_time_milli, end_time_milli, quality_rating)
                 VALUES (?1, ?2, ?3)",
                params![
                    record.start_time_milli,
                    record.end_time_milli,
                    record.sleep_quality,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// Overwrites the row with `night.night_id`. Returns `false` when no
    /// such row exists.
    pub async fn update_night(&self, night: &SleepNight) -> Result<bool> {
        let record = night.clone();
        self.execute_write(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE sleep_history
                 SET start_time_milli = ?1,
                     end_time_milli = ?2,
                     quality_rating = ?3
                 WHERE night_id = ?4",
                params![
                    record.start_time_milli,
                    record.end_time_milli,
                    record.sleep_quality,
                    record.night_id,
                ],
            )?;
            Ok(rows_affected > 0)
        })
        .await
    }

    pub async fn get_night(&self, key: i64) -> Result<Option<SleepNight>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NIGHT_COLUMNS} FROM sleep_history WHERE night_id = ?1"
            ))?;
            let night = stmt
                .query_row(params![key], |row| Ok(row_to_night(row)))
                .optional()?
                .transpose()?;
            Ok(night)
        })
        .await
    }

    /// Most recently inserted night, if any.
    pub async fn get_tonight(&self) -> Result<Option<SleepNight>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NIGHT_COLUMNS}
                 FROM sleep_history
                 ORDER BY night_id DESC
                 LIMIT 1"
            ))?;

            let mut rows = stmt.query([])?;
            let night = match rows.next()? {
                Some(row) => Some(row_to_night(row)?),
                None => None,
            };
            Ok(night)
        })
        .await
    }

    /// Full history, newest start time first.
    pub async fn get_all_nights(&self) -> Result<Vec<SleepNight>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NIGHT_COLUMNS}
                 FROM sleep_history
                 ORDER BY start_time_milli DESC, night_id DESC"
            ))?;

            let mut rows = stmt.query([])?;
            let mut nights = Vec::new();
            while let Some(row) = rows.next()? {
                nights.push(row_to_night(row)?);
            }

            Ok(nights)
        })
        .await
    }

    /// Deletes every night and returns how many rows went away.
    pub async fn clear_nights(&self) -> Result<usize> {
        self.execute_write(|conn| {
            let removed = conn.execute("DELETE FROM sleep_history", [])?;
            Ok(removed)
        })
        .await
    }

    /// Current history tagged with the change version it is at least as new as.
    pub async fn nights_snapshot(&self) -> Result<NightsSnapshot> {
        let version = self.change_version();
        let nights = self.get_all_nights().await?;
        Ok(NightsSnapshot {
            version,
            nights: Arc::new(nights),
        })
    }

    /// Live view of [`Database::get_all_nights`]: yields the current history
    /// and then a fresh snapshot after every write.
    pub fn watch_all_nights(&self) -> NightsSubscription {
        NightsSubscription {
            db: self.downgrade(),
            changes: self.subscribe_changes(),
            primed: false,
        }
    }
}

/// History as of change `version`.
#[derive(Debug, Clone)]
pub struct NightsSnapshot {
    pub version: u64,
    pub nights: Arc<Vec<SleepNight>>,
}

pub struct NightsSubscription {
    db: WeakDatabase,
    changes: watch::Receiver<u64>,
    primed: bool,
}

impl NightsSubscription {
    /// Waits for the next snapshot. The first call resolves immediately.
    /// Returns `None` once the database has been dropped.
    pub async fn next(&mut self) -> Option<Result<NightsSnapshot>> {
        if self.primed {
            if self.changes.changed().await.is_err() {
                return None;
            }
        } else {
            self.primed = true;
        }
        let version = *self.changes.borrow_and_update();

        let db = self.db.upgrade()?;
        let result = db.get_all_nights().await.map(|nights| NightsSnapshot {
            version,
            nights: Arc::new(nights),
        });
        Some(result)
    }
}
