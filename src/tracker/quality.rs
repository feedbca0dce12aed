use anyhow::Result;

use crate::{
    db::{validate_quality, Database, SleepNight},
    log_info, log_warn,
};

use super::{EventQueue, QualityEvent};

const ENABLE_LOGS: bool = true;

/// Rating screen for one stopped night.
pub struct SleepQualityViewModel {
    db: Database,
    night_key: i64,
    events: EventQueue<QualityEvent>,
}

impl SleepQualityViewModel {
    pub fn new(db: Database, night_key: i64) -> Self {
        Self {
            db,
            night_key,
            events: EventQueue::new(),
        }
    }

    pub fn night_key(&self) -> i64 {
        self.night_key
    }

    /// Stores `quality` on the night and sends the user back to the tracker.
    /// A night that no longer exists is skipped without error.
    pub async fn on_set_sleep_quality(&self, quality: i32) -> Result<Option<SleepNight>> {
        let quality = validate_quality(quality)?;

        let rated = match self.db.get_night(self.night_key).await? {
            Some(mut night) => {
                night.sleep_quality = quality;
                self.db.update_night(&night).await?;
                log_info!("Rated night {} with {}", night.night_id, quality);
                Some(night)
            }
            None => {
                log_warn!("Night {} not found; rating dropped", self.night_key);
                None
            }
        };

        self.events.push(QualityEvent::NavigateToSleepTracker);
        Ok(rated)
    }

    pub async fn drain_events(&self) -> Vec<QualityEvent> {
        self.events.drain().await
    }
}
