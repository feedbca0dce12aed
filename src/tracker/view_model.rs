use std::{future::Future, sync::Arc};

use anyhow::{anyhow, Result};
use tokio::{
    sync::{watch, Mutex, MutexGuard},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    db::{current_time_millis, Database, NightsSnapshot, SleepNight},
    log_error, log_info, log_warn,
};

use super::{EventQueue, TrackerEvent, TrackerSnapshot, TrackerState};

const ENABLE_LOGS: bool = true;

/// Tracker screen logic: starts and stops nights, clears history, and keeps
/// the button flags in step with storage.
///
/// Operations run one at a time. Dropping the view-model (or calling
/// [`SleepTrackerViewModel::dispose`]) cancels whatever is still pending.
pub struct SleepTrackerViewModel {
    db: Database,
    shared: Arc<Shared>,
    events: EventQueue<TrackerEvent>,
    operation: Mutex<()>,
    cancel: CancellationToken,
    watcher: std::sync::Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    state: Mutex<TrackerState>,
    nights_version: Mutex<Option<u64>>,
    snapshot_tx: watch::Sender<TrackerSnapshot>,
}

impl Shared {
    fn publish(&self, state: &MutexGuard<'_, TrackerState>) {
        self.snapshot_tx.send_replace(state.snapshot());
    }

    /// Applies `snapshot` unless a newer one is already in place.
    async fn apply_nights(&self, snapshot: NightsSnapshot) {
        let mut version = self.nights_version.lock().await;
        if matches!(*version, Some(current) if current > snapshot.version) {
            return;
        }
        *version = Some(snapshot.version);

        let mut state = self.state.lock().await;
        state.nights = snapshot.nights;
        self.publish(&state);
    }

    async fn set_tonight(&self, tonight: Option<SleepNight>) {
        let mut state = self.state.lock().await;
        state.tonight = tonight;
        self.publish(&state);
    }
}

impl SleepTrackerViewModel {
    /// Builds the view-model, starts following the history and restores an
    /// unfinished night if the last run left one behind.
    pub async fn new(db: Database) -> Result<Self> {
        let (snapshot_tx, _) = watch::channel(TrackerSnapshot::default());
        let view_model = Self {
            db,
            shared: Arc::new(Shared {
                state: Mutex::new(TrackerState::new()),
                nights_version: Mutex::new(None),
                snapshot_tx,
            }),
            events: EventQueue::new(),
            operation: Mutex::new(()),
            cancel: CancellationToken::new(),
            watcher: std::sync::Mutex::new(None),
        };

        view_model.spawn_nights_watcher();
        view_model.initialize_tonight().await?;
        view_model.refresh_nights().await?;

        Ok(view_model)
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackerSnapshot> {
        self.shared.snapshot_tx.subscribe()
    }

    pub async fn snapshot(&self) -> TrackerSnapshot {
        self.shared.state.lock().await.snapshot()
    }

    pub async fn tonight(&self) -> Option<SleepNight> {
        self.shared.state.lock().await.tonight.clone()
    }

    /// Waits for the next one-shot event.
    pub async fn next_event(&self) -> Option<TrackerEvent> {
        self.events.next().await
    }

    /// Takes every pending one-shot event; each is returned only once.
    pub async fn drain_events(&self) -> Vec<TrackerEvent> {
        self.events.drain().await
    }

    /// Reloads `tonight`: the latest night counts as in progress only while
    /// its end time still equals its start time.
    pub async fn initialize_tonight(&self) -> Result<()> {
        let _operation = self.operation.lock().await;
        self.cancellable(async {
            let tonight = self.tonight_from_database().await?;
            match &tonight {
                Some(night) => log_info!("Resuming night {} in progress", night.night_id),
                None => log_info!("No night in progress"),
            }
            self.shared.set_tonight(tonight).await;
            Ok(())
        })
        .await
    }

    pub async fn on_start_tracking(&self) -> Result<Option<SleepNight>> {
        self.on_start_tracking_at(current_time_millis()).await
    }

    /// Starts a night at `start_time_milli`. If a night is already being
    /// tracked it is returned unchanged and nothing is inserted.
    pub async fn on_start_tracking_at(&self, start_time_milli: i64) -> Result<Option<SleepNight>> {
        let _operation = self.operation.lock().await;
        self.cancellable(async {
            if let Some(current) = self.tonight().await {
                log_warn!(
                    "Night {} already in progress; ignoring start",
                    current.night_id
                );
                return Ok(Some(current));
            }

            let night_id = self
                .db
                .insert_night(&SleepNight::starting_at(start_time_milli))
                .await?;
            log_info!("Started night {night_id}");

            let tonight = self.tonight_from_database().await?;
            self.shared.set_tonight(tonight.clone()).await;
            self.refresh_nights().await?;
            Ok(tonight)
        })
        .await
    }

    pub async fn on_stop_tracking(&self) -> Result<Option<SleepNight>> {
        self.on_stop_tracking_at(current_time_millis()).await
    }

    /// Ends the current night at `end_time_milli` and asks for a rating.
    ///
    /// The stored end time is kept strictly after the start time so the
    /// night is never mistaken for one still in progress.
    pub async fn on_stop_tracking_at(&self, end_time_milli: i64) -> Result<Option<SleepNight>> {
        let _operation = self.operation.lock().await;
        self.cancellable(async {
            let Some(mut night) = self.tonight().await else {
                log_warn!("Stop requested with no night in progress");
                return Ok(None);
            };

            night.end_time_milli = end_time_milli.max(night.start_time_milli + 1);
            if !self.db.update_night(&night).await? {
                log_warn!("Night {} vanished before it could be stopped", night.night_id);
            }
            log_info!(
                "Stopped night {} after {} ms",
                night.night_id,
                night.duration_ms()
            );

            self.shared.set_tonight(None).await;
            self.refresh_nights().await?;
            self.events
                .push(TrackerEvent::NavigateToSleepQuality(night.clone()));
            Ok(Some(night))
        })
        .await
    }

    /// Wipes the history. The snackbar event goes out before the delete.
    pub async fn on_clear(&self) -> Result<()> {
        let _operation = self.operation.lock().await;
        self.cancellable(async {
            self.events.push(TrackerEvent::ShowSnackbar);
            let removed = self.db.clear_nights().await?;
            log_info!("Cleared {removed} nights");

            self.shared.set_tonight(None).await;
            self.refresh_nights().await?;
            Ok(())
        })
        .await
    }

    /// Reloads the history, e.g. after another screen rated a night.
    pub async fn refresh_history(&self) -> Result<()> {
        let _operation = self.operation.lock().await;
        self.cancellable(self.refresh_nights()).await
    }

    pub fn on_sleep_night_clicked(&self, night_id: i64) {
        self.events.push(TrackerEvent::NavigateToSleepDetail(night_id));
    }

    /// Cancels pending work and stops following the history. Writes already
    /// handed to storage are not rolled back.
    pub fn dispose(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();

        let mut guard = match self.watcher.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = guard.take() {
            handle.abort();
        }
        log_info!("Tracker view-model disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    async fn tonight_from_database(&self) -> Result<Option<SleepNight>> {
        let night = self.db.get_tonight().await?;
        Ok(night.filter(SleepNight::is_in_progress))
    }

    async fn refresh_nights(&self) -> Result<()> {
        let snapshot = self.db.nights_snapshot().await?;
        self.shared.apply_nights(snapshot).await;
        Ok(())
    }

    async fn cancellable<F, T>(&self, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(anyhow!("view model disposed"));
        }

        tokio::select! {
            _ = self.cancel.cancelled() => Err(anyhow!("view model disposed")),
            result = work => result,
        }
    }

    fn spawn_nights_watcher(&self) {
        let mut subscription = self.db.watch_all_nights();
        let shared = self.shared.clone();
        let cancel = self.cancel.clone();

        let handle = tokio::spawn(async move {
            loop {
                let next = tokio::select! {
                    _ = cancel.cancelled() => break,
                    next = subscription.next() => next,
                };

                match next {
                    Some(Ok(snapshot)) => shared.apply_nights(snapshot).await,
                    Some(Err(err)) => log_error!("Failed to reload sleep history: {err:#}"),
                    None => break,
                }
            }
        });

        let mut guard = match self.watcher.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(handle);
    }
}

impl Drop for SleepTrackerViewModel {
    fn drop(&mut self) {
        self.dispose();
    }
}
