//! Integration tests for the tracker and rating view-models.

use std::time::Duration;

use sleeptracker_lib::{
    tracker::{QualityEvent, SleepQualityViewModel, SleepTrackerViewModel, TrackerEvent},
    Database, SleepNight,
};
use tokio::time::timeout;

async fn tracker() -> anyhow::Result<(Database, SleepTrackerViewModel)> {
    let db = Database::open_in_memory()?;
    let view_model = SleepTrackerViewModel::new(db.clone()).await?;
    Ok((db, view_model))
}

#[tokio::test]
async fn empty_table_shows_start_only() -> anyhow::Result<()> {
    let (_db, view_model) = tracker().await?;

    let snapshot = view_model.snapshot().await;
    assert!(snapshot.tonight.is_none());
    assert!(snapshot.start_visible);
    assert!(!snapshot.stop_visible);
    assert!(!snapshot.clear_visible);
    assert!(view_model.drain_events().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn unfinished_night_is_resumed_on_startup() -> anyhow::Result<()> {
    let db = Database::open_in_memory()?;
    let night_id = db.insert_night(&SleepNight::starting_at(1_000)).await?;

    let view_model = SleepTrackerViewModel::new(db.clone()).await?;
    let tonight = view_model.tonight().await.expect("night in progress");
    assert_eq!(tonight.night_id, night_id);

    let snapshot = view_model.snapshot().await;
    assert!(snapshot.stop_visible);
    assert!(!snapshot.start_visible);
    assert!(snapshot.clear_visible);
    Ok(())
}

#[tokio::test]
async fn finished_night_is_not_resumed() -> anyhow::Result<()> {
    let db = Database::open_in_memory()?;
    let mut night = SleepNight::starting_at(1_000);
    night.end_time_milli = 2_000;
    db.insert_night(&night).await?;

    let view_model = SleepTrackerViewModel::new(db.clone()).await?;
    assert!(view_model.tonight().await.is_none());
    assert!(view_model.snapshot().await.start_visible);
    Ok(())
}

#[tokio::test]
async fn stop_persists_end_time_and_asks_for_rating_once() -> anyhow::Result<()> {
    let db = Database::open_in_memory()?;
    let night_id = db.insert_night(&SleepNight::starting_at(1_000)).await?;
    let view_model = SleepTrackerViewModel::new(db.clone()).await?;

    let stopped = view_model
        .on_stop_tracking_at(2_000)
        .await?
        .expect("a night was in progress");
    assert_eq!(stopped.night_id, night_id);
    assert_eq!(stopped.end_time_milli, 2_000);

    let nights = db.get_all_nights().await?;
    assert_eq!(nights.len(), 1);
    assert_eq!(nights[0].start_time_milli, 1_000);
    assert_eq!(nights[0].end_time_milli, 2_000);

    assert_eq!(
        view_model.drain_events().await,
        vec![TrackerEvent::NavigateToSleepQuality(stopped)]
    );
    assert!(view_model.drain_events().await.is_empty());

    let snapshot = view_model.snapshot().await;
    assert!(snapshot.start_visible);
    assert!(!snapshot.stop_visible);
    assert_eq!(snapshot.nights.len(), 1);
    Ok(())
}

#[tokio::test]
async fn stop_without_night_is_a_no_op() -> anyhow::Result<()> {
    let (db, view_model) = tracker().await?;

    assert!(view_model.on_stop_tracking().await?.is_none());
    assert!(view_model.drain_events().await.is_empty());
    assert!(db.get_all_nights().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn repeated_start_stop_keeps_end_after_start() -> anyhow::Result<()> {
    let (db, view_model) = tracker().await?;

    for _ in 0..3 {
        let started = view_model.on_start_tracking().await?.expect("night started");
        assert!(started.is_in_progress());
        assert!(view_model.snapshot().await.stop_visible);

        // Same millisecond as the start on purpose.
        let stopped = view_model
            .on_stop_tracking_at(started.start_time_milli)
            .await?
            .expect("night stopped");
        assert!(stopped.end_time_milli > stopped.start_time_milli);
        assert!(view_model.snapshot().await.start_visible);
    }

    let nights = db.get_all_nights().await?;
    assert_eq!(nights.len(), 3);
    assert!(nights
        .iter()
        .all(|night| night.end_time_milli > night.start_time_milli));
    assert_eq!(view_model.drain_events().await.len(), 3);
    Ok(())
}

#[tokio::test]
async fn second_start_keeps_the_running_night() -> anyhow::Result<()> {
    let (db, view_model) = tracker().await?;

    let first = view_model.on_start_tracking_at(1_000).await?.expect("started");
    let second = view_model.on_start_tracking_at(5_000).await?.expect("running");
    assert_eq!(first.night_id, second.night_id);
    assert_eq!(db.get_all_nights().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn clear_resets_everything_and_shows_snackbar_once() -> anyhow::Result<()> {
    let (db, view_model) = tracker().await?;
    view_model.on_start_tracking_at(1_000).await?;
    view_model.on_stop_tracking_at(2_000).await?;
    view_model.on_start_tracking_at(3_000).await?;
    view_model.drain_events().await;

    view_model.on_clear().await?;

    assert!(db.get_all_nights().await?.is_empty());
    assert!(view_model.tonight().await.is_none());
    let snapshot = view_model.snapshot().await;
    assert!(snapshot.start_visible);
    assert!(!snapshot.clear_visible);

    assert_eq!(
        view_model.drain_events().await,
        vec![TrackerEvent::ShowSnackbar]
    );
    assert!(view_model.drain_events().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn clicking_a_night_emits_detail_navigation() -> anyhow::Result<()> {
    let (_db, view_model) = tracker().await?;

    view_model.on_sleep_night_clicked(17);
    let event = timeout(Duration::from_secs(5), view_model.next_event()).await?;
    assert_eq!(event, Some(TrackerEvent::NavigateToSleepDetail(17)));
    assert!(view_model.drain_events().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn subscribers_see_button_changes() -> anyhow::Result<()> {
    let (_db, view_model) = tracker().await?;
    let mut updates = view_model.subscribe();

    view_model.on_start_tracking().await?;
    assert!(updates.borrow_and_update().stop_visible);

    view_model.on_stop_tracking().await?;
    let latest = updates.borrow_and_update().clone();
    assert!(latest.start_visible);
    assert!(latest.clear_visible);
    Ok(())
}

#[tokio::test]
async fn history_written_elsewhere_reaches_the_view_model() -> anyhow::Result<()> {
    let (db, view_model) = tracker().await?;
    let mut updates = view_model.subscribe();

    let mut night = SleepNight::starting_at(1_000);
    night.end_time_milli = 2_000;
    db.insert_night(&night).await?;

    timeout(Duration::from_secs(5), async {
        loop {
            if updates.borrow_and_update().nights.len() == 1 {
                break;
            }
            updates.changed().await.expect("view-model alive");
        }
    })
    .await?;

    assert!(view_model.snapshot().await.clear_visible);
    Ok(())
}

#[tokio::test]
async fn disposed_view_model_rejects_work() -> anyhow::Result<()> {
    let (db, view_model) = tracker().await?;

    view_model.dispose();
    assert!(view_model.is_disposed());
    assert!(view_model.on_start_tracking().await.is_err());
    assert!(view_model.on_clear().await.is_err());
    assert!(db.get_all_nights().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn rating_a_stopped_night() -> anyhow::Result<()> {
    let (db, view_model) = tracker().await?;
    view_model.on_start_tracking_at(1_000).await?;
    let stopped = view_model
        .on_stop_tracking_at(2_000)
        .await?
        .expect("night stopped");

    let rating = SleepQualityViewModel::new(db.clone(), stopped.night_id);
    let rated = rating.on_set_sleep_quality(4).await?.expect("night exists");
    assert_eq!(rated.sleep_quality, 4);
    assert_eq!(
        rating.drain_events().await,
        vec![QualityEvent::NavigateToSleepTracker]
    );

    let stored = db.get_night(stopped.night_id).await?.expect("night exists");
    assert_eq!(stored.sleep_quality, 4);
    assert_eq!(stored.end_time_milli, 2_000);
    Ok(())
}

#[tokio::test]
async fn invalid_rating_is_rejected() -> anyhow::Result<()> {
    let (db, view_model) = tracker().await?;
    let started = view_model.on_start_tracking_at(1_000).await?.expect("started");
    view_model.on_stop_tracking_at(2_000).await?;

    let rating = SleepQualityViewModel::new(db.clone(), started.night_id);
    assert!(rating.on_set_sleep_quality(9).await.is_err());
    assert!(rating.drain_events().await.is_empty());

    let stored = db.get_night(started.night_id).await?.expect("night exists");
    assert!(!stored.is_rated());
    Ok(())
}

#[tokio::test]
async fn rating_a_missing_night_still_navigates_back() -> anyhow::Result<()> {
    let db = Database::open_in_memory()?;

    let rating = SleepQualityViewModel::new(db.clone(), 99);
    assert!(rating.on_set_sleep_quality(3).await?.is_none());
    assert_eq!(
        rating.drain_events().await,
        vec![QualityEvent::NavigateToSleepTracker]
    );
    Ok(())
}

#[tokio::test]
async fn dispose_fails_in_flight_clear_but_subscribers_see_the_write() -> anyhow::Result<()> {
    let (db, view_model) = tracker().await?;
    view_model.on_start_tracking_at(1_000).await?;
    view_model.on_stop_tracking_at(2_000).await?;
    view_model.drain_events().await;

    let mut history = db.watch_all_nights();
    let before = history.next().await.expect("database alive")?;
    assert_eq!(before.nights.len(), 1);

    // Keep the database thread busy so the clear is still pending on dispose.
    let _ = timeout(
        Duration::ZERO,
        db.execute(|_| {
            std::thread::sleep(Duration::from_millis(100));
            Ok(())
        }),
    )
    .await;

    let (cleared, ()) = tokio::join!(view_model.on_clear(), async {
        tokio::task::yield_now().await;
        view_model.dispose();
    });
    let err = cleared.expect_err("clear was still running when disposed");
    assert!(err.to_string().contains("view model disposed"));

    let after = timeout(Duration::from_secs(5), history.next())
        .await?
        .expect("database alive")?;
    assert!(after.nights.is_empty());
    assert!(db.get_all_nights().await?.is_empty());
    Ok(())
}
