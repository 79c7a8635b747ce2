//! Week batch status lifecycle, polling and push subscription

use chrono::NaiveDate;
use mealplan::batch::{GenerationStatus, StatusState, StatusTracker};
use mealplan::error::ApiError;
use mealplan::store::{DurableStore, MemoryDurableStore};
use mealplan::types::UserId;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

fn wednesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 21).unwrap()
}

fn tracker() -> Arc<StatusTracker> {
    let store: Arc<dyn DurableStore> = Arc::new(MemoryDurableStore::new());
    Arc::new(StatusTracker::new(store))
}

#[test]
fn test_lifecycle_through_completion() {
    let tracker = tracker();
    let user = UserId::new("u1");

    let created = tracker.create(&user, wednesday(), 7).unwrap();
    assert_eq!(created.state, StatusState::Pending);
    assert_eq!(created.week_start, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());

    tracker.begin(&user, wednesday()).unwrap();
    for _ in 0..6 {
        tracker.record_day_completed(&user, wednesday()).unwrap();
    }
    let in_progress = tracker.get_status(&user, wednesday()).unwrap().unwrap();
    assert_eq!(in_progress.state, StatusState::InProgress);
    assert!(tracker.ensure_readable(&user, wednesday()).is_err());

    let done = tracker.record_day_completed(&user, wednesday()).unwrap();
    assert_eq!(done.state, StatusState::Completed);
    assert_eq!(done.completed_days, 7);
    assert!(done.finished_at_ms.is_some());
    assert!(tracker.ensure_readable(&user, wednesday()).is_ok());
}

#[test]
fn test_any_day_of_the_week_addresses_the_same_status() {
    let tracker = tracker();
    let user = UserId::new("u1");
    tracker.create(&user, wednesday(), 7).unwrap();
    let sunday = NaiveDate::from_ymd_opt(2026, 10, 25).unwrap();
    assert!(tracker.get_status(&user, sunday).unwrap().is_some());
    let next_monday = NaiveDate::from_ymd_opt(2026, 10, 26).unwrap();
    assert!(tracker.get_status(&user, next_monday).unwrap().is_none());
}

#[test]
fn test_illegal_transitions_are_rejected() {
    let tracker = tracker();
    let user = UserId::new("u1");

    let missing = tracker.begin(&user, wednesday()).unwrap_err();
    assert!(matches!(missing, ApiError::InvalidTransition(_)));

    tracker.create(&user, wednesday(), 7).unwrap();
    let skipped = tracker.record_day_completed(&user, wednesday()).unwrap_err();
    assert!(matches!(skipped, ApiError::InvalidTransition(_)));

    tracker.begin(&user, wednesday()).unwrap();
    tracker.advance_to(&user, wednesday(), 3).unwrap();
    assert!(tracker.advance_to(&user, wednesday(), 2).is_err());
    assert!(tracker.advance_to(&user, wednesday(), 8).is_err());

    let failed = tracker.fail(&user, wednesday(), "upstream down").unwrap();
    assert_eq!(failed.state, StatusState::Failed);
    assert_eq!(failed.completed_days, 3);
    assert!(tracker.record_day_completed(&user, wednesday()).is_err());
    assert!(tracker.create(&user, wednesday(), 7).is_err());
}

#[test]
fn test_not_completed_error_names_state() {
    let tracker = tracker();
    let user = UserId::new("u1");
    match tracker.ensure_readable(&user, wednesday()).unwrap_err() {
        ApiError::StatusNotCompleted { state, .. } => assert_eq!(state, "missing"),
        other => panic!("unexpected error {other:?}"),
    }
    tracker.create(&user, wednesday(), 7).unwrap();
    match tracker.ensure_readable(&user, wednesday()).unwrap_err() {
        ApiError::StatusNotCompleted { state, .. } => assert_eq!(state, "pending"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_poll_status_returns_terminal_status() {
    let tracker = tracker();
    let user = UserId::new("u1");
    tracker.create(&user, wednesday(), 7).unwrap();
    tracker.begin(&user, wednesday()).unwrap();

    let writer = tracker.clone();
    let writer_user = user.clone();
    tokio::spawn(async move {
        for _ in 0..7 {
            tokio::time::sleep(Duration::from_secs(3)).await;
            writer.record_day_completed(&writer_user, wednesday()).unwrap();
        }
    });

    let mut observed = Vec::new();
    let done = tracker
        .poll_status(
            &user,
            wednesday(),
            Duration::from_secs(5),
            Duration::from_secs(120),
            |status| observed.push(status.completed_days),
        )
        .await
        .unwrap();
    assert_eq!(done.state, StatusState::Completed);
    assert_eq!(observed.last(), Some(&7));
    assert!(observed.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test(start_paused = true)]
async fn test_poll_status_times_out() {
    let tracker = tracker();
    let user = UserId::new("u1");
    tracker.create(&user, wednesday(), 7).unwrap();

    let err = tracker
        .poll_status(
            &user,
            wednesday(),
            Duration::from_secs(5),
            Duration::from_secs(12),
            |_| {},
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Timeout(_)));
    assert!(err.to_string().contains("pending"));
}

#[tokio::test]
async fn test_subscription_ends_with_failed_status() {
    let tracker = tracker();
    let user = UserId::new("u1");
    tracker.create(&user, wednesday(), 7).unwrap();

    let seen: Arc<Mutex<Vec<GenerationStatus>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let subscription = tracker.subscribe_status(&user, wednesday(), move |status| {
        sink.lock().push(status.clone());
    });

    tracker.begin(&user, wednesday()).unwrap();
    tracker.record_day_completed(&user, wednesday()).unwrap();
    tracker.fail(&user, wednesday(), "2026-10-20: cache miss").unwrap();

    tokio::time::timeout(Duration::from_secs(5), subscription.finished())
        .await
        .unwrap();

    let seen = seen.lock();
    let last = seen.last().unwrap();
    assert_eq!(last.state, StatusState::Failed);
    assert_eq!(last.error.as_deref(), Some("2026-10-20: cache miss"));
    assert!(seen
        .windows(2)
        .all(|w| w[0].completed_days <= w[1].completed_days));
}
