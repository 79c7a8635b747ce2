//! Resolver and batches over the on-disk tiers

use chrono::NaiveDate;
use mealplan::batch::{StatusState, StatusTracker, WeekBatchRunner};
use mealplan::generation::{GenerationRequest, MenuGenerator};
use mealplan::resolver::{ResolutionSource, TieredResolver};
use mealplan::store::{
    load_bundle, BundleKey, DurableStore, FileLocalCache, LocalCache, SledDurableStore,
};
use mealplan::types::{MealType, UserId};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use crate::integration::test_utils::{menu_provider, pipeline, snapshot};

const TTL: Duration = Duration::from_secs(3600);

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()
}

fn request() -> GenerationRequest {
    GenerationRequest::builder(date(), MealType::Dinner, &snapshot())
        .build()
        .unwrap()
}

fn open(dir: &TempDir, generator: Arc<dyn MenuGenerator>) -> (Arc<SledDurableStore>, TieredResolver) {
    let durable = Arc::new(SledDurableStore::new(dir.path().join("durable")).unwrap());
    let local: Arc<dyn LocalCache> =
        Arc::new(FileLocalCache::new(dir.path().join("local"), TTL).unwrap());
    let store: Arc<dyn DurableStore> = durable.clone();
    (durable, TieredResolver::new(store, local, generator))
}

#[tokio::test]
async fn test_bundle_survives_restart() {
    let dir = TempDir::new().unwrap();
    let user = UserId::new("u1");

    let provider = menu_provider();
    let generated = {
        let (durable, resolver) = open(&dir, pipeline(provider.clone()));
        let resolution = resolver.resolve(&user, &request()).await.unwrap();
        durable.flush().unwrap();
        resolution
    };

    let (_, resolver) = open(&dir, pipeline(provider.clone()));
    let again = resolver.resolve(&user, &request()).await.unwrap();
    assert_eq!(again.source, ResolutionSource::Durable);
    assert_eq!(again.bundle, generated.bundle);
    assert!(again.preference_hash_matches);
    assert_eq!(provider.calls(), 2);

    let local_file = dir.path().join("local").join("2026-10-20").join("dinner.json");
    assert!(local_file.exists());
}

#[tokio::test]
async fn test_partially_written_bundle_is_regenerated() {
    let dir = TempDir::new().unwrap();
    let user = UserId::new("u1");
    let provider = menu_provider();
    let (durable, resolver) = open(&dir, pipeline(provider.clone()));

    let generated = pipeline(menu_provider()).generate(&request()).await.unwrap();
    let key = BundleKey::new(user.clone(), date(), MealType::Dinner);
    durable.put_decision(&key, generated.bundle.decision()).unwrap();
    durable
        .put_recipe(&key, &generated.bundle.recipes()[0])
        .unwrap();
    assert!(load_bundle(durable.as_ref(), &key).unwrap().is_none());

    let resolution = resolver.resolve(&user, &request()).await.unwrap();
    assert_eq!(resolution.source, ResolutionSource::Generated);
    assert_eq!(provider.calls(), 2);
    assert!(load_bundle(durable.as_ref(), &key).unwrap().is_some());
}

#[tokio::test]
async fn test_week_status_is_listed_after_run() {
    let dir = TempDir::new().unwrap();
    let (durable, resolver) = open(&dir, pipeline(menu_provider()));
    let store: Arc<dyn DurableStore> = durable.clone();
    let tracker = Arc::new(StatusTracker::new(store));
    let runner = WeekBatchRunner::new(Arc::new(resolver), tracker);

    runner
        .run_week(&UserId::new("u1"), date(), &snapshot(), &[MealType::Dinner], &[], &[])
        .await
        .unwrap();

    let statuses = durable.list_statuses().unwrap();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].state, StatusState::Completed);
    assert_eq!(statuses[0].week_start, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
}
