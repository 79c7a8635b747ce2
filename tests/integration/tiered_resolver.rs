//! Tier ordering: durable, then generation, then the local copy

use chrono::NaiveDate;
use mealplan::error::{ApiError, ErrorKind};
use mealplan::generation::GenerationRequest;
use mealplan::preferences::PreferenceSnapshot;
use mealplan::provider::{ScriptedProvider, ScriptedReply};
use mealplan::resolver::{ResolutionSource, TieredResolver};
use mealplan::store::{
    load_bundle, BundleKey, DurableStore, LocalCache, MemoryDurableStore, MemoryLocalCache,
};
use mealplan::types::{MealType, UserId};
use std::sync::Arc;

use crate::integration::test_utils::{menu_provider, pipeline, services, snapshot};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()
}

fn request_for(snapshot: &PreferenceSnapshot) -> GenerationRequest {
    GenerationRequest::builder(date(), MealType::Lunch, snapshot)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_generated_bundle_lands_in_both_tiers() {
    let provider = menu_provider();
    let services = services(pipeline(provider.clone()));
    let user = UserId::new("u1");

    let resolution = services
        .resolver
        .resolve(&user, &request_for(&snapshot()))
        .await
        .unwrap();
    assert_eq!(resolution.source, ResolutionSource::Generated);
    assert!(resolution.preference_hash_matches);
    assert_eq!(provider.calls(), 2);

    let key = BundleKey::new(user, date(), MealType::Lunch);
    let record = load_bundle(services.durable.as_ref(), &key).unwrap().unwrap();
    assert_eq!(record.bundle, resolution.bundle);
    let meta = record.meta.unwrap();
    assert_eq!(meta.model, "scripted-model");
    assert_eq!(meta.content_hash, resolution.bundle.content_hash().unwrap());
    assert_eq!(services.local.len(), 1);
}

#[tokio::test]
async fn test_durable_hit_skips_generation() {
    let provider = menu_provider();
    let services = services(pipeline(provider.clone()));
    let user = UserId::new("u1");
    let request = request_for(&snapshot());

    let first = services.resolver.resolve(&user, &request).await.unwrap();
    let second = services.resolver.resolve(&user, &request).await.unwrap();
    assert_eq!(second.source, ResolutionSource::Durable);
    assert_eq!(second.bundle, first.bundle);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_durable_hit_under_changed_preferences_is_flagged_not_regenerated() {
    let provider = menu_provider();
    let services = services(pipeline(provider.clone()));
    let user = UserId::new("u1");

    services
        .resolver
        .resolve(&user, &request_for(&snapshot()))
        .await
        .unwrap();

    let mut changed = snapshot();
    changed.allergies.push("Shellfish".to_string());
    let resolution = services
        .resolver
        .resolve(&user, &request_for(&changed))
        .await
        .unwrap();
    assert_eq!(resolution.source, ResolutionSource::Durable);
    assert!(!resolution.preference_hash_matches);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_generation_failure_serves_local_copy() {
    let local = Arc::new(MemoryLocalCache::new());
    let local_tier: Arc<dyn LocalCache> = local.clone();
    let user = UserId::new("u1");
    let request = request_for(&snapshot());

    let warm_durable: Arc<dyn DurableStore> = Arc::new(MemoryDurableStore::new());
    let warm = TieredResolver::new(warm_durable, local_tier.clone(), pipeline(menu_provider()));
    let generated = warm.resolve(&user, &request).await.unwrap();

    let failing = Arc::new(ScriptedProvider::repeating(
        "down",
        ScriptedReply::unavailable("503 from upstream"),
    ));
    let cold_durable: Arc<dyn DurableStore> = Arc::new(MemoryDurableStore::new());
    let cold = TieredResolver::new(cold_durable, local_tier, pipeline(failing.clone()));

    let resolution = cold.resolve(&user, &request).await.unwrap();
    assert_eq!(resolution.source, ResolutionSource::StaleLocal);
    assert_eq!(resolution.bundle, generated.bundle);
    assert!(resolution.preference_hash_matches);
    assert_eq!(failing.calls(), 1);
}

#[tokio::test]
async fn test_all_tiers_empty_is_cache_miss_with_cause() {
    let bad_json = Arc::new(ScriptedProvider::repeating(
        "chatty",
        ScriptedReply::text("I would love to help you plan lunch!"),
    ));
    let services = services(pipeline(bad_json));
    let err = services
        .resolver
        .resolve(&UserId::new("u1"), &request_for(&snapshot()))
        .await
        .unwrap_err();

    match err {
        ApiError::CacheMiss { key, cause } => {
            assert_eq!(key, "u1/2026-10-20/lunch");
            assert_eq!(cause, Some(ErrorKind::ParseFailure));
        }
        other => panic!("expected CacheMiss, got {other:?}"),
    }
    assert!(services.durable.decision_count() == 0);
    assert!(services.local.is_empty());
}

#[tokio::test]
async fn test_users_do_not_share_bundles() {
    let provider = menu_provider();
    let services = services(pipeline(provider.clone()));
    let request = request_for(&snapshot());

    services.resolver.resolve(&UserId::new("u1"), &request).await.unwrap();
    let other = services
        .resolver
        .resolve(&UserId::new("u2"), &request)
        .await
        .unwrap();
    assert_eq!(other.source, ResolutionSource::Generated);
    assert_eq!(provider.calls(), 4);
}
