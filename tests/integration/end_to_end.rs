//! A full Tuesday: preferences in, three validated dinner recipes out

use chrono::NaiveDate;
use mealplan::menu::{CourseSlot, MenuBundle};
use mealplan::orchestrator::{DayPlanSession, DayPlanner, FirstReady};
use mealplan::preferences::{hash_preferences, PreferenceSnapshot};
use mealplan::resolver::{ResolutionSource, TieredResolver};
use mealplan::store::{load_bundle, BundleKey, DurableStore, FileLocalCache, SledDurableStore};
use mealplan::types::{DayOfWeek, MealType, UserId};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use crate::integration::test_utils::{menu_provider, pipeline};

fn assert_complete(bundle: &MenuBundle, ceiling: u32) {
    let decision = bundle.decision();
    assert!(decision.total_time_minutes <= ceiling);
    assert_eq!(bundle.recipes().len(), 3);
    for (recipe, slot) in bundle.recipes().iter().zip(CourseSlot::ALL) {
        assert_eq!(recipe.slot, slot);
        assert!(recipe.ingredients.len() >= 2, "{} has too few ingredients", slot);
        assert!(recipe.instructions.len() >= 3, "{} has too few steps", slot);
        assert!(!decision.dish(slot).is_empty());
    }
}

#[tokio::test]
async fn test_high_activity_tuesday_dinner() {
    let dir = TempDir::new().unwrap();
    let prefs_path = dir.path().join("prefs.toml");
    std::fs::write(
        &prefs_path,
        r#"
allergies = ["peanut"]
cuisine_preferences = ["Turkish"]
time_preference = "moderate"

[routine.tuesday]
context = "high-activity"
"#,
    )
    .unwrap();
    let snapshot = PreferenceSnapshot::from_path(&prefs_path).unwrap();

    let provider = menu_provider();
    let durable = Arc::new(SledDurableStore::new(dir.path().join("durable")).unwrap());
    let store: Arc<dyn DurableStore> = durable.clone();
    let local = Arc::new(FileLocalCache::new(dir.path().join("local"), Duration::from_secs(60)).unwrap());
    let resolver = Arc::new(TieredResolver::new(store, local, pipeline(provider.clone())));
    let planner = DayPlanner::new(resolver);

    let tuesday = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
    assert_eq!(DayOfWeek::of(tuesday), DayOfWeek::Tuesday);
    let session = Arc::new(DayPlanSession::new(tuesday));
    let user = UserId::new("u1");
    planner
        .start_day_plan(&session, &user, &[MealType::Dinner], &snapshot)
        .unwrap();

    assert_eq!(
        planner.wait_for_first_ready(&session).await,
        FirstReady::Finished {
            meal_type: MealType::Dinner,
            succeeded: true
        }
    );
    let outcome = planner.wait_for_all(&session, Duration::from_secs(10)).await;
    let resolution = &outcome.ready[&MealType::Dinner];
    assert_eq!(resolution.source, ResolutionSource::Generated);
    assert_complete(&resolution.bundle, 45);

    let requests = provider.requests();
    assert!(requests[0][1].content.contains("High-activity day"));
    assert!(requests[0][1].content.contains("must not exceed 45 minutes"));

    let key = BundleKey::new(user, tuesday, MealType::Dinner);
    let record = load_bundle(durable.as_ref(), &key).unwrap().unwrap();
    assert_eq!(record.bundle, resolution.bundle);
    assert_eq!(record.meta.unwrap().preference_hash, hash_preferences(&snapshot));
}
