//! Whole-week batches and the shopping list built from them

use chrono::NaiveDate;
use mealplan::batch::{build_shopping_list, StatusState, WeekBatchRunner};
use mealplan::error::ApiError;
use mealplan::provider::{ScriptedProvider, ScriptedReply};
use mealplan::resolver::TieredResolver;
use mealplan::store::{DurableStore, LocalCache};
use mealplan::types::{MealType, UserId};
use std::sync::Arc;

use crate::integration::test_utils::{
    decision_json, expansion_json, is_decision_call, menu_provider, pipeline, services, snapshot,
};

fn wednesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 21).unwrap()
}

const MEALS: [MealType; 2] = [MealType::Lunch, MealType::Dinner];

#[tokio::test]
async fn test_week_completes_and_feeds_shopping_list() {
    let provider = menu_provider();
    let services = services(pipeline(provider.clone()));
    let runner = WeekBatchRunner::new(services.resolver.clone(), services.tracker.clone());
    let user = UserId::new("u1");

    let status = runner
        .run_week(&user, wednesday(), &snapshot(), &MEALS, &[], &[])
        .await
        .unwrap();
    assert_eq!(status.state, StatusState::Completed);
    assert_eq!(status.completed_days, 7);
    assert_eq!(provider.calls(), 28);

    let list = build_shopping_list(
        &services.tracker,
        &user,
        wednesday(),
        &MEALS,
        &["ONION".to_string()],
    )
    .unwrap();
    assert!(list.missing.is_empty());

    let olive_oil = list
        .items
        .iter()
        .find(|item| item.name == "olive oil")
        .unwrap();
    assert_eq!(olive_oil.unit, "tbsp");
    assert!((olive_oil.amount - 42.0).abs() < 1e-9);
    assert_eq!(olive_oil.used_in, vec!["main course", "side course"]);

    let onion = list.items.iter().find(|item| item.name == "onion").unwrap();
    assert!(onion.in_pantry);
    assert!(list.to_buy().all(|item| item.name != "onion"));
}

#[tokio::test]
async fn test_rerunning_a_completed_week_generates_nothing() {
    let provider = menu_provider();
    let services = services(pipeline(provider.clone()));
    let runner = WeekBatchRunner::new(services.resolver.clone(), services.tracker.clone());
    let user = UserId::new("u1");

    runner
        .run_week(&user, wednesday(), &snapshot(), &MEALS, &[], &[])
        .await
        .unwrap();
    let again = runner
        .run_week(&user, wednesday(), &snapshot(), &MEALS, &[], &[])
        .await
        .unwrap();
    assert_eq!(again.state, StatusState::Completed);
    assert_eq!(provider.calls(), 28);
}

#[tokio::test]
async fn test_failed_day_marks_batch_failed_and_blocks_reads() {
    let provider = Arc::new(ScriptedProvider::from_fn("scripted-model", |messages, _| {
        if !is_decision_call(messages) {
            return ScriptedReply::text(expansion_json());
        }
        if messages[1].content.contains("(2026-10-22)") {
            ScriptedReply::unavailable("rate limited")
        } else {
            ScriptedReply::text(decision_json("greek", 30, "Souvlaki"))
        }
    }));
    let services = services(pipeline(provider));
    let runner = WeekBatchRunner::new(services.resolver.clone(), services.tracker.clone());
    let user = UserId::new("u1");

    let err = runner
        .run_week(&user, wednesday(), &snapshot(), &MEALS, &[], &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::CacheMiss { .. }));

    let status = services.tracker.get_status(&user, wednesday()).unwrap().unwrap();
    assert_eq!(status.state, StatusState::Failed);
    assert_eq!(status.completed_days, 3);
    assert!(status.error.unwrap().starts_with("2026-10-22"));

    let blocked = build_shopping_list(&services.tracker, &user, wednesday(), &MEALS, &[]);
    assert!(matches!(blocked, Err(ApiError::StatusNotCompleted { .. })));
}

#[tokio::test]
async fn test_retrying_a_failed_week_resumes_from_stored_days() {
    let flaky = Arc::new(ScriptedProvider::from_fn("scripted-model", |messages, _| {
        if !is_decision_call(messages) {
            return ScriptedReply::text(expansion_json());
        }
        if messages[1].content.contains("(2026-10-22)") {
            ScriptedReply::unavailable("rate limited")
        } else {
            ScriptedReply::text(decision_json("greek", 30, "Souvlaki"))
        }
    }));
    let services = services(pipeline(flaky));
    let user = UserId::new("u1");
    WeekBatchRunner::new(services.resolver.clone(), services.tracker.clone())
        .run_week(&user, wednesday(), &snapshot(), &MEALS, &[], &[])
        .await
        .unwrap_err();

    let healthy = menu_provider();
    let store: Arc<dyn DurableStore> = services.durable.clone();
    let local: Arc<dyn LocalCache> = services.local.clone();
    let resolver = Arc::new(TieredResolver::new(store, local, pipeline(healthy.clone())));
    let status = WeekBatchRunner::new(resolver, services.tracker.clone())
        .run_week(&user, wednesday(), &snapshot(), &MEALS, &[], &[])
        .await
        .unwrap();

    assert_eq!(status.state, StatusState::Completed);
    assert_eq!(status.completed_days, 7);
    assert!(status.error.is_none());
    // Monday to Wednesday came from the durable tier
    assert_eq!(healthy.calls(), 16);

    let list = build_shopping_list(&services.tracker, &user, wednesday(), &MEALS, &[]).unwrap();
    assert!(!list.items.is_empty());
    assert!(list.missing.is_empty());
}
