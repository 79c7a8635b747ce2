//! Two-stage generation against scripted providers

use chrono::NaiveDate;
use mealplan::error::ApiError;
use mealplan::generation::{GenerationPipeline, GenerationRequest, MenuGenerator, PipelineSettings};
use mealplan::menu::{CourseSlot, ExtraType};
use mealplan::provider::{ScriptedProvider, ScriptedReply};
use mealplan::types::MealType;
use std::sync::Arc;

use crate::integration::test_utils::{decision_json, expansion_json, recipe_json, snapshot};

fn tuesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()
}

fn request() -> GenerationRequest {
    GenerationRequest::builder(tuesday(), MealType::Dinner, &snapshot())
        .avoid(&["Mushroom".to_string()])
        .build()
        .unwrap()
}

fn pipeline_with(replies: Vec<ScriptedReply>) -> (Arc<ScriptedProvider>, GenerationPipeline) {
    let provider = Arc::new(ScriptedProvider::sequence("scripted-model", replies));
    let pipeline = GenerationPipeline::new(provider.clone(), PipelineSettings::default());
    (provider, pipeline)
}

#[tokio::test]
async fn test_prompts_carry_request_context() {
    let (provider, pipeline) = pipeline_with(vec![
        ScriptedReply::text(decision_json("turkish", 40, "Chicken shish")),
        ScriptedReply::text(expansion_json()),
    ]);
    pipeline.generate(&request()).await.unwrap();

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    let decision_prompt = &requests[0][1].content;
    assert!(decision_prompt.contains("dinner for tuesday (2026-10-20)"));
    assert!(decision_prompt.contains("High-activity day"));
    assert!(decision_prompt.contains("halal"));
    assert!(decision_prompt.contains("not even traces): peanut"));
    assert!(decision_prompt.contains("avoid entirely: mushroom"));

    let expansion_prompt = &requests[1][1].content;
    assert!(expansion_prompt.contains("- main: Chicken shish"));
    assert!(expansion_prompt.contains("- extra (soup): Lentil soup"));
}

#[tokio::test]
async fn test_bundle_has_three_ordered_recipes() {
    let (_, pipeline) = pipeline_with(vec![
        ScriptedReply::text(decision_json("turkish", 40, "Chicken shish")),
        ScriptedReply::text(expansion_json()),
    ]);
    let generated = pipeline.generate(&request()).await.unwrap();
    let bundle = generated.bundle;

    assert_eq!(bundle.decision().extra_type(), ExtraType::Soup);
    assert_eq!(bundle.recipes().len(), 3);
    for (recipe, slot) in bundle.recipes().iter().zip(CourseSlot::ALL) {
        assert_eq!(recipe.slot, slot);
        assert!(recipe.ingredients.len() >= 2);
        assert!(recipe.instructions.len() >= 3);
    }
    assert_eq!(generated.usage.prompt_tokens, 200);
}

#[tokio::test]
async fn test_over_ceiling_decision_never_reaches_expansion() {
    let (provider, pipeline) =
        pipeline_with(vec![ScriptedReply::text(decision_json("turkish", 50, "Kebab"))]);
    let err = pipeline.generate(&request()).await.unwrap_err();
    assert!(matches!(err, ApiError::SchemaViolation { .. }));
    assert!(err.to_string().contains("exceeds ceiling of 45"));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_caller_ceiling_overrides_default() {
    let request = GenerationRequest::builder(tuesday(), MealType::Dinner, &snapshot())
        .time_ceiling(Some(30))
        .build()
        .unwrap();
    let (_, pipeline) =
        pipeline_with(vec![ScriptedReply::text(decision_json("turkish", 40, "Kebab"))]);
    let err = pipeline.generate(&request).await.unwrap_err();
    assert!(err.to_string().contains("exceeds ceiling of 30"));
}

#[tokio::test]
async fn test_allergen_in_dish_is_schema_violation() {
    let (_, pipeline) = pipeline_with(vec![ScriptedReply::text(decision_json(
        "thai",
        30,
        "Peanut noodles",
    ))]);
    let err = pipeline.generate(&request()).await.unwrap_err();
    assert!(err.to_string().contains("forbidden ingredient 'peanut'"));
}

#[tokio::test]
async fn test_avoided_ingredient_in_recipe_is_schema_violation() {
    let expansion = format!(
        "```json\n{{\"recipes\": [{}, {}, {}]}}\n```",
        recipe_json("main", &[("Chicken", 400.0, "g"), ("Button mushrooms", 100.0, "g")]),
        recipe_json("side", &[("Potato", 500.0, "g"), ("Salt", 1.0, "tsp")]),
        recipe_json("extra", &[("Lentils", 150.0, "g"), ("Onion", 1.0, "piece")]),
    );
    let (_, pipeline) = pipeline_with(vec![
        ScriptedReply::text(decision_json("turkish", 40, "Chicken shish")),
        ScriptedReply::text(expansion),
    ]);
    let err = pipeline.generate(&request()).await.unwrap_err();
    assert!(matches!(err, ApiError::SchemaViolation { stage: "recipe_expansion", .. }));
}

#[tokio::test]
async fn test_missing_course_recipe_is_schema_violation() {
    let expansion = format!(
        "```json\n{{\"recipes\": [{}, {}]}}\n```",
        recipe_json("main", &[("Chicken", 400.0, "g"), ("Salt", 1.0, "tsp")]),
        recipe_json("side", &[("Potato", 500.0, "g"), ("Salt", 1.0, "tsp")]),
    );
    let (_, pipeline) = pipeline_with(vec![
        ScriptedReply::text(decision_json("turkish", 40, "Chicken shish")),
        ScriptedReply::text(expansion),
    ]);
    let err = pipeline.generate(&request()).await.unwrap_err();
    assert!(err.is_generation_failure());
    assert!(err.to_string().contains("extra"));
}

#[tokio::test]
async fn test_upstream_failure_is_typed() {
    let (_, pipeline) = pipeline_with(vec![ScriptedReply::unavailable("connection refused")]);
    let err = pipeline.generate(&request()).await.unwrap_err();
    assert!(matches!(err, ApiError::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn test_separate_stage_clients() {
    let decider = Arc::new(ScriptedProvider::repeating(
        "decider",
        ScriptedReply::text(decision_json("greek", 35, "Souvlaki")),
    ));
    let expander = Arc::new(ScriptedProvider::repeating(
        "expander",
        ScriptedReply::text(expansion_json()),
    ));
    let pipeline = GenerationPipeline::with_clients(
        decider.clone(),
        expander.clone(),
        PipelineSettings::default(),
    );
    let generated = pipeline.generate(&request()).await.unwrap();
    assert_eq!(generated.model, "decider+expander");
    assert_eq!(decider.calls(), 1);
    assert_eq!(expander.calls(), 1);
}
