//! Shared fixtures for integration tests
//!
//! Canned provider replies, preference snapshots, in-memory service wiring and a
//! lock that serializes environment variable changes across parallel tests.

use mealplan::batch::StatusTracker;
use mealplan::generation::{GenerationPipeline, MenuGenerator, PipelineSettings};
use mealplan::preferences::PreferenceSnapshot;
use mealplan::provider::{ChatMessage, ScriptedProvider, ScriptedReply};
use mealplan::resolver::TieredResolver;
use mealplan::store::{DurableStore, LocalCache, MemoryDurableStore, MemoryLocalCache};
use std::sync::{Arc, Mutex};
use std::time::Duration;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Run `f` with the given variables set, restoring previous values afterwards.
pub fn with_env<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let previous: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(name, _)| (name.to_string(), std::env::var(name).ok()))
        .collect();
    for (name, value) in vars {
        std::env::set_var(name, value);
    }

    let result = f();

    for (name, value) in previous {
        match value {
            Some(v) => std::env::set_var(&name, v),
            None => std::env::remove_var(&name),
        }
    }
    result
}

pub fn decision_json(cuisine: &str, total_minutes: u32, main: &str) -> String {
    format!(
        r#"```json
{{"cuisine": "{cuisine}", "total_time_minutes": {total_minutes}, "courses": {{
  "main": {{"dish": "{main}"}},
  "side": {{"dish": "Lemon potatoes"}},
  "extra": {{"dish": "Lentil soup", "type": "soup"}}}}}}
```"#
    )
}

pub fn recipe_json(slot: &str, ingredients: &[(&str, f64, &str)]) -> String {
    let ingredients: Vec<String> = ingredients
        .iter()
        .map(|(name, amount, unit)| {
            format!(r#"{{"name": "{name}", "amount": {amount}, "unit": "{unit}", "notes": null}}"#)
        })
        .collect();
    format!(
        r#"{{"slot": "{slot}", "title": "{slot} course", "servings": 2,
        "prep_time_minutes": 10, "cook_time_minutes": 15,
        "ingredients": [{}],
        "instructions": ["Prepare the ingredients", "Cook", "Plate and serve"],
        "equipment_required": [],
        "nutrition": {{
          "per_100g": {{"calories": 120, "protein_g": 8, "carbs_g": 10, "fat_g": 5, "fiber_g": 2}},
          "per_serving": {{"calories": 360, "protein_g": 24, "carbs_g": 30, "fat_g": 15, "fiber_g": 6}},
          "total": {{"calories": 720, "protein_g": 48, "carbs_g": 60, "fat_g": 30, "fiber_g": 12}}}}}}"#,
        ingredients.join(", ")
    )
}

pub fn expansion_json() -> String {
    format!(
        "Here are the recipes:\n```json\n{{\"recipes\": [{}, {}, {}]}}\n```",
        recipe_json("main", &[("Chicken thigh", 400.0, "g"), ("Olive oil", 2.0, "tbsp")]),
        recipe_json("side", &[("Potato", 500.0, "g"), ("olive oil", 1.0, "tbsp")]),
        recipe_json("extra", &[("Red lentils", 150.0, "g"), ("Onion", 1.0, "piece")]),
    )
}

/// True for stage-1 prompts
pub fn is_decision_call(messages: &[ChatMessage]) -> bool {
    messages
        .first()
        .map(|m| m.content.contains("meal planner"))
        .unwrap_or(false)
}

/// Answers every decision call with a valid menu and every expansion with recipes.
pub fn menu_provider() -> Arc<ScriptedProvider> {
    Arc::new(ScriptedProvider::from_fn("scripted-model", |messages, _| {
        if is_decision_call(messages) {
            ScriptedReply::text(decision_json("turkish", 40, "Chicken shish"))
        } else {
            ScriptedReply::text(expansion_json())
        }
    }))
}

/// Like [`menu_provider`], with a per-call delay.
pub fn slow_menu_provider(delay: Duration) -> Arc<ScriptedProvider> {
    Arc::new(ScriptedProvider::from_fn("scripted-model", move |messages, _| {
        let reply = if is_decision_call(messages) {
            ScriptedReply::text(decision_json("turkish", 40, "Chicken shish"))
        } else {
            ScriptedReply::text(expansion_json())
        };
        reply.after(delay)
    }))
}

pub fn pipeline(provider: Arc<ScriptedProvider>) -> Arc<dyn MenuGenerator> {
    Arc::new(GenerationPipeline::new(provider, PipelineSettings::default()))
}

pub fn snapshot() -> PreferenceSnapshot {
    serde_json::from_str(
        r#"{
            "dietary_restrictions": ["Halal"],
            "allergies": ["Peanut"],
            "cuisine_preferences": ["Turkish", "Greek"],
            "time_preference": "moderate",
            "skill_level": "intermediate",
            "household_size": 2,
            "routine": {"tuesday": {"context": "high-activity"}}
        }"#,
    )
    .unwrap()
}

/// In-memory tiers plus a resolver and tracker over them
pub struct Services {
    pub durable: Arc<MemoryDurableStore>,
    pub local: Arc<MemoryLocalCache>,
    pub resolver: Arc<TieredResolver>,
    pub tracker: Arc<StatusTracker>,
}

pub fn services(generator: Arc<dyn MenuGenerator>) -> Services {
    let durable = Arc::new(MemoryDurableStore::new());
    let local = Arc::new(MemoryLocalCache::new());
    let store: Arc<dyn DurableStore> = durable.clone();
    let local_tier: Arc<dyn LocalCache> = local.clone();
    let resolver = Arc::new(TieredResolver::new(store.clone(), local_tier, generator));
    let tracker = Arc::new(StatusTracker::new(store));
    Services {
        durable,
        local,
        resolver,
        tracker,
    }
}
