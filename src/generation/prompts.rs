//! Prompt construction for both generation stages.

use super::policy::{families_for, routine_guidance, skill_guidance};
use super::request::GenerationRequest;
use crate::menu::recipe::{MIN_INGREDIENTS, MIN_INSTRUCTIONS};
use crate::menu::{CourseSlot, ExtraType, MenuDecision};
use crate::provider::ChatMessage;

const DECISION_SYSTEM_PROMPT: &str = "You are a meal planner. You compose a single meal as \
exactly three courses: one main, one side and one extra. There is never a fourth course. \
Reply with a single JSON object inside a ```json fenced block and nothing else.";

const EXPANSION_SYSTEM_PROMPT: &str = "You are a recipe writer. You expand a fixed three-course \
menu into complete, scalable recipes. Reply with a single JSON object inside a ```json fenced \
block and nothing else.";

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

fn hard_constraint_lines(request: &GenerationRequest) -> Vec<String> {
    vec![
        format!(
            "- Allergies (never include, not even traces): {}",
            list_or_none(&request.allergies)
        ),
        format!(
            "- Dietary restrictions (must be respected by every course): {}",
            list_or_none(&request.dietary_restrictions)
        ),
        format!(
            "- Ingredients to avoid entirely: {}",
            list_or_none(&request.avoid)
        ),
    ]
}

pub fn decision_messages(request: &GenerationRequest) -> Vec<ChatMessage> {
    let extras: Vec<&str> = ExtraType::ALL.iter().map(|e| e.as_str()).collect();
    let policy: Vec<String> = families_for(&request.cuisine_preferences)
        .into_iter()
        .map(|family| family.policy_line())
        .collect();
    let routine: Vec<&str> = routine_guidance(&request.routine);

    let mut prompt = String::new();
    prompt.push_str(&format!(
        "Plan {} for {} ({}).\n\n",
        request.meal_type, request.day_of_week, request.date
    ));

    prompt.push_str("Composition rules:\n");
    prompt.push_str("- Exactly one main, one side and one extra.\n");
    prompt.push_str(&format!(
        "- The extra's type must be one of: {}.\n",
        extras.join(", ")
    ));
    prompt.push_str(&format!(
        "- Total time for the whole meal must not exceed {} minutes.\n",
        request.time_ceiling_minutes
    ));
    prompt.push_str(&format!(
        "- Preferred pace: {} (about {} minutes).\n\n",
        request.time_preference.as_str(),
        request.time_preference.minutes()
    ));

    prompt.push_str("Cuisine course-compatibility policy:\n");
    for line in &policy {
        prompt.push_str(line);
        prompt.push('\n');
    }
    prompt.push_str(&format!(
        "Preferred cuisines: {}.\n\n",
        list_or_none(&request.cuisine_preferences)
    ));

    prompt.push_str("Today's routine:\n");
    for line in &routine {
        prompt.push_str("- ");
        prompt.push_str(line);
        prompt.push('\n');
    }
    prompt.push('\n');

    prompt.push_str("Hard constraints (violating any of these is an error):\n");
    for line in hard_constraint_lines(request) {
        prompt.push_str(&line);
        prompt.push('\n');
    }
    prompt.push('\n');

    prompt.push_str(
        "Respond with exactly this shape and no other keys:\n\
```json\n\
{\n  \"cuisine\": \"<cuisine>\",\n  \"total_time_minutes\": <integer>,\n  \"courses\": {\n    \
\"main\": {\"dish\": \"<name>\"},\n    \"side\": {\"dish\": \"<name>\"},\n    \
\"extra\": {\"dish\": \"<name>\", \"type\": \"<extra type>\"}\n  }\n}\n```\n",
    );

    vec![
        ChatMessage::system(DECISION_SYSTEM_PROMPT),
        ChatMessage::user(prompt),
    ]
}

pub fn expansion_messages(request: &GenerationRequest, decision: &MenuDecision) -> Vec<ChatMessage> {
    let mut prompt = String::new();
    prompt.push_str(&format!(
        "Expand this {} menu ({} minutes total) into recipes for {} servings:\n",
        decision.cuisine, decision.total_time_minutes, request.servings
    ));
    for slot in CourseSlot::ALL {
        match slot {
            CourseSlot::Extra => prompt.push_str(&format!(
                "- {} ({}): {}\n",
                slot,
                decision.extra_type(),
                decision.dish(slot)
            )),
            _ => prompt.push_str(&format!("- {}: {}\n", slot, decision.dish(slot))),
        }
    }
    prompt.push('\n');

    prompt.push_str("Requirements:\n");
    prompt.push_str(&format!(
        "- One recipe per course, with \"slot\" set to main, side or extra.\n\
- Each recipe has at least {} ingredients and at least {} ordered instructions.\n",
        MIN_INGREDIENTS, MIN_INSTRUCTIONS
    ));
    prompt.push_str(&format!("- {}\n", skill_guidance(request.skill_level)));
    if request.equipment.is_empty() {
        prompt.push_str("- Equipment: assume a standard home kitchen.\n");
    } else {
        prompt.push_str(&format!(
            "- Only use this equipment, and list what you use in equipment_required: {}\n",
            request.equipment.join(", ")
        ));
    }
    if !request.pantry.is_empty() {
        prompt.push_str(&format!(
            "- Prefer ingredients already in the pantry: {}\n",
            request.pantry.join(", ")
        ));
    }
    prompt.push_str(
        "- Give nutrition per_100g, per_serving and total, each with calories, protein_g, \
carbs_g, fat_g and fiber_g as non-negative numbers.\n\n",
    );

    prompt.push_str("Hard constraints (violating any of these is an error):\n");
    for line in hard_constraint_lines(request) {
        prompt.push_str(&line);
        prompt.push('\n');
    }
    prompt.push('\n');

    prompt.push_str(
        "Respond with this shape:\n\
```json\n\
{\"recipes\": [{\"slot\": \"main\", \"title\": \"...\", \"servings\": 2, \
\"prep_time_minutes\": 10, \"cook_time_minutes\": 20, \
\"ingredients\": [{\"name\": \"...\", \"amount\": 1.0, \"unit\": \"g\", \"notes\": null}], \
\"instructions\": [\"...\"], \"equipment_required\": [\"...\"], \
\"nutrition\": {\"per_100g\": {\"calories\": 0, \"protein_g\": 0, \"carbs_g\": 0, \"fat_g\": 0, \"fiber_g\": 0}, \
\"per_serving\": {...}, \"total\": {...}}}]}\n```\n",
    );

    vec![
        ChatMessage::system(EXPANSION_SYSTEM_PROMPT),
        ChatMessage::user(prompt),
    ]
}
