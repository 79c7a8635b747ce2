//! CLI presentation: tables and text for command results. No domain logic.

use chrono::NaiveDate;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;

use crate::batch::{GenerationStatus, ShoppingList, StatusState};
use crate::error::ApiError;
use crate::menu::CourseSlot;
use crate::orchestrator::{DayPlanOutcome, FirstReady};
use crate::preferences::{CanonicalPreferences, PreferenceHash};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Result<Self, ApiError> {
        match value {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(ApiError::InvalidRequest(format!(
                "Unknown format '{}'; use text or json",
                other
            ))),
        }
    }
}

pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::InvalidRequest(format!("Failed to serialize output: {}", e)))
}

fn list_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

pub fn format_canonical_text(canonical: &CanonicalPreferences, hash: &PreferenceHash) -> String {
    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL)
        .set_header(vec!["Field", "Value"]);
    table.add_row(vec![
        "dietary_restrictions".to_string(),
        list_or_dash(&canonical.dietary_restrictions),
    ]);
    table.add_row(vec!["allergies".to_string(), list_or_dash(&canonical.allergies)]);
    table.add_row(vec![
        "cuisine_preferences".to_string(),
        list_or_dash(&canonical.cuisine_preferences),
    ]);
    table.add_row(vec![
        "time_preference".to_string(),
        canonical.time_preference.clone(),
    ]);
    table.add_row(vec!["skill_level".to_string(), canonical.skill_level.clone()]);
    table.add_row(vec!["equipment".to_string(), list_or_dash(&canonical.equipment)]);
    table.add_row(vec![
        "household_size".to_string(),
        canonical.household_size.to_string(),
    ]);
    for (day, entry) in &canonical.routine {
        let mut flags = Vec::new();
        if entry.portable_meal_needed {
            flags.push("portable");
        }
        if entry.light_meal_preferred {
            flags.push("light");
        }
        if entry.batch_cook_friendly {
            flags.push("batch-cook");
        }
        let value = if flags.is_empty() {
            entry.context.clone()
        } else {
            format!("{} ({})", entry.context, flags.join(", "))
        };
        table.add_row(vec![format!("routine.{}", day), value]);
    }

    format!(
        "{}\n{}\n\nhash: {}",
        "Canonical preferences".bold().underline(),
        table,
        hash.to_hex()
    )
}

pub fn format_canonical_json(
    canonical: &CanonicalPreferences,
    hash: &PreferenceHash,
) -> Result<String, ApiError> {
    to_pretty_json(&json!({
        "hash": hash.to_hex(),
        "canonical": canonical.to_json(),
    }))
}

pub fn format_first_ready(first: &FirstReady) -> String {
    match first {
        FirstReady::Finished {
            meal_type,
            succeeded: true,
        } => format!("{} {} is ready", "✓".green(), meal_type),
        FirstReady::Finished {
            meal_type,
            succeeded: false,
        } => format!("{} {} failed; waiting for the rest", "✗".red(), meal_type),
        FirstReady::TimedOut => format!(
            "{} no meal ready yet; still generating in the background",
            "…".yellow()
        ),
    }
}

pub fn format_day_plan(date: NaiveDate, outcome: &DayPlanOutcome) -> String {
    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL)
        .set_header(vec!["Meal", "Source", "Cuisine", "Main", "Side", "Extra", "Time"]);

    for (meal, resolution) in &outcome.ready {
        let decision = resolution.bundle.decision();
        let source = if resolution.preference_hash_matches {
            resolution.source.to_string()
        } else {
            format!("{} (older preferences)", resolution.source)
        };
        table.add_row(vec![
            meal.to_string(),
            source,
            decision.cuisine.clone(),
            decision.dish(CourseSlot::Main).to_string(),
            decision.dish(CourseSlot::Side).to_string(),
            format!(
                "{} ({})",
                decision.dish(CourseSlot::Extra),
                decision.extra_type()
            ),
            format!("{} min", decision.total_time_minutes),
        ]);
    }
    for (meal, failure) in &outcome.failures {
        table.add_row(vec![
            meal.to_string(),
            "failed".to_string(),
            failure.kind.to_string(),
            failure.message.clone(),
            String::new(),
            String::new(),
            String::new(),
        ]);
    }
    for meal in &outcome.pending {
        table.add_row(vec![
            meal.to_string(),
            "loading".to_string(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
        ]);
    }

    format!(
        "{}\n{}",
        format!("Plan for {} ({})", date, date.format("%A")).bold().underline(),
        table
    )
}

fn colored_state(state: StatusState) -> String {
    match state {
        StatusState::Pending => state.as_str().dimmed().to_string(),
        StatusState::InProgress => state.as_str().yellow().to_string(),
        StatusState::Completed => state.as_str().green().to_string(),
        StatusState::Failed => state.as_str().red().to_string(),
    }
}

/// One line per observed status change
pub fn format_status_line(status: &GenerationStatus) -> String {
    format!(
        "[{}] {} {}/{} days",
        status.week_start,
        colored_state(status.state),
        status.completed_days,
        status.total_days
    )
}

pub fn format_status_text(status: &GenerationStatus) -> String {
    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL)
        .set_header(vec!["Field", "Value"]);
    table.add_row(vec!["user".to_string(), status.user_id.to_string()]);
    table.add_row(vec!["week".to_string(), status.week_start.to_string()]);
    table.add_row(vec!["state".to_string(), colored_state(status.state)]);
    table.add_row(vec![
        "progress".to_string(),
        format!(
            "{}/{} days ({:.0}%)",
            status.completed_days,
            status.total_days,
            status.progress() * 100.0
        ),
    ]);
    if let Some(error) = &status.error {
        table.add_row(vec!["error".to_string(), error.clone()]);
    }
    format!("{}\n{}", "Week batch".bold().underline(), table)
}

pub fn format_shopping_list_text(list: &ShoppingList) -> String {
    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL)
        .set_header(vec!["Ingredient", "Amount", "Unit", "Pantry", "Used in"]);
    for item in &list.items {
        table.add_row(vec![
            item.name.clone(),
            format!("{:.2}", item.amount),
            item.unit.clone(),
            if item.in_pantry { "yes" } else { "" }.to_string(),
            item.used_in.join(", "),
        ]);
    }

    let mut out = format!(
        "{}\n{}\n{} to buy, {} in pantry",
        format!("Shopping list, week of {}", list.week_start)
            .bold()
            .underline(),
        table,
        list.to_buy().count(),
        list.items.len() - list.to_buy().count()
    );
    if !list.missing.is_empty() {
        let missing: Vec<String> = list
            .missing
            .iter()
            .map(|(date, meal)| format!("{} {}", date, meal))
            .collect();
        out.push_str(&format!(
            "\n{} no plan for: {}",
            "!".yellow(),
            missing.join(", ")
        ));
    }
    out
}
