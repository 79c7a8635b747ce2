//! Shopping list aggregation over a completed week.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

use super::tracker::StatusTracker;
use crate::error::ApiError;
use crate::preferences::{normalize_list, normalize_text};
use crate::store::{load_bundle, BundleKey};
use crate::types::{week_dates, MealType, UserId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingItem {
    /// Canonical (lowercase, trimmed) ingredient name
    pub name: String,
    pub unit: String,
    pub amount: f64,
    pub in_pantry: bool,
    /// Titles of the recipes that use it
    pub used_in: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingList {
    pub week_start: NaiveDate,
    /// Sorted by name, then unit
    pub items: Vec<ShoppingItem>,
    /// Requested meals with no complete durable bundle
    pub missing: Vec<(NaiveDate, MealType)>,
}

impl ShoppingList {
    /// Items not already in the pantry
    pub fn to_buy(&self) -> impl Iterator<Item = &ShoppingItem> {
        self.items.iter().filter(|item| !item.in_pantry)
    }
}

/// Merge the week's ingredients by canonical name and unit.
///
/// Refuses to read unless the week's batch status is `completed`.
pub fn build_shopping_list(
    tracker: &StatusTracker,
    user_id: &UserId,
    week: NaiveDate,
    meal_types: &[MealType],
    pantry: &[String],
) -> Result<ShoppingList, ApiError> {
    let status = tracker.ensure_readable(user_id, week)?;
    let pantry = normalize_list(pantry);

    let mut merged: BTreeMap<(String, String), (f64, BTreeSet<String>)> = BTreeMap::new();
    let mut missing = Vec::new();

    for date in week_dates(status.week_start) {
        for meal in meal_types {
            let key = BundleKey::new(user_id.clone(), date, *meal);
            let Some(record) = load_bundle(tracker.store().as_ref(), &key)? else {
                warn!(key = %key, "No complete bundle for a completed week");
                missing.push((date, *meal));
                continue;
            };
            for recipe in record.bundle.recipes() {
                for ingredient in &recipe.ingredients {
                    let entry = merged
                        .entry((normalize_text(&ingredient.name), normalize_text(&ingredient.unit)))
                        .or_insert_with(|| (0.0, BTreeSet::new()));
                    entry.0 += ingredient.amount;
                    entry.1.insert(recipe.title.clone());
                }
            }
        }
    }

    let items: Vec<ShoppingItem> = merged
        .into_iter()
        .map(|((name, unit), (amount, used_in))| ShoppingItem {
            in_pantry: pantry.contains(&name),
            name,
            unit,
            amount,
            used_in: used_in.into_iter().collect(),
        })
        .collect();

    info!(
        user = %user_id,
        week = %status.week_start,
        items = items.len(),
        missing = missing.len(),
        "Shopping list built"
    );
    Ok(ShoppingList {
        week_start: status.week_start,
        items,
        missing,
    })
}
