//! Stage-2 output: one expanded recipe per course slot.

use serde::{Deserialize, Serialize};

use super::{find_forbidden, CourseSlot, HardConstraints, STAGE_EXPANSION};
use crate::error::ApiError;
use crate::preferences::normalize_text;

pub const MIN_INGREDIENTS: usize = 2;
pub const MIN_INSTRUCTIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub amount: f64,
    pub unit: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One macro breakdown
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Macros {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
}

impl Macros {
    fn values(&self) -> [(&'static str, f64); 5] {
        [
            ("calories", self.calories),
            ("protein_g", self.protein_g),
            ("carbs_g", self.carbs_g),
            ("fat_g", self.fat_g),
            ("fiber_g", self.fiber_g),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Nutrition {
    pub per_100g: Macros,
    pub per_serving: Macros,
    pub total: Macros,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuRecipe {
    pub slot: CourseSlot,
    pub title: String,
    pub servings: u32,
    pub prep_time_minutes: u32,
    pub cook_time_minutes: u32,
    pub ingredients: Vec<Ingredient>,
    /// Ordered steps
    pub instructions: Vec<String>,
    #[serde(default)]
    pub equipment_required: Vec<String>,
    pub nutrition: Nutrition,
}

impl MenuRecipe {
    pub fn total_time_minutes(&self) -> u32 {
        self.prep_time_minutes.saturating_add(self.cook_time_minutes)
    }

    pub fn validate(&self, constraints: &HardConstraints) -> Result<(), ApiError> {
        let slot = self.slot;
        if self.title.trim().is_empty() {
            return Err(ApiError::schema(
                STAGE_EXPANSION,
                format!("{} recipe has an empty title", slot),
            ));
        }
        if self.servings == 0 {
            return Err(ApiError::schema(
                STAGE_EXPANSION,
                format!("{} recipe must serve at least one", slot),
            ));
        }
        if self.ingredients.len() < MIN_INGREDIENTS {
            return Err(ApiError::schema(
                STAGE_EXPANSION,
                format!(
                    "{} recipe lists {} ingredients, need at least {}",
                    slot,
                    self.ingredients.len(),
                    MIN_INGREDIENTS
                ),
            ));
        }
        if self.instructions.len() < MIN_INSTRUCTIONS {
            return Err(ApiError::schema(
                STAGE_EXPANSION,
                format!(
                    "{} recipe has {} instructions, need at least {}",
                    slot,
                    self.instructions.len(),
                    MIN_INSTRUCTIONS
                ),
            ));
        }
        if self.instructions.iter().any(|step| step.trim().is_empty()) {
            return Err(ApiError::schema(
                STAGE_EXPANSION,
                format!("{} recipe has an empty instruction", slot),
            ));
        }

        for ingredient in &self.ingredients {
            if ingredient.name.trim().is_empty() {
                return Err(ApiError::schema(
                    STAGE_EXPANSION,
                    format!("{} recipe has an unnamed ingredient", slot),
                ));
            }
            if !ingredient.amount.is_finite() || ingredient.amount < 0.0 {
                return Err(ApiError::schema(
                    STAGE_EXPANSION,
                    format!(
                        "{} ingredient '{}' has invalid amount {}",
                        slot, ingredient.name, ingredient.amount
                    ),
                ));
            }
            if let Some(term) = find_forbidden(&ingredient.name, &constraints.forbidden_ingredients)
            {
                return Err(ApiError::schema(
                    STAGE_EXPANSION,
                    format!(
                        "{} ingredient '{}' matches forbidden '{}'",
                        slot, ingredient.name, term
                    ),
                ));
            }
        }

        let breakdowns = [
            ("per_100g", &self.nutrition.per_100g),
            ("per_serving", &self.nutrition.per_serving),
            ("total", &self.nutrition.total),
        ];
        for (label, macros) in breakdowns {
            for (field, value) in macros.values() {
                if !value.is_finite() || value < 0.0 {
                    return Err(ApiError::schema(
                        STAGE_EXPANSION,
                        format!("{} nutrition {}.{} is {}", slot, label, field, value),
                    ));
                }
            }
        }

        if !constraints.available_equipment.is_empty() {
            for item in &self.equipment_required {
                let needed = normalize_text(item);
                if needed.is_empty() {
                    continue;
                }
                if !constraints.available_equipment.iter().any(|have| *have == needed) {
                    return Err(ApiError::schema(
                        STAGE_EXPANSION,
                        format!("{} recipe requires unavailable equipment '{}'", slot, item),
                    ));
                }
            }
        }

        Ok(())
    }
}
