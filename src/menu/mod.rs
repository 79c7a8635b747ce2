//! Menu data model: decisions, recipes and complete bundles.

pub mod bundle;
pub mod decision;
pub mod recipe;

pub use bundle::{BundleParts, MenuBundle};
pub use decision::{Course, CourseSlot, ExtraCourse, ExtraType, MenuCourses, MenuDecision};
pub use recipe::{Ingredient, Macros, MenuRecipe, Nutrition};

use crate::preferences::normalize_text;

pub const STAGE_DECISION: &str = "menu_decision";
pub const STAGE_EXPANSION: &str = "recipe_expansion";

/// Constraints generated output must never violate.
///
/// Terms and equipment are expected in normalized form (see [`normalize_text`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardConstraints {
    pub time_ceiling_minutes: u32,
    /// Allergens and avoid-list entries
    pub forbidden_ingredients: Vec<String>,
    /// Empty means "no equipment restriction".
    pub available_equipment: Vec<String>,
}

/// First forbidden term contained in `text` (case-insensitive substring match).
pub(crate) fn find_forbidden<'a>(text: &str, forbidden: &'a [String]) -> Option<&'a str> {
    let haystack = normalize_text(text);
    forbidden
        .iter()
        .filter(|term| !term.is_empty())
        .find(|term| haystack.contains(term.as_str()))
        .map(String::as_str)
}
