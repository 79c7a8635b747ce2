//! MenuBundle: a decision plus one recipe per course slot.
//!
//! The only constructor is [`MenuBundle::assemble`], which enforces completeness,
//! so an incomplete bundle cannot exist as a value (deserialization goes through the
//! same check).

use serde::{Deserialize, Serialize};

use super::{CourseSlot, MenuDecision, MenuRecipe, STAGE_EXPANSION};
use crate::error::{ApiError, StorageError};
use crate::types::Hash;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BundleParts", into = "BundleParts")]
pub struct MenuBundle {
    decision: MenuDecision,
    /// Indexed by `CourseSlot::index`
    recipes: [MenuRecipe; 3],
}

/// Wire/storage shape of a bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleParts {
    pub decision: MenuDecision,
    pub recipes: Vec<MenuRecipe>,
}

impl MenuBundle {
    /// Pair a decision with its recipes. Fails unless there is exactly one recipe per slot.
    pub fn assemble(decision: MenuDecision, recipes: Vec<MenuRecipe>) -> Result<Self, ApiError> {
        let mut by_slot: [Option<MenuRecipe>; 3] = [None, None, None];
        for recipe in recipes {
            let idx = recipe.slot.index();
            if by_slot[idx].is_some() {
                return Err(ApiError::schema(
                    STAGE_EXPANSION,
                    format!("more than one recipe for the {} slot", recipe.slot),
                ));
            }
            by_slot[idx] = Some(recipe);
        }

        let missing: Vec<&str> = CourseSlot::ALL
            .iter()
            .filter(|slot| by_slot[slot.index()].is_none())
            .map(|slot| slot.as_str())
            .collect();

        match by_slot {
            [Some(main), Some(side), Some(extra)] => Ok(Self {
                decision,
                recipes: [main, side, extra],
            }),
            _ => Err(ApiError::schema(
                STAGE_EXPANSION,
                format!("missing recipes for slots: {}", missing.join(", ")),
            )),
        }
    }

    pub fn decision(&self) -> &MenuDecision {
        &self.decision
    }

    /// Recipes in slot order: main, side, extra.
    pub fn recipes(&self) -> &[MenuRecipe] {
        &self.recipes
    }

    pub fn recipe(&self, slot: CourseSlot) -> &MenuRecipe {
        &self.recipes[slot.index()]
    }

    pub fn into_parts(self) -> (MenuDecision, Vec<MenuRecipe>) {
        (self.decision, self.recipes.into())
    }

    /// BLAKE3 over the bundle's JSON encoding; identical bundles hash identically.
    pub fn content_hash(&self) -> Result<Hash, StorageError> {
        let bytes = serde_json::to_vec(self).map_err(|e| StorageError::Corrupt {
            key: "bundle".to_string(),
            reason: format!("Failed to encode bundle: {}", e),
        })?;
        Ok(*blake3::hash(&bytes).as_bytes())
    }
}

impl TryFrom<BundleParts> for MenuBundle {
    type Error = ApiError;

    fn try_from(parts: BundleParts) -> Result<Self, Self::Error> {
        MenuBundle::assemble(parts.decision, parts.recipes)
    }
}

impl From<MenuBundle> for BundleParts {
    fn from(bundle: MenuBundle) -> Self {
        let (decision, recipes) = bundle.into_parts();
        BundleParts { decision, recipes }
    }
}
