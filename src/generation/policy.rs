//! Composition policy rendered into menu-decision prompts.
//!
//! Cuisine families carry course-compatibility guidance; routine contexts and
//! sub-flags weight dish selection for the day.

use crate::menu::ExtraType;
use crate::preferences::{normalize_text, RoutineContext, RoutineProfile, SkillLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CuisineFamily {
    Mediterranean,
    European,
    Asian,
    Americas,
    Other,
}

const MEDITERRANEAN: &[&str] = &["turkish", "greek", "lebanese", "levantine", "middle eastern"];
const EUROPEAN: &[&str] = &["italian", "french", "spanish", "german", "british"];
const ASIAN: &[&str] = &["japanese", "chinese", "korean", "thai", "vietnamese", "indian"];
const AMERICAS: &[&str] = &["american", "mexican", "latin american"];

impl CuisineFamily {
    pub const ALL: [CuisineFamily; 5] = [
        CuisineFamily::Mediterranean,
        CuisineFamily::European,
        CuisineFamily::Asian,
        CuisineFamily::Americas,
        CuisineFamily::Other,
    ];

    pub fn of(cuisine: &str) -> Self {
        let cuisine = normalize_text(cuisine);
        let member = |list: &[&str]| list.iter().any(|c| *c == cuisine);
        if member(MEDITERRANEAN) {
            CuisineFamily::Mediterranean
        } else if member(EUROPEAN) {
            CuisineFamily::European
        } else if member(ASIAN) {
            CuisineFamily::Asian
        } else if member(AMERICAS) {
            CuisineFamily::Americas
        } else {
            CuisineFamily::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CuisineFamily::Mediterranean => "mediterranean",
            CuisineFamily::European => "european",
            CuisineFamily::Asian => "asian",
            CuisineFamily::Americas => "americas",
            CuisineFamily::Other => "other",
        }
    }

    pub fn members(self) -> &'static [&'static str] {
        match self {
            CuisineFamily::Mediterranean => MEDITERRANEAN,
            CuisineFamily::European => EUROPEAN,
            CuisineFamily::Asian => ASIAN,
            CuisineFamily::Americas => AMERICAS,
            CuisineFamily::Other => &[],
        }
    }

    /// Extras this family favours, most preferred first.
    pub fn preferred_extras(self) -> &'static [ExtraType] {
        match self {
            CuisineFamily::Mediterranean => &[ExtraType::Soup, ExtraType::Meze, ExtraType::Salad],
            CuisineFamily::European => &[ExtraType::Salad, ExtraType::Soup, ExtraType::Dessert],
            CuisineFamily::Asian => &[ExtraType::Soup, ExtraType::Salad],
            CuisineFamily::Americas => &[ExtraType::Salad, ExtraType::Dessert],
            CuisineFamily::Other => &ExtraType::ALL,
        }
    }

    pub fn side_guidance(self) -> &'static str {
        match self {
            CuisineFamily::Mediterranean => "bread or vegetable sides",
            CuisineFamily::European => "vegetable or starch sides",
            CuisineFamily::Asian => "rice or noodle sides",
            CuisineFamily::Americas => "grain or bean sides",
            CuisineFamily::Other => "any side that suits the main",
        }
    }

    /// One prompt line describing this family's course compatibility.
    pub fn policy_line(self) -> String {
        let extras: Vec<&str> = self.preferred_extras().iter().map(|e| e.as_str()).collect();
        let members = if self.members().is_empty() {
            "other cuisines".to_string()
        } else {
            self.members().join(", ")
        };
        format!(
            "- {} ({}): extra should be one of [{}]; favour {}.",
            self.as_str(),
            members,
            extras.join(", "),
            self.side_guidance()
        )
    }
}

/// Families relevant to a set of preferred cuisines; all families when none are given.
pub fn families_for(cuisines: &[String]) -> Vec<CuisineFamily> {
    if cuisines.is_empty() {
        return CuisineFamily::ALL.to_vec();
    }
    let mut families: Vec<CuisineFamily> = cuisines.iter().map(|c| CuisineFamily::of(c)).collect();
    families.sort();
    families.dedup();
    families
}

/// Day-level weighting lines for the menu-decision prompt.
pub fn routine_guidance(routine: &RoutineProfile) -> Vec<&'static str> {
    let mut lines = vec![match routine.context {
        RoutineContext::Commute => {
            "Commute day: prefer portable dishes that travel well and can be eaten cold or reheated."
        }
        RoutineContext::HighActivity => {
            "High-activity day: bias the main toward higher-protein dishes."
        }
        RoutineContext::LowConstraint => {
            "Low-constraint day: more elaborate structures and techniques are welcome."
        }
        RoutineContext::Home => "Home day: a relaxed, homestyle meal is appropriate.",
        RoutineContext::Office => {
            "Office day: keep dishes straightforward and suitable for a packed or quick meal."
        }
    }];
    if routine.portable_meal_needed {
        lines.push("A portable meal is required: every course must travel well.");
    }
    if routine.light_meal_preferred {
        lines.push("A lighter meal is preferred: moderate portions, avoid heavy sauces.");
    }
    if routine.batch_cook_friendly {
        lines.push("Batch cooking is welcome: dishes that keep well for leftovers are a plus.");
    }
    lines
}

/// Instruction granularity for recipe expansion.
pub fn skill_guidance(skill: SkillLevel) -> &'static str {
    match skill {
        SkillLevel::Beginner => {
            "The cook is a beginner: write small, explicit steps, explain techniques and give visual doneness cues."
        }
        SkillLevel::Intermediate => {
            "The cook is comfortable in the kitchen: use clear steps without explaining basic techniques."
        }
        SkillLevel::Advanced => {
            "The cook is advanced: steps may be concise and may use professional technique names."
        }
    }
}
