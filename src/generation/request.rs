//! GenerationRequest: the per-call input to the generation pipeline.

use chrono::NaiveDate;

use crate::error::ApiError;
use crate::menu::HardConstraints;
use crate::preferences::{
    hash_canonical, normalize_list, CanonicalPreferences, PreferenceHash, PreferenceSnapshot,
    RoutineProfile, SkillLevel, TimePreference,
};
use crate::types::{DayOfWeek, MealType};

pub const DEFAULT_TIME_CEILING_MINUTES: u32 = 45;

/// Immutable, never persisted. Built fresh for every resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub date: NaiveDate,
    pub day_of_week: DayOfWeek,
    pub meal_type: MealType,
    pub routine: RoutineProfile,
    pub dietary_restrictions: Vec<String>,
    pub allergies: Vec<String>,
    pub cuisine_preferences: Vec<String>,
    pub time_preference: TimePreference,
    pub skill_level: SkillLevel,
    pub equipment: Vec<String>,
    pub servings: u32,
    pub pantry: Vec<String>,
    pub avoid: Vec<String>,
    pub time_ceiling_minutes: u32,
    pub preference_hash: PreferenceHash,
}

impl GenerationRequest {
    pub fn builder(
        date: NaiveDate,
        meal_type: MealType,
        snapshot: &PreferenceSnapshot,
    ) -> GenerationRequestBuilder {
        GenerationRequestBuilder {
            date,
            meal_type,
            canonical: CanonicalPreferences::from_snapshot(snapshot),
            pantry: Vec::new(),
            avoid: Vec::new(),
            time_ceiling: None,
            default_time_ceiling: DEFAULT_TIME_CEILING_MINUTES,
        }
    }

    /// Allergens plus avoid-list entries, normalized and deduplicated.
    pub fn forbidden_ingredients(&self) -> Vec<String> {
        let mut combined = self.allergies.clone();
        combined.extend(self.avoid.iter().cloned());
        normalize_list(&combined)
    }

    pub fn hard_constraints(&self) -> HardConstraints {
        HardConstraints {
            time_ceiling_minutes: self.time_ceiling_minutes,
            forbidden_ingredients: self.forbidden_ingredients(),
            available_equipment: self.equipment.clone(),
        }
    }

    /// `date/meal` label for logs and errors.
    pub fn label(&self) -> String {
        format!("{}/{}", self.date, self.meal_type)
    }
}

pub struct GenerationRequestBuilder {
    date: NaiveDate,
    meal_type: MealType,
    canonical: CanonicalPreferences,
    pantry: Vec<String>,
    avoid: Vec<String>,
    time_ceiling: Option<u32>,
    default_time_ceiling: u32,
}

impl GenerationRequestBuilder {
    pub fn pantry(mut self, items: &[String]) -> Self {
        self.pantry = normalize_list(items);
        self
    }

    pub fn avoid(mut self, items: &[String]) -> Self {
        self.avoid = normalize_list(items);
        self
    }

    /// Caller-supplied ceiling; `None` keeps the default.
    pub fn time_ceiling(mut self, minutes: Option<u32>) -> Self {
        self.time_ceiling = minutes;
        self
    }

    /// Ceiling used when the caller supplies none.
    pub fn default_time_ceiling(mut self, minutes: u32) -> Self {
        self.default_time_ceiling = minutes;
        self
    }

    pub fn build(self) -> Result<GenerationRequest, ApiError> {
        let time_ceiling_minutes = self.time_ceiling.unwrap_or(self.default_time_ceiling);
        if time_ceiling_minutes == 0 {
            return Err(ApiError::InvalidRequest(
                "Time ceiling must be at least one minute".to_string(),
            ));
        }

        let day_of_week = DayOfWeek::of(self.date);
        let preference_hash = hash_canonical(&self.canonical);
        let canonical = self.canonical;

        Ok(GenerationRequest {
            date: self.date,
            day_of_week,
            meal_type: self.meal_type,
            routine: canonical.routine_for(day_of_week),
            time_preference: canonical.time(),
            skill_level: canonical.skill(),
            servings: canonical.household_size,
            dietary_restrictions: canonical.dietary_restrictions,
            allergies: canonical.allergies,
            cuisine_preferences: canonical.cuisine_preferences,
            equipment: canonical.equipment,
            pantry: self.pantry,
            avoid: self.avoid,
            time_ceiling_minutes,
            preference_hash,
        })
    }
}
