//! Canonical form of a [`PreferenceSnapshot`].
//!
//! Canonicalization is total: it never fails, and two snapshots that differ only in
//! list order, casing, Unicode composition or surrounding whitespace produce equal
//! canonical values.

use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use super::snapshot::{PreferenceSnapshot, RoutineContext, SkillLevel, TimePreference};
use crate::types::DayOfWeek;

pub const DEFAULT_HOUSEHOLD_SIZE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPreferences {
    pub dietary_restrictions: Vec<String>,
    pub allergies: Vec<String>,
    pub cuisine_preferences: Vec<String>,
    pub time_preference: String,
    pub skill_level: String,
    pub equipment: Vec<String>,
    pub household_size: u32,
    /// Always holds all seven days.
    pub routine: BTreeMap<DayOfWeek, CanonicalRoutineDay>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRoutineDay {
    pub context: String,
    pub portable_meal_needed: bool,
    pub light_meal_preferred: bool,
    pub batch_cook_friendly: bool,
}

/// Typed view of one routine day, used when building generation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutineProfile {
    pub day: DayOfWeek,
    pub context: RoutineContext,
    pub portable_meal_needed: bool,
    pub light_meal_preferred: bool,
    pub batch_cook_friendly: bool,
}

/// NFC, trim, collapse inner whitespace, lowercase.
pub fn normalize_text(value: &str) -> String {
    let composed: String = value.nfc().collect();
    composed
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalize, drop empties, sort, dedup.
pub fn normalize_list(values: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = values
        .iter()
        .map(|v| normalize_text(v))
        .filter(|v| !v.is_empty())
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}

/// Routine context used when a day is missing from the snapshot.
pub fn default_context(day: DayOfWeek) -> RoutineContext {
    match day {
        DayOfWeek::Saturday => RoutineContext::LowConstraint,
        DayOfWeek::Sunday => RoutineContext::Home,
        _ => RoutineContext::Office,
    }
}

/// Known values collapse to their canonical spelling; unknown ones stay as normalized text.
fn normalize_enum_text<T, F>(value: Option<&str>, default: T, as_str: F) -> String
where
    T: FromStr + Copy,
    F: Fn(T) -> &'static str,
{
    match value.map(normalize_text).filter(|v| !v.is_empty()) {
        None => as_str(default).to_string(),
        Some(text) => match T::from_str(&text) {
            Ok(parsed) => as_str(parsed).to_string(),
            Err(_) => text,
        },
    }
}

impl CanonicalPreferences {
    pub fn from_snapshot(snapshot: &PreferenceSnapshot) -> Self {
        let mut routine: BTreeMap<DayOfWeek, CanonicalRoutineDay> = BTreeMap::new();
        for (raw_day, day) in &snapshot.routine {
            let Ok(parsed_day) = DayOfWeek::from_str(raw_day) else {
                debug!(day = %raw_day, "Ignoring routine entry with unknown day name");
                continue;
            };
            let fallback = default_context(parsed_day);
            routine.insert(
                parsed_day,
                CanonicalRoutineDay {
                    context: normalize_enum_text(day.context.as_deref(), fallback, |c| {
                        c.as_str()
                    }),
                    portable_meal_needed: day.portable_meal_needed,
                    light_meal_preferred: day.light_meal_preferred,
                    batch_cook_friendly: day.batch_cook_friendly,
                },
            );
        }
        for day in DayOfWeek::ALL {
            routine.entry(day).or_insert_with(|| CanonicalRoutineDay {
                context: default_context(day).as_str().to_string(),
                portable_meal_needed: false,
                light_meal_preferred: false,
                batch_cook_friendly: false,
            });
        }

        Self {
            dietary_restrictions: normalize_list(&snapshot.dietary_restrictions),
            allergies: normalize_list(&snapshot.allergies),
            cuisine_preferences: normalize_list(&snapshot.cuisine_preferences),
            time_preference: normalize_enum_text(
                snapshot.time_preference.as_deref(),
                TimePreference::default(),
                |t| t.as_str(),
            ),
            skill_level: normalize_enum_text(
                snapshot.skill_level.as_deref(),
                SkillLevel::default(),
                |s| s.as_str(),
            ),
            equipment: normalize_list(&snapshot.equipment),
            household_size: snapshot
                .household_size
                .unwrap_or(DEFAULT_HOUSEHOLD_SIZE)
                .max(1),
            routine,
        }
    }

    /// Canonical JSON. Object keys are emitted in sorted order.
    pub fn to_json(&self) -> Value {
        let routine: serde_json::Map<String, Value> = self
            .routine
            .iter()
            .map(|(day, entry)| {
                (
                    day.as_str().to_string(),
                    json!({
                        "batch_cook_friendly": entry.batch_cook_friendly,
                        "context": entry.context,
                        "light_meal_preferred": entry.light_meal_preferred,
                        "portable_meal_needed": entry.portable_meal_needed,
                    }),
                )
            })
            .collect();

        json!({
            "allergies": self.allergies,
            "cuisine_preferences": self.cuisine_preferences,
            "dietary_restrictions": self.dietary_restrictions,
            "equipment": self.equipment,
            "household_size": self.household_size,
            "routine": routine,
            "skill_level": self.skill_level,
            "time_preference": self.time_preference,
        })
    }

    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }

    pub fn skill(&self) -> SkillLevel {
        SkillLevel::from_str(&self.skill_level).unwrap_or_default()
    }

    pub fn time(&self) -> TimePreference {
        TimePreference::from_str(&self.time_preference).unwrap_or_default()
    }

    pub fn routine_for(&self, day: DayOfWeek) -> RoutineProfile {
        match self.routine.get(&day) {
            Some(entry) => RoutineProfile {
                day,
                context: RoutineContext::from_str(&entry.context)
                    .unwrap_or_else(|_| default_context(day)),
                portable_meal_needed: entry.portable_meal_needed,
                light_meal_preferred: entry.light_meal_preferred,
                batch_cook_friendly: entry.batch_cook_friendly,
            },
            None => RoutineProfile {
                day,
                context: default_context(day),
                portable_meal_needed: false,
                light_meal_preferred: false,
                batch_cook_friendly: false,
            },
        }
    }
}
