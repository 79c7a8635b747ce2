//! Raw, user-edited preference data.
//!
//! Every field is optional so partially filled documents (UI drafts, hand-written
//! TOML for the CLI) deserialize; defaults are applied during canonicalization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::ApiError;

/// Preferences as the user last saved them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceSnapshot {
    pub dietary_restrictions: Vec<String>,
    pub allergies: Vec<String>,
    pub cuisine_preferences: Vec<String>,
    pub time_preference: Option<String>,
    pub skill_level: Option<String>,
    pub equipment: Vec<String>,
    pub household_size: Option<u32>,
    /// Keyed by day name (`monday`, `Tue`, ...). Missing days take the default weekly pattern.
    pub routine: BTreeMap<String, RoutineDay>,
}

/// One day of the weekly routine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutineDay {
    pub context: Option<String>,
    pub portable_meal_needed: bool,
    pub light_meal_preferred: bool,
    pub batch_cook_friendly: bool,
}

impl PreferenceSnapshot {
    /// Load a snapshot from a `.json` or `.toml` file.
    pub fn from_path(path: &Path) -> Result<Self, ApiError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ApiError::InvalidRequest(format!(
                "Failed to read preferences {}: {}",
                path.display(),
                e
            ))
        })?;
        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);
        if is_toml {
            toml::from_str(&raw).map_err(|e| {
                ApiError::InvalidRequest(format!("Invalid preferences TOML: {}", e))
            })
        } else {
            serde_json::from_str(&raw).map_err(|e| {
                ApiError::InvalidRequest(format!("Invalid preferences JSON: {}", e))
            })
        }
    }
}

/// Shape of a day, which drives dish weighting in menu decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutineContext {
    Commute,
    HighActivity,
    LowConstraint,
    Home,
    Office,
}

impl RoutineContext {
    pub fn as_str(self) -> &'static str {
        match self {
            RoutineContext::Commute => "commute",
            RoutineContext::HighActivity => "high-activity",
            RoutineContext::LowConstraint => "low-constraint",
            RoutineContext::Home => "home",
            RoutineContext::Office => "office",
        }
    }
}

impl fmt::Display for RoutineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoutineContext {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "commute" => Ok(RoutineContext::Commute),
            "high-activity" => Ok(RoutineContext::HighActivity),
            "low-constraint" => Ok(RoutineContext::LowConstraint),
            "home" => Ok(RoutineContext::Home),
            "office" => Ok(RoutineContext::Office),
            other => Err(ApiError::InvalidRequest(format!(
                "Unknown routine context '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
        }
    }
}

impl FromStr for SkillLevel {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(SkillLevel::Beginner),
            "intermediate" => Ok(SkillLevel::Intermediate),
            "advanced" => Ok(SkillLevel::Advanced),
            other => Err(ApiError::InvalidRequest(format!(
                "Unknown skill level '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePreference {
    Quick,
    #[default]
    Moderate,
    Relaxed,
}

impl TimePreference {
    pub fn as_str(self) -> &'static str {
        match self {
            TimePreference::Quick => "quick",
            TimePreference::Moderate => "moderate",
            TimePreference::Relaxed => "relaxed",
        }
    }

    /// Preferred upper bound on total cooking time.
    pub fn minutes(self) -> u32 {
        match self {
            TimePreference::Quick => 30,
            TimePreference::Moderate => 45,
            TimePreference::Relaxed => 60,
        }
    }
}

impl FromStr for TimePreference {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quick" => Ok(TimePreference::Quick),
            "moderate" => Ok(TimePreference::Moderate),
            "relaxed" => Ok(TimePreference::Relaxed),
            other => Err(ApiError::InvalidRequest(format!(
                "Unknown time preference '{}'",
                other
            ))),
        }
    }
}
