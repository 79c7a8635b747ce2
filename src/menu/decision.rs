//! Stage-1 output: which dish fills which course slot.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{find_forbidden, HardConstraints, STAGE_DECISION};
use crate::error::ApiError;

/// The three fixed course slots of every menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseSlot {
    Main,
    Side,
    Extra,
}

impl CourseSlot {
    pub const ALL: [CourseSlot; 3] = [CourseSlot::Main, CourseSlot::Side, CourseSlot::Extra];

    pub fn as_str(self) -> &'static str {
        match self {
            CourseSlot::Main => "main",
            CourseSlot::Side => "side",
            CourseSlot::Extra => "extra",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            CourseSlot::Main => 0,
            CourseSlot::Side => 1,
            CourseSlot::Extra => 2,
        }
    }
}

impl fmt::Display for CourseSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allowed kinds of the `extra` course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtraType {
    Soup,
    Salad,
    Meze,
    Dessert,
    Pastry,
}

impl ExtraType {
    pub const ALL: [ExtraType; 5] = [
        ExtraType::Soup,
        ExtraType::Salad,
        ExtraType::Meze,
        ExtraType::Dessert,
        ExtraType::Pastry,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExtraType::Soup => "soup",
            ExtraType::Salad => "salad",
            ExtraType::Meze => "meze",
            ExtraType::Dessert => "dessert",
            ExtraType::Pastry => "pastry",
        }
    }
}

impl fmt::Display for ExtraType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtraType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        ExtraType::ALL
            .into_iter()
            .find(|extra| extra.as_str() == lowered)
            .ok_or_else(|| ApiError::InvalidRequest(format!("Unknown extra type '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Course {
    pub dish: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtraCourse {
    pub dish: String,
    #[serde(rename = "type")]
    pub extra_type: ExtraType,
}

/// Exactly three courses; a fourth key is rejected at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuCourses {
    pub main: Course,
    pub side: Course,
    pub extra: ExtraCourse,
}

/// Closed-schema menu decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuDecision {
    pub cuisine: String,
    pub total_time_minutes: u32,
    pub courses: MenuCourses,
}

impl MenuDecision {
    pub fn dish(&self, slot: CourseSlot) -> &str {
        match slot {
            CourseSlot::Main => &self.courses.main.dish,
            CourseSlot::Side => &self.courses.side.dish,
            CourseSlot::Extra => &self.courses.extra.dish,
        }
    }

    pub fn extra_type(&self) -> ExtraType {
        self.courses.extra.extra_type
    }

    /// Domain rules that the type system does not already enforce.
    pub fn validate(&self, constraints: &HardConstraints) -> Result<(), ApiError> {
        if self.cuisine.trim().is_empty() {
            return Err(ApiError::schema(STAGE_DECISION, "cuisine must not be empty"));
        }
        if self.total_time_minutes == 0 {
            return Err(ApiError::schema(
                STAGE_DECISION,
                "total_time_minutes must be at least 1",
            ));
        }
        if self.total_time_minutes > constraints.time_ceiling_minutes {
            return Err(ApiError::schema(
                STAGE_DECISION,
                format!(
                    "total_time_minutes {} exceeds ceiling of {}",
                    self.total_time_minutes, constraints.time_ceiling_minutes
                ),
            ));
        }
        for slot in CourseSlot::ALL {
            let dish = self.dish(slot);
            if dish.trim().is_empty() {
                return Err(ApiError::schema(
                    STAGE_DECISION,
                    format!("{} course has an empty dish name", slot),
                ));
            }
            if let Some(term) = find_forbidden(dish, &constraints.forbidden_ingredients) {
                return Err(ApiError::schema(
                    STAGE_DECISION,
                    format!("{} course '{}' contains forbidden ingredient '{}'", slot, dish, term),
                ));
            }
        }
        Ok(())
    }
}
