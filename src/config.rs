//! Configuration System
//!
//! Layered configuration for providers, generation, orchestration, batch jobs,
//! storage and logging. Sources merge lowest to highest: built-in defaults, the
//! global config file, workspace config files, then `MEALPLAN_*` environment variables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::types::MealType;

pub use crate::provider::{ProviderConfig, ProviderType};

mod loader;
mod merge;
mod sources;

pub use loader::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealPlanConfig {
    /// Model provider configurations, by name
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Generation pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Provider used for menu decisions. Optional when exactly one provider is configured.
    #[serde(default)]
    pub decision_provider: Option<String>,

    /// Provider used for recipe expansion. Defaults to the decision provider.
    #[serde(default)]
    pub expansion_provider: Option<String>,

    #[serde(default = "default_time_ceiling_minutes")]
    pub default_time_ceiling_minutes: u32,

    #[serde(default = "default_decision_temperature")]
    pub decision_temperature: f32,

    #[serde(default = "default_expansion_temperature")]
    pub expansion_temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// USD per 1000 prompt tokens
    #[serde(default)]
    pub prompt_cost_per_1k: f64,

    /// USD per 1000 completion tokens
    #[serde(default)]
    pub completion_cost_per_1k: f64,
}

fn default_time_ceiling_minutes() -> u32 {
    crate::generation::DEFAULT_TIME_CEILING_MINUTES
}

fn default_decision_temperature() -> f32 {
    0.7
}

fn default_expansion_temperature() -> f32 {
    0.4
}

fn default_max_tokens() -> u32 {
    4096
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            decision_provider: None,
            expansion_provider: None,
            default_time_ceiling_minutes: default_time_ceiling_minutes(),
            decision_temperature: default_decision_temperature(),
            expansion_temperature: default_expansion_temperature(),
            max_tokens: default_max_tokens(),
            prompt_cost_per_1k: 0.0,
            completion_cost_per_1k: 0.0,
        }
    }
}

impl GenerationConfig {
    pub fn decision_provider_name(
        &self,
        providers: &HashMap<String, ProviderConfig>,
    ) -> Result<String, ApiError> {
        if let Some(name) = &self.decision_provider {
            return Ok(name.clone());
        }
        let mut names: Vec<&String> = providers.keys().collect();
        match names.len() {
            1 => Ok(names[0].clone()),
            0 => Err(ApiError::ConfigError(
                "No providers configured; add a [providers.<name>] section".to_string(),
            )),
            _ => {
                names.sort();
                Err(ApiError::ConfigError(format!(
                    "Several providers configured ({}); set generation.decision_provider",
                    names
                        .iter()
                        .map(|n| n.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )))
            }
        }
    }

    pub fn expansion_provider_name(
        &self,
        providers: &HashMap<String, ProviderConfig>,
    ) -> Result<String, ApiError> {
        match &self.expansion_provider {
            Some(name) => Ok(name.clone()),
            None => self.decision_provider_name(providers),
        }
    }
}

/// Multi-meal orchestrator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default = "default_first_ready_timeout_secs")]
    pub first_ready_timeout_secs: u64,
}

fn default_first_ready_timeout_secs() -> u64 {
    20
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            first_ready_timeout_secs: default_first_ready_timeout_secs(),
        }
    }
}

impl OrchestratorConfig {
    pub fn first_ready_timeout(&self) -> Duration {
        Duration::from_secs(self.first_ready_timeout_secs)
    }
}

/// Week batch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_meal_types")]
    pub default_meal_types: Vec<MealType>,
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_meal_types() -> Vec<MealType> {
    vec![MealType::Lunch, MealType::Dinner]
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            default_meal_types: default_meal_types(),
        }
    }
}

impl BatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Storage locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// sled database directory for the durable tier
    #[serde(default = "default_durable_path")]
    pub durable_path: PathBuf,

    /// Directory of the local ephemeral tier
    #[serde(default = "default_local_cache_dir")]
    pub local_cache_dir: PathBuf,

    /// Entries older than this are ignored by the local tier
    #[serde(default = "default_local_ttl_secs")]
    pub local_ttl_secs: u64,
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "mealplan")
}

pub(crate) fn default_durable_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("durable"))
        .unwrap_or_else(|| PathBuf::from(".mealplan/durable"))
}

pub(crate) fn default_local_cache_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.cache_dir().join("local"))
        .unwrap_or_else(|| PathBuf::from(".mealplan/local"))
}

fn default_local_ttl_secs() -> u64 {
    3 * 24 * 60 * 60
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            durable_path: default_durable_path(),
            local_cache_dir: default_local_cache_dir(),
            local_ttl_secs: default_local_ttl_secs(),
        }
    }
}

impl StorageConfig {
    pub fn local_ttl(&self) -> Duration {
        Duration::from_secs(self.local_ttl_secs)
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Provider(String, String),
    Section(&'static str, String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(name, msg) => write!(f, "Provider '{}': {}", name, msg),
            ValidationError::Section(section, msg) => write!(f, "[{}] {}", section, msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl MealPlanConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (name, provider) in &self.providers {
            if let Err(e) = provider.validate() {
                errors.push(ValidationError::Provider(name.clone(), e));
            }
        }

        let referenced = [
            ("decision_provider", &self.generation.decision_provider),
            ("expansion_provider", &self.generation.expansion_provider),
        ];
        for (field, name) in referenced {
            if let Some(name) = name {
                if !self.providers.contains_key(name) {
                    errors.push(ValidationError::Section(
                        "generation",
                        format!("{} refers to unknown provider '{}'", field, name),
                    ));
                }
            }
        }
        if self.generation.default_time_ceiling_minutes == 0 {
            errors.push(ValidationError::Section(
                "generation",
                "default_time_ceiling_minutes must be at least 1".to_string(),
            ));
        }
        if self.generation.max_tokens == 0 {
            errors.push(ValidationError::Section(
                "generation",
                "max_tokens must be at least 1".to_string(),
            ));
        }
        if self.generation.prompt_cost_per_1k < 0.0 || self.generation.completion_cost_per_1k < 0.0 {
            errors.push(ValidationError::Section(
                "generation",
                "token costs cannot be negative".to_string(),
            ));
        }

        if self.orchestrator.first_ready_timeout_secs == 0 {
            errors.push(ValidationError::Section(
                "orchestrator",
                "first_ready_timeout_secs must be at least 1".to_string(),
            ));
        }

        if self.batch.poll_interval_secs == 0 {
            errors.push(ValidationError::Section(
                "batch",
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.batch.default_meal_types.is_empty() {
            errors.push(ValidationError::Section(
                "batch",
                "default_meal_types cannot be empty".to_string(),
            ));
        }

        if self.storage.durable_path.as_os_str().is_empty() {
            errors.push(ValidationError::Section(
                "storage",
                "durable_path cannot be empty".to_string(),
            ));
        }
        if self.storage.local_cache_dir.as_os_str().is_empty() {
            errors.push(ValidationError::Section(
                "storage",
                "local_cache_dir cannot be empty".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// `validate`, folded into a single `ConfigError`.
    pub fn validated(self) -> Result<Self, ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(self)
    }
}
