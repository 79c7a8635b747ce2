//! Provider configuration profiles.

use serde::{Deserialize, Serialize};

use super::{CompletionOptions, ModelProvider};
use crate::error::ApiError;

/// Provider type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAI,
    Anthropic,
    Ollama,
    Local,
}

impl ProviderType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderType::OpenAI => "openai",
            ProviderType::Anthropic => "anthropic",
            ProviderType::Ollama => "ollama",
            ProviderType::Local => "local",
        }
    }

    /// Environment variable consulted when no `api_key` is configured.
    pub fn api_key_env_var(self) -> Option<&'static str> {
        match self {
            ProviderType::OpenAI => Some("OPENAI_API_KEY"),
            ProviderType::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderType::Ollama | ProviderType::Local => None,
        }
    }
}

/// One entry of the `providers` config table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub provider_name: Option<String>,
    pub provider_type: ProviderType,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub default_options: CompletionOptions,
}

impl ProviderConfig {
    /// Validate provider configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }

        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!(
                    "Endpoint must start with http:// or https://: {}",
                    endpoint
                ));
            }
        }

        if self.provider_type == ProviderType::Local && self.endpoint.is_none() {
            return Err("Local providers require an endpoint".to_string());
        }

        if let Some(temperature) = self.default_options.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!(
                    "Temperature must be between 0.0 and 2.0, got {}",
                    temperature
                ));
            }
        }

        Ok(())
    }

    fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| {
                self.provider_type
                    .api_key_env_var()
                    .and_then(|var| std::env::var(var).ok())
                    .filter(|key| !key.is_empty())
            })
    }

    /// Resolve into connection settings, reading API keys from the environment if needed.
    pub fn to_model_provider(&self) -> Result<ModelProvider, ApiError> {
        self.validate().map_err(ApiError::ConfigError)?;
        let missing_key = || {
            ApiError::ConfigError(format!(
                "No API key for {} provider (set api_key or {})",
                self.provider_type.as_str(),
                self.provider_type.api_key_env_var().unwrap_or("an API key")
            ))
        };

        match self.provider_type {
            ProviderType::OpenAI => Ok(ModelProvider::OpenAI {
                model: self.model.clone(),
                api_key: self.resolve_api_key().ok_or_else(missing_key)?,
                base_url: self.endpoint.clone(),
            }),
            ProviderType::Anthropic => Ok(ModelProvider::Anthropic {
                model: self.model.clone(),
                api_key: self.resolve_api_key().ok_or_else(missing_key)?,
            }),
            ProviderType::Ollama => Ok(ModelProvider::Ollama {
                model: self.model.clone(),
                base_url: self.endpoint.clone(),
            }),
            ProviderType::Local => Ok(ModelProvider::LocalCustom {
                model: self.model.clone(),
                endpoint: self.endpoint.clone().ok_or_else(|| {
                    ApiError::ConfigError("Local providers require an endpoint".to_string())
                })?,
                api_key: self.resolve_api_key(),
            }),
        }
    }
}
