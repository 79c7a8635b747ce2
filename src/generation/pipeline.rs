//! Two-stage generation: menu decision, then recipe expansion.
//!
//! Each stage is one provider call followed by extraction and validation. Nothing
//! is retried here; the first failure is returned as a typed [`ApiError`] so the
//! resolver can choose a fallback.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::extract::{extract_matching, extract_value};
use super::prompts::{decision_messages, expansion_messages};
use super::request::GenerationRequest;
use crate::config::{GenerationConfig, MealPlanConfig};
use crate::error::ApiError;
use crate::menu::{MenuBundle, MenuDecision, MenuRecipe, STAGE_DECISION, STAGE_EXPANSION};
use crate::provider::{CompletionOptions, ModelProviderClient, ProviderRegistry, TokenUsage};

/// A validated bundle plus generation bookkeeping
#[derive(Debug, Clone)]
pub struct GeneratedBundle {
    pub bundle: MenuBundle,
    pub model: String,
    pub usage: TokenUsage,
    pub cost_usd: f64,
}

/// Anything that can turn a request into a complete bundle.
#[async_trait]
pub trait MenuGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedBundle, ApiError>;
}

/// Output of a single stage
#[derive(Debug, Clone)]
pub struct StageOutput<T> {
    pub value: T,
    pub model: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub decision_options: CompletionOptions,
    pub expansion_options: CompletionOptions,
    /// USD per 1000 prompt tokens
    pub prompt_cost_per_1k: f64,
    /// USD per 1000 completion tokens
    pub completion_cost_per_1k: f64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&GenerationConfig::default())
    }
}

impl PipelineSettings {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            decision_options: CompletionOptions {
                temperature: Some(config.decision_temperature),
                max_tokens: Some(config.max_tokens),
                top_p: None,
                stop: None,
            },
            expansion_options: CompletionOptions {
                temperature: Some(config.expansion_temperature),
                max_tokens: Some(config.max_tokens),
                top_p: None,
                stop: None,
            },
            prompt_cost_per_1k: config.prompt_cost_per_1k,
            completion_cost_per_1k: config.completion_cost_per_1k,
        }
    }

    pub fn cost_usd(&self, usage: &TokenUsage) -> f64 {
        (usage.prompt_tokens as f64 / 1000.0) * self.prompt_cost_per_1k
            + (usage.completion_tokens as f64 / 1000.0) * self.completion_cost_per_1k
    }
}

#[derive(Deserialize)]
struct ExpansionPayload {
    recipes: Vec<MenuRecipe>,
}

pub struct GenerationPipeline {
    decision_client: Arc<dyn ModelProviderClient>,
    expansion_client: Arc<dyn ModelProviderClient>,
    settings: PipelineSettings,
}

impl GenerationPipeline {
    /// One client for both stages.
    pub fn new(client: Arc<dyn ModelProviderClient>, settings: PipelineSettings) -> Self {
        Self::with_clients(client.clone(), client, settings)
    }

    pub fn with_clients(
        decision_client: Arc<dyn ModelProviderClient>,
        expansion_client: Arc<dyn ModelProviderClient>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            decision_client,
            expansion_client,
            settings,
        }
    }

    /// Build clients for the configured decision/expansion providers.
    pub fn from_config(config: &MealPlanConfig) -> Result<Self, ApiError> {
        let registry = ProviderRegistry::from_configs(&config.providers);
        let decision_name = config.generation.decision_provider_name(&config.providers)?;
        let expansion_name = config.generation.expansion_provider_name(&config.providers)?;

        let mut settings = PipelineSettings::from_config(&config.generation);
        settings.decision_options = settings
            .decision_options
            .or(&registry.default_options(&decision_name));
        settings.expansion_options = settings
            .expansion_options
            .or(&registry.default_options(&expansion_name));

        let decision_client = registry.create_client(&decision_name)?;
        let expansion_client = if expansion_name == decision_name {
            decision_client.clone()
        } else {
            registry.create_client(&expansion_name)?
        };

        Ok(Self::with_clients(decision_client, expansion_client, settings))
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Stage 1
    pub async fn decide_menu(
        &self,
        request: &GenerationRequest,
    ) -> Result<StageOutput<MenuDecision>, ApiError> {
        debug!(
            request = %request.label(),
            provider = self.decision_client.provider_name(),
            "Requesting menu decision"
        );
        let response = self
            .decision_client
            .complete(
                decision_messages(request),
                self.settings.decision_options.clone(),
            )
            .await?;

        let value = extract_value(&response.content, STAGE_DECISION)?;
        let decision: MenuDecision = serde_json::from_value(value)
            .map_err(|e| ApiError::schema(STAGE_DECISION, e.to_string()))?;
        decision.validate(&request.hard_constraints())?;

        Ok(StageOutput {
            value: decision,
            model: response.model,
            usage: response.usage,
        })
    }

    /// Stage 2
    pub async fn expand_recipes(
        &self,
        request: &GenerationRequest,
        decision: MenuDecision,
    ) -> Result<StageOutput<MenuBundle>, ApiError> {
        debug!(
            request = %request.label(),
            provider = self.expansion_client.provider_name(),
            cuisine = %decision.cuisine,
            "Requesting recipe expansion"
        );
        let response = self
            .expansion_client
            .complete(
                expansion_messages(request, &decision),
                self.settings.expansion_options.clone(),
            )
            .await?;

        let payload: ExpansionPayload = extract_matching(&response.content, STAGE_EXPANSION)?;
        let bundle = MenuBundle::assemble(decision, payload.recipes)?;
        let constraints = request.hard_constraints();
        for recipe in bundle.recipes() {
            recipe.validate(&constraints)?;
        }

        Ok(StageOutput {
            value: bundle,
            model: response.model,
            usage: response.usage,
        })
    }
}

#[async_trait]
impl MenuGenerator for GenerationPipeline {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedBundle, ApiError> {
        let started = Instant::now();
        let decision = self.decide_menu(request).await?;
        let expansion = self.expand_recipes(request, decision.value).await?;

        let usage = decision.usage.add(&expansion.usage);
        let model = if decision.model == expansion.model {
            decision.model
        } else {
            format!("{}+{}", decision.model, expansion.model)
        };
        let cost_usd = self.settings.cost_usd(&usage);

        info!(
            request = %request.label(),
            model = %model,
            total_tokens = usage.total_tokens,
            cost_usd,
            duration_ms = started.elapsed().as_millis() as u64,
            "Generated menu bundle"
        );

        Ok(GeneratedBundle {
            bundle: expansion.value,
            model,
            usage,
            cost_usd,
        })
    }
}
