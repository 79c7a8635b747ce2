//! Merge rules: defaults, override order, conflict handling.
//!
//! Later sources win key by key; tables merge rather than replace, so a workspace
//! file can override one provider field without restating the rest.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("generation.default_time_ceiling_minutes", 45_i64)?
        .set_default("generation.decision_temperature", 0.7_f64)?
        .set_default("generation.expansion_temperature", 0.4_f64)?
        .set_default("generation.max_tokens", 4096_i64)?
        .set_default("orchestrator.first_ready_timeout_secs", 20_i64)?
        .set_default("batch.poll_interval_secs", 5_i64)?
        .set_default("storage.local_ttl_secs", 259_200_i64)
}
