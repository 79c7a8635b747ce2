//! Configuration loading: builds the layered source stack and deserializes it.

use config::File;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::MealPlanConfig;
use crate::error::ApiError;

/// Loads [`MealPlanConfig`] from defaults, files and environment.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, global file, `config/config.toml`,
    /// `config/{MEALPLAN_ENV}.toml`, `MEALPLAN_*` environment variables.
    pub fn load(workspace_root: &Path) -> Result<MealPlanConfig, ApiError> {
        Self::load_with_file(workspace_root, None)
    }

    /// Like [`ConfigLoader::load`], with an explicit file layered above the workspace files.
    /// The explicit file must exist.
    pub fn load_with_file(
        workspace_root: &Path,
        explicit_file: Option<&Path>,
    ) -> Result<MealPlanConfig, ApiError> {
        let mut builder = merge_policy::builder_with_defaults()?;
        builder = global_file::add_to_builder(builder)?;
        builder = workspace_file::add_to_builder(builder, workspace_root)?;
        if let Some(path) = explicit_file {
            if !path.exists() {
                return Err(ApiError::ConfigError(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = environment::add_to_builder(builder);

        let config: MealPlanConfig = builder.build()?.try_deserialize()?;
        debug!(
            workspace = %workspace_root.display(),
            providers = config.providers.len(),
            "Configuration loaded"
        );
        config.validated()
    }

    /// Load a single file on top of the defaults, without global, workspace or env layers.
    pub fn load_from_file(path: &Path) -> Result<MealPlanConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let config: MealPlanConfig = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()?;
        config.validated()
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
