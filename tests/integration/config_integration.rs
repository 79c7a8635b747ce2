//! Layered configuration: global file, workspace files, environment

use mealplan::config::ConfigLoader;
use mealplan::error::ApiError;
use mealplan::generation::GenerationPipeline;
use mealplan::types::MealType;
use std::path::Path;
use tempfile::TempDir;

use crate::integration::test_utils::with_env;

fn write(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

#[test]
fn test_layers_apply_in_precedence_order() {
    let xdg = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    write(
        &xdg.path().join("mealplan").join("config.toml"),
        "[orchestrator]\nfirst_ready_timeout_secs = 10\n\n[batch]\npoll_interval_secs = 7\n",
    );
    write(
        &workspace.path().join("config").join("config.toml"),
        "[orchestrator]\nfirst_ready_timeout_secs = 15\n\n[generation]\nmax_tokens = 1024\n",
    );

    let config = with_env(
        &[
            ("XDG_CONFIG_HOME", xdg.path().to_str().unwrap()),
            ("MEALPLAN_ORCHESTRATOR__FIRST_READY_TIMEOUT_SECS", "25"),
        ],
        || ConfigLoader::load(workspace.path()),
    )
    .unwrap();

    assert_eq!(config.orchestrator.first_ready_timeout_secs, 25);
    assert_eq!(config.batch.poll_interval_secs, 7);
    assert_eq!(config.generation.max_tokens, 1024);
    assert_eq!(config.generation.default_time_ceiling_minutes, 45);
}

#[test]
fn test_environment_file_overrides_base_workspace_file() {
    let xdg = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    write(
        &workspace.path().join("config").join("config.toml"),
        "[generation]\ndefault_time_ceiling_minutes = 40\n",
    );
    write(
        &workspace.path().join("config").join("staging.toml"),
        "[generation]\ndefault_time_ceiling_minutes = 30\n",
    );

    let config = with_env(
        &[
            ("XDG_CONFIG_HOME", xdg.path().to_str().unwrap()),
            ("MEALPLAN_ENV", "staging"),
        ],
        || ConfigLoader::load(workspace.path()),
    )
    .unwrap();
    assert_eq!(config.generation.default_time_ceiling_minutes, 30);
}

#[test]
fn test_meal_type_list_from_environment() {
    let xdg = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    let config = with_env(
        &[
            ("XDG_CONFIG_HOME", xdg.path().to_str().unwrap()),
            ("MEALPLAN_BATCH__DEFAULT_MEAL_TYPES", "breakfast,lunch"),
        ],
        || ConfigLoader::load(workspace.path()),
    )
    .unwrap();
    assert_eq!(
        config.batch.default_meal_types,
        vec![MealType::Breakfast, MealType::Lunch]
    );
}

#[test]
fn test_explicit_file_must_exist() {
    let xdg = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    let missing = workspace.path().join("nope.toml");
    let result = with_env(&[("XDG_CONFIG_HOME", xdg.path().to_str().unwrap())], || {
        ConfigLoader::load_with_file(workspace.path(), Some(&missing))
    });
    assert!(matches!(result, Err(ApiError::ConfigError(_))));
}

#[test]
fn test_pipeline_from_single_provider_config() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("mealplan.toml");
    write(
        &file,
        r#"
[providers.kitchen]
provider_type = "ollama"
model = "llama3"
endpoint = "http://localhost:11434"
"#,
    );
    let config = ConfigLoader::load_from_file(&file).unwrap();
    let pipeline = GenerationPipeline::from_config(&config).unwrap();
    assert_eq!(pipeline.settings().decision_options.temperature, Some(0.7));
    assert_eq!(pipeline.settings().expansion_options.temperature, Some(0.4));
}

#[test]
fn test_ambiguous_providers_need_explicit_choice() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("mealplan.toml");
    write(
        &file,
        r#"
[providers.a]
provider_type = "ollama"
model = "llama3"

[providers.b]
provider_type = "ollama"
model = "mistral"
"#,
    );
    let config = ConfigLoader::load_from_file(&file).unwrap();
    let err = GenerationPipeline::from_config(&config).err().unwrap();
    assert!(err.to_string().contains("set generation.decision_provider"));
}

#[test]
fn test_unknown_provider_reference_fails_validation() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("mealplan.toml");
    write(&file, "[generation]\ndecision_provider = \"ghost\"\n");
    let err = ConfigLoader::load_from_file(&file).unwrap_err();
    assert!(err.to_string().contains("unknown provider 'ghost'"));
}
