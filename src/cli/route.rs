//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::batch::{build_shopping_list, StatusState, StatusTracker, WeekBatchRunner, DAYS_PER_WEEK};
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_canonical_json, format_canonical_text, format_day_plan, format_first_ready,
    format_shopping_list_text, format_status_line, format_status_text, to_pretty_json,
    OutputFormat,
};
use crate::config::{ConfigLoader, MealPlanConfig};
use crate::error::{ApiError, ErrorKind};
use crate::generation::{GenerationPipeline, MenuGenerator};
use crate::orchestrator::{DayPlanSession, DayPlanner};
use crate::preferences::{hash_canonical, CanonicalPreferences, PreferenceSnapshot};
use crate::resolver::TieredResolver;
use crate::store::{DurableStore, FileLocalCache, SledDurableStore};
use crate::types::{parse_date, MealType, UserId};

/// Runtime context for CLI execution: workspace, loaded config and a tokio runtime.
/// Storage and providers are opened per command, only when the command needs them.
pub struct RunContext {
    workspace_root: PathBuf,
    config: MealPlanConfig,
    runtime: tokio::runtime::Runtime,
}

/// Storage, resolver and tracker for one command
struct Services {
    durable: Arc<SledDurableStore>,
    resolver: Arc<TieredResolver>,
    tracker: Arc<StatusTracker>,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = ConfigLoader::load_with_file(&workspace_root, config_path.as_deref())?;
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| ApiError::ConfigError(format!("Failed to create runtime: {}", e)))?;
        debug!(workspace = %workspace_root.display(), "Run context ready");
        Ok(Self {
            workspace_root,
            config,
            runtime,
        })
    }

    pub fn config(&self) -> &MealPlanConfig {
        &self.config
    }

    /// Single entry point: dispatch command to the appropriate handler.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::HashPrefs { prefs, format } => self.handle_hash_prefs(prefs, format),
            Commands::PlanDay {
                user,
                date,
                meals,
                prefs,
                pantry,
                avoid,
                wait_secs,
            } => self.handle_plan_day(
                user,
                date,
                meals.as_deref(),
                prefs,
                pantry,
                avoid,
                Duration::from_secs(*wait_secs),
            ),
            Commands::PlanWeek {
                user,
                week,
                prefs,
                meals,
                pantry,
                avoid,
            } => self.handle_plan_week(user, week, prefs, meals.as_deref(), pantry, avoid),
            Commands::Status {
                user,
                week,
                watch,
                timeout_secs,
                format,
            } => self.handle_status(user, week, *watch, Duration::from_secs(*timeout_secs), format),
            Commands::ShoppingList {
                user,
                week,
                meals,
                pantry,
                format,
            } => self.handle_shopping_list(user, week, meals.as_deref(), pantry, format),
        }
    }

    fn handle_hash_prefs(&self, prefs: &Path, format: &str) -> Result<String, ApiError> {
        let format = OutputFormat::parse(format)?;
        let snapshot = PreferenceSnapshot::from_path(&self.resolve_path(prefs))?;
        let canonical = CanonicalPreferences::from_snapshot(&snapshot);
        let hash = hash_canonical(&canonical);
        match format {
            OutputFormat::Text => Ok(format_canonical_text(&canonical, &hash)),
            OutputFormat::Json => format_canonical_json(&canonical, &hash),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_plan_day(
        &self,
        user: &str,
        date: &str,
        meals: Option<&str>,
        prefs: &Path,
        pantry: &[String],
        avoid: &[String],
        wait: Duration,
    ) -> Result<String, ApiError> {
        let user_id = UserId::new(user);
        let date = parse_date(date)?;
        let meals = self.meal_types(meals)?;
        let snapshot = PreferenceSnapshot::from_path(&self.resolve_path(prefs))?;
        let services = self.open_services()?;

        let planner = DayPlanner::new(services.resolver.clone())
            .with_first_ready_timeout(self.config.orchestrator.first_ready_timeout())
            .with_default_time_ceiling(self.config.generation.default_time_ceiling_minutes);
        let session = Arc::new(
            DayPlanSession::new(date)
                .pantry(pantry.to_vec())
                .avoid(avoid.to_vec()),
        );

        let outcome = self.runtime.block_on(async {
            planner.start_day_plan(&session, &user_id, &meals, &snapshot)?;
            let first = planner.wait_for_first_ready(&session).await;
            // shown before the slower meals finish
            println!("{}", format_first_ready(&first));
            Ok::<_, ApiError>(planner.wait_for_all(&session, wait).await)
        })?;
        services.durable.flush()?;

        info!(
            session = session.id(),
            ready = outcome.ready.len(),
            failed = outcome.failures.len(),
            pending = outcome.pending.len(),
            "Day plan finished"
        );
        if let Some(failure) = &outcome.session_error {
            println!("{}", format_day_plan(date, &outcome));
            return Err(ApiError::CacheMiss {
                key: format!("{}/{}", user_id, date),
                cause: Some(failure.kind).filter(|kind| *kind != ErrorKind::CacheMiss),
            });
        }
        Ok(format_day_plan(date, &outcome))
    }

    fn handle_plan_week(
        &self,
        user: &str,
        week: &str,
        prefs: &Path,
        meals: Option<&str>,
        pantry: &[String],
        avoid: &[String],
    ) -> Result<String, ApiError> {
        let user_id = UserId::new(user);
        let week = parse_date(week)?;
        let meals = self.meal_types(meals)?;
        let snapshot = PreferenceSnapshot::from_path(&self.resolve_path(prefs))?;
        let services = self.open_services()?;

        let runner = WeekBatchRunner::new(services.resolver.clone(), services.tracker.clone())
            .with_default_time_ceiling(self.config.generation.default_time_ceiling_minutes);

        // start a failed or abandoned week over before subscribing to it
        if let Some(existing) = services.tracker.get_status(&user_id, week)? {
            if matches!(existing.state, StatusState::Failed | StatusState::InProgress) {
                let fresh = services.tracker.restart(&user_id, week, DAYS_PER_WEEK)?;
                info!(
                    user = %user_id,
                    week = %fresh.week_start,
                    previous = %existing.state,
                    "Retrying week batch"
                );
            }
        }

        let result = self.runtime.block_on(async {
            let subscription = services.tracker.subscribe_status(&user_id, week, |status| {
                println!("{}", format_status_line(status));
            });
            let result = runner
                .run_week(&user_id, week, &snapshot, &meals, pantry, avoid)
                .await;
            // the listener only stops by itself once the batch is terminal
            match services.tracker.get_status(&user_id, week) {
                Ok(Some(status)) if status.is_terminal() => subscription.finished().await,
                _ => subscription.cancel(),
            }
            result
        });
        services.durable.flush()?;
        let status = result?;
        Ok(format_status_text(&status))
    }

    fn handle_status(
        &self,
        user: &str,
        week: &str,
        watch: bool,
        timeout: Duration,
        format: &str,
    ) -> Result<String, ApiError> {
        let format = OutputFormat::parse(format)?;
        let user_id = UserId::new(user);
        let week = parse_date(week)?;
        let tracker = StatusTracker::new(self.open_durable()?);

        let status = if watch {
            let interval = self.config.batch.poll_interval();
            self.runtime.block_on(tracker.poll_status(
                &user_id,
                week,
                interval,
                timeout,
                |status| println!("{}", format_status_line(status)),
            ))?
        } else {
            tracker.get_status(&user_id, week)?.ok_or_else(|| {
                ApiError::InvalidRequest(format!(
                    "No batch for {} in the week of {}",
                    user_id,
                    crate::types::week_start(week)
                ))
            })?
        };

        match format {
            OutputFormat::Text => Ok(format_status_text(&status)),
            OutputFormat::Json => to_pretty_json(&status),
        }
    }

    fn handle_shopping_list(
        &self,
        user: &str,
        week: &str,
        meals: Option<&str>,
        pantry: &[String],
        format: &str,
    ) -> Result<String, ApiError> {
        let format = OutputFormat::parse(format)?;
        let user_id = UserId::new(user);
        let week = parse_date(week)?;
        let meals = self.meal_types(meals)?;
        let tracker = StatusTracker::new(self.open_durable()?);

        let list = build_shopping_list(&tracker, &user_id, week, &meals, pantry)?;
        match format {
            OutputFormat::Text => Ok(format_shopping_list_text(&list)),
            OutputFormat::Json => to_pretty_json(&list),
        }
    }

    fn meal_types(&self, meals: Option<&str>) -> Result<Vec<MealType>, ApiError> {
        match meals {
            Some(list) => MealType::parse_list(list),
            None => Ok(self.config.batch.default_meal_types.clone()),
        }
    }

    /// Relative paths are taken from the workspace root.
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }

    fn open_durable(&self) -> Result<Arc<SledDurableStore>, ApiError> {
        let path = self.resolve_path(&self.config.storage.durable_path);
        Ok(Arc::new(SledDurableStore::new(path)?))
    }

    fn open_services(&self) -> Result<Services, ApiError> {
        let durable = self.open_durable()?;
        let local = Arc::new(FileLocalCache::new(
            self.resolve_path(&self.config.storage.local_cache_dir),
            self.config.storage.local_ttl(),
        )?);
        let generator: Arc<dyn MenuGenerator> =
            Arc::new(GenerationPipeline::from_config(&self.config)?);
        let store: Arc<dyn DurableStore> = durable.clone();
        let resolver = Arc::new(TieredResolver::new(store.clone(), local, generator));
        let tracker = Arc::new(StatusTracker::new(store));
        Ok(Services {
            durable,
            resolver,
            tracker,
        })
    }
}
