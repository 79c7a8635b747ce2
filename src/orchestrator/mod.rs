//! Multi-meal orchestrator
//!
//! [`DayPlanner`] resolves every requested meal of a day concurrently and lets the
//! caller wait for the first one to finish (bounded) or for all of them. Per-day
//! state lives in a caller-owned [`DayPlanSession`].

pub mod session;

pub use session::{DayPlanSession, MealFailure, MealState};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::generation::{GenerationRequest, DEFAULT_TIME_CEILING_MINUTES};
use crate::preferences::PreferenceSnapshot;
use crate::resolver::{Resolution, TieredResolver};
use crate::types::{MealType, UserId};

pub const DEFAULT_FIRST_READY_TIMEOUT: Duration = Duration::from_secs(20);

/// Result of waiting for the first meal to finish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstReady {
    Finished { meal_type: MealType, succeeded: bool },
    TimedOut,
}

/// Snapshot of a session after [`DayPlanner::wait_for_all`]
#[derive(Debug, Clone, Default)]
pub struct DayPlanOutcome {
    pub ready: BTreeMap<MealType, Resolution>,
    pub failures: BTreeMap<MealType, MealFailure>,
    /// Meals still loading when the wait ended
    pub pending: Vec<MealType>,
    /// Set only when every meal failed
    pub session_error: Option<MealFailure>,
}

impl DayPlanOutcome {
    fn from_session(session: &DayPlanSession) -> Self {
        let mut outcome = DayPlanOutcome {
            session_error: session.session_error(),
            ..Default::default()
        };
        for (meal, state) in session.states() {
            match state {
                MealState::Ready(resolution) => {
                    outcome.ready.insert(meal, *resolution);
                }
                MealState::Failed(failure) => {
                    outcome.failures.insert(meal, failure);
                }
                MealState::Loading | MealState::Idle => outcome.pending.push(meal),
            }
        }
        outcome
    }

    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }
}

pub struct DayPlanner {
    resolver: Arc<TieredResolver>,
    first_ready_timeout: Duration,
    default_time_ceiling: u32,
}

impl DayPlanner {
    pub fn new(resolver: Arc<TieredResolver>) -> Self {
        Self {
            resolver,
            first_ready_timeout: DEFAULT_FIRST_READY_TIMEOUT,
            default_time_ceiling: DEFAULT_TIME_CEILING_MINUTES,
        }
    }

    pub fn with_first_ready_timeout(mut self, timeout: Duration) -> Self {
        self.first_ready_timeout = timeout;
        self
    }

    pub fn with_default_time_ceiling(mut self, minutes: u32) -> Self {
        self.default_time_ceiling = minutes;
        self
    }

    pub fn first_ready_timeout(&self) -> Duration {
        self.first_ready_timeout
    }

    /// Launch one resolution per meal type for the session's date.
    ///
    /// Returns `Ok(false)` without doing anything if the session was already
    /// started. Duplicate meal types are collapsed. Must be called from within a
    /// tokio runtime; the tasks outlive any waiter.
    pub fn start_day_plan(
        &self,
        session: &Arc<DayPlanSession>,
        user_id: &UserId,
        meal_types: &[MealType],
        snapshot: &PreferenceSnapshot,
    ) -> Result<bool, ApiError> {
        let mut meals: Vec<MealType> = Vec::with_capacity(meal_types.len());
        for meal in meal_types {
            if !meals.contains(meal) {
                meals.push(*meal);
            }
        }
        if meals.is_empty() {
            return Err(ApiError::InvalidRequest(
                "at least one meal type is required".to_string(),
            ));
        }

        let requests = meals
            .iter()
            .map(|meal| {
                GenerationRequest::builder(session.date(), *meal, snapshot)
                    .pantry(session.pantry_items())
                    .avoid(session.avoid_items())
                    .default_time_ceiling(self.default_time_ceiling)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;

        if !session.try_start(&meals) {
            debug!(session = session.id(), "Day plan already started; ignoring");
            return Ok(false);
        }
        info!(
            session = session.id(),
            user = %user_id,
            date = %session.date(),
            meals = meals.len(),
            "Starting day plan"
        );

        for request in requests {
            let resolver = self.resolver.clone();
            let session = session.clone();
            let user_id = user_id.clone();
            tokio::spawn(async move {
                let result = resolver.resolve(&user_id, &request).await;
                if let Err(e) = &result {
                    warn!(
                        session = session.id(),
                        meal = %request.meal_type,
                        error = %e,
                        "Meal failed"
                    );
                }
                session.finish(request.meal_type, result);
            });
        }
        Ok(true)
    }

    /// Wait until any meal reaches a terminal state, bounded by the first-ready timeout.
    ///
    /// Timing out does not cancel the meal tasks.
    pub async fn wait_for_first_ready(&self, session: &DayPlanSession) -> FirstReady {
        let mut progress = session.subscribe();
        let waited = tokio::time::timeout(self.first_ready_timeout, async {
            progress
                .wait_for(|p| p.first_finished.is_some())
                .await
                .ok()
                .and_then(|p| p.first_finished)
        })
        .await;

        match waited {
            Ok(Some((meal_type, succeeded))) => FirstReady::Finished {
                meal_type,
                succeeded,
            },
            _ => {
                info!(
                    session = session.id(),
                    timeout_ms = self.first_ready_timeout.as_millis() as u64,
                    "No meal finished before the first-ready timeout"
                );
                FirstReady::TimedOut
            }
        }
    }

    /// Wait until every meal is terminal or `timeout` elapses, then snapshot the session.
    pub async fn wait_for_all(&self, session: &DayPlanSession, timeout: Duration) -> DayPlanOutcome {
        if session.has_started() {
            let mut progress = session.subscribe();
            let waited = tokio::time::timeout(timeout, async {
                progress.wait_for(|p| p.all_finished()).await.is_ok()
            })
            .await;
            if waited.is_err() {
                debug!(session = session.id(), "Stopped waiting with meals still loading");
            }
        }
        DayPlanOutcome::from_session(session)
    }
}
