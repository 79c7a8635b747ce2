//! WeekBatchRunner: the background job that plans a whole week.
//!
//! Days run in order; the meals of one day resolve concurrently. Each finished day
//! advances the status counter, and the first failed day fails the batch.

use chrono::NaiveDate;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::status::{GenerationStatus, StatusState, DAYS_PER_WEEK};
use super::tracker::StatusTracker;
use crate::error::ApiError;
use crate::generation::{GenerationRequest, DEFAULT_TIME_CEILING_MINUTES};
use crate::preferences::PreferenceSnapshot;
use crate::resolver::TieredResolver;
use crate::types::{week_dates, MealType, UserId};

pub struct WeekBatchRunner {
    resolver: Arc<TieredResolver>,
    tracker: Arc<StatusTracker>,
    default_time_ceiling: u32,
}

impl WeekBatchRunner {
    pub fn new(resolver: Arc<TieredResolver>, tracker: Arc<StatusTracker>) -> Self {
        Self {
            resolver,
            tracker,
            default_time_ceiling: DEFAULT_TIME_CEILING_MINUTES,
        }
    }

    pub fn with_default_time_ceiling(mut self, minutes: u32) -> Self {
        self.default_time_ceiling = minutes;
        self
    }

    pub fn tracker(&self) -> &Arc<StatusTracker> {
        &self.tracker
    }

    /// Plan every day of the week containing `week`.
    ///
    /// An already completed week is returned as is. A failed week, or one left
    /// in progress by a run that is gone, starts over from day one; meals already
    /// stored are durable hits. Returns the final status, or the error of the first
    /// failed day (after marking the batch failed).
    pub async fn run_week(
        &self,
        user_id: &UserId,
        week: NaiveDate,
        snapshot: &PreferenceSnapshot,
        meal_types: &[MealType],
        pantry: &[String],
        avoid: &[String],
    ) -> Result<GenerationStatus, ApiError> {
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

        if let Some(existing) = self.tracker.get_status(user_id, week)? {
            if existing.state == StatusState::Completed {
                info!(user = %user_id, week = %existing.week_start, "Week already completed");
                return Ok(existing);
            }
        }

        let _claim = self.tracker.claim_run(user_id, week)?;
        let created = self.tracker.replace_stale(user_id, week, DAYS_PER_WEEK)?;
        let week_start = created.week_start;
        let mut status = self.tracker.begin(user_id, week_start)?;
        info!(
            user = %user_id,
            week = %week_start,
            meals = meals.len(),
            "Week batch started"
        );

        for date in week_dates(week_start) {
            let requests = match meals
                .iter()
                .map(|meal| {
                    GenerationRequest::builder(date, *meal, snapshot)
                        .pantry(pantry)
                        .avoid(avoid)
                        .default_time_ceiling(self.default_time_ceiling)
                        .build()
                })
                .collect::<Result<Vec<_>, _>>()
            {
                Ok(requests) => requests,
                Err(e) => return Err(self.fail_batch(user_id, week_start, date, e)),
            };

            let mut pending = FuturesUnordered::new();
            for request in &requests {
                let resolver = self.resolver.clone();
                pending.push(async move {
                    let result = resolver.resolve(user_id, request).await;
                    (request.meal_type, result)
                });
            }

            let mut day_error = None;
            while let Some((meal, result)) = pending.next().await {
                match result {
                    Ok(resolution) => {
                        debug!(date = %date, meal = %meal, source = %resolution.source, "Meal resolved")
                    }
                    Err(e) => {
                        warn!(date = %date, meal = %meal, error = %e, "Meal failed");
                        if day_error.is_none() {
                            day_error = Some(e);
                        }
                    }
                }
            }

            if let Some(e) = day_error {
                return Err(self.fail_batch(user_id, week_start, date, e));
            }
            status = self.tracker.record_day_completed(user_id, week_start)?;
        }

        info!(
            user = %user_id,
            week = %week_start,
            state = %status.state,
            "Week batch finished"
        );
        Ok(status)
    }

    fn fail_batch(&self, user_id: &UserId, week_start: NaiveDate, date: NaiveDate, error: ApiError) -> ApiError {
        let message = format!("{}: {}", date, error);
        if let Err(e) = self.tracker.fail(user_id, week_start, &message) {
            warn!(user = %user_id, week = %week_start, error = %e, "Could not mark batch failed");
        }
        error
    }
}
