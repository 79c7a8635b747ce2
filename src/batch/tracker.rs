//! StatusTracker: persists status transitions and fans them out.

use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::status::{GenerationStatus, StatusState};
use crate::error::ApiError;
use crate::store::{DurableStore, StatusKey};
use crate::types::{now_millis, UserId};

const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Handle to a push subscription started by [`StatusTracker::subscribe_status`].
///
/// Dropping the handle leaves the listener running; call [`StatusSubscription::cancel`]
/// to stop it early.
pub struct StatusSubscription {
    task: JoinHandle<()>,
}

impl StatusSubscription {
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the listener to stop (terminal status delivered, or cancelled).
    pub async fn finished(self) {
        let _ = self.task.await;
    }
}

/// A batch being run by this process. Released on drop.
pub struct RunClaim {
    running: Arc<Mutex<HashSet<StatusKey>>>,
    key: StatusKey,
}

impl RunClaim {
    pub fn key(&self) -> &StatusKey {
        &self.key
    }
}

impl Drop for RunClaim {
    fn drop(&mut self) {
        self.running.lock().remove(&self.key);
    }
}

pub struct StatusTracker {
    store: Arc<dyn DurableStore>,
    updates: broadcast::Sender<GenerationStatus>,
    /// Serializes read-modify-write so concurrent updates never lose an increment.
    write_lock: Mutex<()>,
    running: Arc<Mutex<HashSet<StatusKey>>>,
}

impl StatusTracker {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            store,
            updates,
            write_lock: Mutex::new(()),
            running: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn store(&self) -> &Arc<dyn DurableStore> {
        &self.store
    }

    /// Create a pending status. Creating an identical pending status again is a
    /// no-op; any other existing status is an `InvalidTransition` (see
    /// [`StatusTracker::restart`] for failed or abandoned batches).
    pub fn create(
        &self,
        user_id: &UserId,
        week: NaiveDate,
        total_days: u32,
    ) -> Result<GenerationStatus, ApiError> {
        let key = StatusKey::new(user_id.clone(), week);
        let _guard = self.write_lock.lock();
        if let Some(existing) = self.store.get_status(&key)? {
            if existing.state == StatusState::Pending && existing.total_days == total_days {
                return Ok(existing);
            }
            return Err(ApiError::InvalidTransition(format!(
                "a batch for {} already exists ({}, {}/{} days)",
                key, existing.state, existing.completed_days, existing.total_days
            )));
        }

        let status = GenerationStatus::new(&key, total_days, now_millis())?;
        self.store.put_status(&status)?;
        info!(key = %key, total_days, "Batch status created");
        let _ = self.updates.send(status.clone());
        Ok(status)
    }

    /// Mark `(user, week)` as run by this process until the claim is dropped.
    ///
    /// A second claim on a live batch is an `InvalidTransition`.
    pub fn claim_run(&self, user_id: &UserId, week: NaiveDate) -> Result<RunClaim, ApiError> {
        let key = StatusKey::new(user_id.clone(), week);
        if !self.running.lock().insert(key.clone()) {
            return Err(ApiError::InvalidTransition(format!(
                "a batch for {} is already running",
                key
            )));
        }
        Ok(RunClaim {
            running: self.running.clone(),
            key,
        })
    }

    pub fn is_running(&self, user_id: &UserId, week: NaiveDate) -> bool {
        self.running
            .lock()
            .contains(&StatusKey::new(user_id.clone(), week))
    }

    /// Start `(user, week)` over with a fresh pending status.
    ///
    /// Replaces a `failed` status or an abandoned `in_progress` one (not running in
    /// this process). The old record is replaced whole, never moved backwards. A
    /// missing or pending status behaves like [`StatusTracker::create`]; a completed
    /// one is an `InvalidTransition`.
    pub fn restart(
        &self,
        user_id: &UserId,
        week: NaiveDate,
        total_days: u32,
    ) -> Result<GenerationStatus, ApiError> {
        if self.is_running(user_id, week) {
            return Err(ApiError::InvalidTransition(format!(
                "a batch for {} is already running",
                StatusKey::new(user_id.clone(), week)
            )));
        }
        self.replace_stale(user_id, week, total_days)
    }

    /// [`StatusTracker::restart`] without the live-run check, for the holder of the claim.
    pub(crate) fn replace_stale(
        &self,
        user_id: &UserId,
        week: NaiveDate,
        total_days: u32,
    ) -> Result<GenerationStatus, ApiError> {
        let key = StatusKey::new(user_id.clone(), week);
        {
            let _guard = self.write_lock.lock();
            if let Some(existing) = self.store.get_status(&key)? {
                match existing.state {
                    StatusState::Failed | StatusState::InProgress => {
                        let fresh = GenerationStatus::new(&key, total_days, now_millis())?;
                        self.store.put_status(&fresh)?;
                        info!(
                            key = %key,
                            previous = %existing.state,
                            completed_days = existing.completed_days,
                            "Batch status restarted"
                        );
                        let _ = self.updates.send(fresh.clone());
                        return Ok(fresh);
                    }
                    StatusState::Completed => {
                        return Err(ApiError::InvalidTransition(format!(
                            "batch {} is already completed",
                            key
                        )));
                    }
                    StatusState::Pending => {}
                }
            }
        }
        self.create(user_id, week, total_days)
    }

    fn update<F>(&self, user_id: &UserId, week: NaiveDate, apply: F) -> Result<GenerationStatus, ApiError>
    where
        F: FnOnce(&GenerationStatus, u64) -> Result<GenerationStatus, ApiError>,
    {
        let key = StatusKey::new(user_id.clone(), week);
        let _guard = self.write_lock.lock();
        let current = self
            .store
            .get_status(&key)?
            .ok_or_else(|| ApiError::InvalidTransition(format!("no batch status for {}", key)))?;

        let next = apply(&current, now_millis())?;
        if next == current {
            return Ok(current);
        }
        self.store.put_status(&next)?;
        info!(
            key = %key,
            state = %next.state,
            completed_days = next.completed_days,
            total_days = next.total_days,
            "Batch status updated"
        );
        // sent under the lock so subscribers see updates in write order
        let _ = self.updates.send(next.clone());
        Ok(next)
    }

    pub fn begin(&self, user_id: &UserId, week: NaiveDate) -> Result<GenerationStatus, ApiError> {
        self.update(user_id, week, |status, now| status.begin(now))
    }

    pub fn record_day_completed(
        &self,
        user_id: &UserId,
        week: NaiveDate,
    ) -> Result<GenerationStatus, ApiError> {
        self.update(user_id, week, |status, now| status.record_day(now))
    }

    pub fn advance_to(
        &self,
        user_id: &UserId,
        week: NaiveDate,
        completed_days: u32,
    ) -> Result<GenerationStatus, ApiError> {
        self.update(user_id, week, |status, now| status.advance_to(completed_days, now))
    }

    pub fn fail(
        &self,
        user_id: &UserId,
        week: NaiveDate,
        error: &str,
    ) -> Result<GenerationStatus, ApiError> {
        self.update(user_id, week, |status, now| status.fail(error, now))
    }

    pub fn get_status(
        &self,
        user_id: &UserId,
        week: NaiveDate,
    ) -> Result<Option<GenerationStatus>, ApiError> {
        Ok(self.store.get_status(&StatusKey::new(user_id.clone(), week))?)
    }

    /// `Ok` only for a completed batch; results must not be read before that.
    pub fn ensure_readable(
        &self,
        user_id: &UserId,
        week: NaiveDate,
    ) -> Result<GenerationStatus, ApiError> {
        let key = StatusKey::new(user_id.clone(), week);
        match self.store.get_status(&key)? {
            Some(status) if status.state == StatusState::Completed => Ok(status),
            Some(status) => Err(ApiError::StatusNotCompleted {
                key: key.to_string(),
                state: status.state.to_string(),
            }),
            None => Err(ApiError::StatusNotCompleted {
                key: key.to_string(),
                state: "missing".to_string(),
            }),
        }
    }

    /// Raw stream of every status update, all keys.
    pub fn updates(&self) -> broadcast::Receiver<GenerationStatus> {
        self.updates.subscribe()
    }

    /// Push subscription for one `(user, week)`.
    ///
    /// The callback first receives the current status (if any), then every later
    /// update in order. The listener stops after delivering a terminal status.
    /// Must be called from within a tokio runtime.
    pub fn subscribe_status<F>(
        &self,
        user_id: &UserId,
        week: NaiveDate,
        mut callback: F,
    ) -> StatusSubscription
    where
        F: FnMut(&GenerationStatus) + Send + 'static,
    {
        let key = StatusKey::new(user_id.clone(), week);
        let mut updates = self.updates.subscribe();
        let store = self.store.clone();

        let task = tokio::spawn(async move {
            let mut last_rank = None;
            let mut deliver = |status: &GenerationStatus| -> bool {
                if last_rank.map_or(true, |rank| status.progress_rank() > rank) {
                    last_rank = Some(status.progress_rank());
                    callback(status);
                }
                status.is_terminal()
            };

            match store.get_status(&key) {
                Ok(Some(status)) => {
                    if deliver(&status) {
                        return;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(key = %key, error = %e, "Could not read initial status"),
            }

            loop {
                match updates.recv().await {
                    Ok(status) if status.key() == key => {
                        if deliver(&status) {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(key = %key, skipped, "Subscriber lagged; re-reading status");
                        if let Ok(Some(status)) = store.get_status(&key) {
                            if deliver(&status) {
                                break;
                            }
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        StatusSubscription { task }
    }

    /// Poll `get_status` every `interval` until a terminal state or `timeout`.
    ///
    /// The callback sees every observed status. Returns the terminal status, or
    /// `Timeout` once the deadline passes; no read happens after either.
    pub async fn poll_status<F>(
        &self,
        user_id: &UserId,
        week: NaiveDate,
        interval: Duration,
        timeout: Duration,
        mut callback: F,
    ) -> Result<GenerationStatus, ApiError>
    where
        F: FnMut(&GenerationStatus),
    {
        if interval.is_zero() {
            return Err(ApiError::InvalidRequest(
                "poll interval must be positive".to_string(),
            ));
        }
        let key = StatusKey::new(user_id.clone(), week);
        let deadline = Instant::now() + timeout;

        loop {
            let current = self.store.get_status(&key)?;
            if let Some(status) = &current {
                callback(status);
                if status.is_terminal() {
                    debug!(key = %key, state = %status.state, "Polling stopped on terminal status");
                    return Ok(status.clone());
                }
            }

            let now = Instant::now();
            if now >= deadline {
                let state = current
                    .map(|s| s.state.to_string())
                    .unwrap_or_else(|| "missing".to_string());
                return Err(ApiError::Timeout(format!(
                    "batch {} still {} after {}s",
                    key,
                    state,
                    timeout.as_secs()
                )));
            }
            tokio::time::sleep(interval.min(deadline - now)).await;
        }
    }
}
