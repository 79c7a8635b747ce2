//! GenerationStatus: the week batch state machine.
//!
//! `pending -> in_progress -> {completed, failed}`. Transitions are pure; they
//! return the next status or `InvalidTransition`, and the tracker persists the
//! result. Counters never decrease and terminal states never change.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ApiError;
use crate::store::StatusKey;
use crate::types::UserId;

pub const DAYS_PER_WEEK: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusState {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl StatusState {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusState::Pending => "pending",
            StatusState::InProgress => "in_progress",
            StatusState::Completed => "completed",
            StatusState::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, StatusState::Completed | StatusState::Failed)
    }
}

impl fmt::Display for StatusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of one `(user, week)` batch job. Timestamps are Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStatus {
    pub user_id: UserId,
    /// Always a Monday
    pub week_start: NaiveDate,
    pub state: StatusState,
    pub completed_days: u32,
    pub total_days: u32,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub finished_at_ms: Option<u64>,
    pub error: Option<String>,
}

impl GenerationStatus {
    pub fn new(key: &StatusKey, total_days: u32, now_ms: u64) -> Result<Self, ApiError> {
        if total_days == 0 {
            return Err(ApiError::InvalidRequest(
                "a batch needs at least one day".to_string(),
            ));
        }
        Ok(Self {
            user_id: key.user_id.clone(),
            week_start: key.week_start,
            state: StatusState::Pending,
            completed_days: 0,
            total_days,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            started_at_ms: None,
            finished_at_ms: None,
            error: None,
        })
    }

    pub fn key(&self) -> StatusKey {
        StatusKey::new(self.user_id.clone(), self.week_start)
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// `completed_days / total_days` in `0.0..=1.0`
    pub fn progress(&self) -> f64 {
        self.completed_days as f64 / self.total_days.max(1) as f64
    }

    /// Orders statuses of one key by how far along they are.
    pub(crate) fn progress_rank(&self) -> (u8, u32, u64) {
        let stage = match self.state {
            StatusState::Pending => 0,
            StatusState::InProgress => 1,
            StatusState::Completed | StatusState::Failed => 2,
        };
        (stage, self.completed_days, self.updated_at_ms)
    }

    fn rejected(&self, attempted: &str) -> ApiError {
        ApiError::InvalidTransition(format!(
            "{} for {} ({}, {}/{} days)",
            attempted,
            self.key(),
            self.state,
            self.completed_days,
            self.total_days
        ))
    }

    /// `pending -> in_progress`. Beginning an in-progress job is a no-op.
    pub fn begin(&self, now_ms: u64) -> Result<Self, ApiError> {
        match self.state {
            StatusState::Pending => Ok(Self {
                state: StatusState::InProgress,
                started_at_ms: Some(now_ms),
                updated_at_ms: now_ms,
                ..self.clone()
            }),
            StatusState::InProgress => Ok(self.clone()),
            _ => Err(self.rejected("begin")),
        }
    }

    /// Move the counter to `completed_days`; reaching `total_days` completes the job.
    ///
    /// Setting the current value again is a no-op, including on a completed job.
    pub fn advance_to(&self, completed_days: u32, now_ms: u64) -> Result<Self, ApiError> {
        if completed_days == self.completed_days
            && matches!(self.state, StatusState::InProgress | StatusState::Completed)
        {
            return Ok(self.clone());
        }
        if self.state != StatusState::InProgress {
            return Err(self.rejected(&format!("advance to {} days", completed_days)));
        }
        if completed_days < self.completed_days {
            return Err(self.rejected(&format!("decrease to {} days", completed_days)));
        }
        if completed_days > self.total_days {
            return Err(self.rejected(&format!("advance past total to {} days", completed_days)));
        }

        let done = completed_days == self.total_days;
        Ok(Self {
            completed_days,
            state: if done {
                StatusState::Completed
            } else {
                StatusState::InProgress
            },
            finished_at_ms: if done { Some(now_ms) } else { None },
            updated_at_ms: now_ms,
            ..self.clone()
        })
    }

    /// One more day finished.
    pub fn record_day(&self, now_ms: u64) -> Result<Self, ApiError> {
        if self.state != StatusState::InProgress {
            return Err(self.rejected("record a completed day"));
        }
        self.advance_to(self.completed_days + 1, now_ms)
    }

    /// `pending | in_progress -> failed`. Failing a failed job is a no-op.
    pub fn fail(&self, error: impl Into<String>, now_ms: u64) -> Result<Self, ApiError> {
        match self.state {
            StatusState::Pending | StatusState::InProgress => Ok(Self {
                state: StatusState::Failed,
                error: Some(error.into()),
                finished_at_ms: Some(now_ms),
                updated_at_ms: now_ms,
                ..self.clone()
            }),
            StatusState::Failed => Ok(self.clone()),
            StatusState::Completed => Err(self.rejected("fail")),
        }
    }
}
