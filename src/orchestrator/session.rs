//! DayPlanSession: caller-owned state for one day's parallel planning.

use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;

use crate::error::{ApiError, ErrorKind};
use crate::resolver::Resolution;
use crate::types::MealType;

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// A failed meal, kept as kind plus message so it can be cloned and shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&ApiError> for MealFailure {
    fn from(error: &ApiError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for MealFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MealState {
    Idle,
    Loading,
    Ready(Box<Resolution>),
    Failed(MealFailure),
}

impl MealState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MealState::Ready(_) | MealState::Failed(_))
    }
}

/// Broadcast to waiters whenever a meal finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SessionProgress {
    /// First meal to reach a terminal state, and whether it succeeded
    pub first_finished: Option<(MealType, bool)>,
    pub finished: usize,
    pub total: usize,
}

impl SessionProgress {
    pub fn all_finished(&self) -> bool {
        self.total > 0 && self.finished >= self.total
    }
}

pub struct DayPlanSession {
    id: String,
    date: NaiveDate,
    pantry: Vec<String>,
    avoid: Vec<String>,
    has_started: AtomicBool,
    meals: Mutex<BTreeMap<MealType, MealState>>,
    first_error: Mutex<Option<MealFailure>>,
    progress: watch::Sender<SessionProgress>,
}

impl DayPlanSession {
    pub fn new(date: NaiveDate) -> Self {
        let seq = NEXT_SESSION.fetch_add(1, Ordering::Relaxed);
        Self::with_id(format!("day-{}-{}", date, seq), date)
    }

    pub fn with_id(id: impl Into<String>, date: NaiveDate) -> Self {
        let (progress, _) = watch::channel(SessionProgress::default());
        Self {
            id: id.into(),
            date,
            pantry: Vec::new(),
            avoid: Vec::new(),
            has_started: AtomicBool::new(false),
            meals: Mutex::new(BTreeMap::new()),
            first_error: Mutex::new(None),
            progress,
        }
    }

    /// Pantry items offered to generation for every meal of the day.
    pub fn pantry(mut self, items: Vec<String>) -> Self {
        self.pantry = items;
        self
    }

    /// Ingredients excluded from every meal of the day.
    pub fn avoid(mut self, items: Vec<String>) -> Self {
        self.avoid = items;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn pantry_items(&self) -> &[String] {
        &self.pantry
    }

    pub fn avoid_items(&self) -> &[String] {
        &self.avoid
    }

    pub fn has_started(&self) -> bool {
        self.has_started.load(Ordering::SeqCst)
    }

    /// Claim the session. Only the first caller gets `true`.
    pub(crate) fn try_start(&self, meal_types: &[MealType]) -> bool {
        if self
            .has_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        {
            let mut meals = self.meals.lock();
            for meal in meal_types {
                meals.insert(*meal, MealState::Loading);
            }
        }
        self.progress.send_modify(|p| p.total = meal_types.len());
        true
    }

    /// Record a meal's outcome and wake waiters.
    pub(crate) fn finish(&self, meal_type: MealType, result: Result<Resolution, ApiError>) {
        let succeeded = result.is_ok();
        let state = match result {
            Ok(resolution) => MealState::Ready(Box::new(resolution)),
            Err(error) => {
                let failure = MealFailure::from(&error);
                let mut first = self.first_error.lock();
                if first.is_none() {
                    *first = Some(failure.clone());
                }
                MealState::Failed(failure)
            }
        };
        self.meals.lock().insert(meal_type, state);
        self.progress.send_modify(|p| {
            p.finished += 1;
            if p.first_finished.is_none() {
                p.first_finished = Some((meal_type, succeeded));
            }
        });
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SessionProgress> {
        self.progress.subscribe()
    }

    pub fn state(&self, meal_type: MealType) -> MealState {
        self.meals
            .lock()
            .get(&meal_type)
            .cloned()
            .unwrap_or(MealState::Idle)
    }

    pub fn states(&self) -> BTreeMap<MealType, MealState> {
        self.meals.lock().clone()
    }

    pub fn is_loading(&self, meal_type: MealType) -> bool {
        matches!(self.state(meal_type), MealState::Loading)
    }

    pub fn is_ready(&self, meal_type: MealType) -> bool {
        matches!(self.state(meal_type), MealState::Ready(_))
    }

    /// First observed failure, reported only once every meal has failed.
    pub fn session_error(&self) -> Option<MealFailure> {
        let meals = self.meals.lock();
        let all_failed =
            !meals.is_empty() && meals.values().all(|s| matches!(s, MealState::Failed(_)));
        if all_failed {
            self.first_error.lock().clone()
        } else {
            None
        }
    }
}

impl fmt::Debug for DayPlanSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DayPlanSession")
            .field("id", &self.id)
            .field("date", &self.date)
            .field("has_started", &self.has_started())
            .finish()
    }
}
