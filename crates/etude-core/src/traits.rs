//! Core trait definitions for persistence and time.
//!
//! `QuizStore` is implemented by the `etude-store` crate; the engine only
//! ever talks to these seams, so storage technology and wall-clock time
//! stay injectable.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{AnswerRecord, Attempt, QuizDefinition, QuizFilter, StreakState};

// ---------------------------------------------------------------------------
// Quiz store trait
// ---------------------------------------------------------------------------

/// Persistence collaborator for quizzes, attempts, answers, and streaks.
///
/// Implementations must provide two guarantees the engine relies on:
///
/// - `complete_attempt` is a compare-and-set: of any number of concurrent
///   calls for one attempt, exactly one succeeds and the rest fail with
///   [`StoreError::AlreadyCompleted`].
/// - `upsert_answer` keeps at most one record per (attempt, question) and
///   rejects writes against a completed attempt with
///   [`StoreError::AlreadyCompleted`].
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Registers a quiz definition, replacing any prior one with the same id.
    async fn insert_quiz(&self, quiz: QuizDefinition) -> Result<(), StoreError>;

    /// Fetches a quiz by id.
    async fn quiz(&self, quiz_id: &str) -> Result<QuizDefinition, StoreError>;

    /// Lists quizzes passing the filter, in insertion order.
    async fn list_quizzes(&self, filter: &QuizFilter) -> Result<Vec<QuizDefinition>, StoreError>;

    /// Number of registered quizzes.
    async fn quiz_count(&self) -> Result<u32, StoreError>;

    /// Records a new in-progress attempt.
    async fn insert_attempt(&self, attempt: Attempt) -> Result<(), StoreError>;

    /// Fetches an attempt by id.
    async fn attempt(&self, attempt_id: Uuid) -> Result<Attempt, StoreError>;

    /// Atomically transitions an attempt to completed, setting `score` and
    /// `completed_at` together, and returns the updated record.
    async fn complete_attempt(
        &self,
        attempt_id: Uuid,
        score: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<Attempt, StoreError>;

    /// All completed attempts, any order.
    async fn completed_attempts(&self) -> Result<Vec<Attempt>, StoreError>;

    /// All of one user's attempts, newest `started_at` first.
    async fn attempts_for_user(&self, user_id: &str) -> Result<Vec<Attempt>, StoreError>;

    /// Records an answer choice, overwriting any earlier choice for the
    /// same (attempt, question).
    async fn upsert_answer(&self, record: AnswerRecord) -> Result<(), StoreError>;

    /// The attempt's ledger, in question-recording order.
    async fn answers_for_attempt(&self, attempt_id: Uuid) -> Result<Vec<AnswerRecord>, StoreError>;

    /// Total recorded answers across all attempts.
    async fn answer_count(&self) -> Result<u64, StoreError>;

    /// Makes a user known to the store; idempotent.
    async fn ensure_user(&self, user_id: &str) -> Result<(), StoreError>;

    /// Number of known users.
    async fn user_count(&self) -> Result<u32, StoreError>;

    /// The user's streak state; default (all zero) for users with none yet.
    async fn streak(&self, user_id: &str) -> Result<StreakState, StoreError>;

    /// Replaces the user's streak state.
    async fn set_streak(&self, user_id: &str, streak: StreakState) -> Result<(), StoreError>;

    /// Number of users with `current_streak > 0`.
    async fn active_streak_count(&self) -> Result<u32, StoreError>;
}

// ---------------------------------------------------------------------------
// Clock trait
// ---------------------------------------------------------------------------

/// Source of "now" for everything the engine timestamps.
///
/// All calendar decisions (streak adjacency in particular) flow from here,
/// so day-boundary behavior is testable without waiting for midnight.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Today's calendar date, derived from `now`.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a settable instant, for tests and CLI date overrides.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Pins the clock to noon UTC on the given date.
    pub fn on_date(date: NaiveDate) -> Self {
        let noon = date.and_hms_opt(12, 0, 0).unwrap_or_default();
        Self::at(DateTime::from_naive_utc_and_offset(noon, Utc))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    /// Moves the clock forward (or back, with a negative count) whole days.
    pub fn advance_days(&self, days: i64) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::days(days);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
