//! Failure-injecting store wrapper for testing.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use etude_core::error::StoreError;
use etude_core::model::{AnswerRecord, Attempt, QuizDefinition, QuizFilter, StreakState};
use etude_core::traits::QuizStore;

/// A store wrapper that can be told to fail streak writes, for exercising
/// the engine's partial-failure path without a real broken backend.
///
/// Everything else delegates straight to the wrapped store.
pub struct FlakyStore {
    inner: Arc<dyn QuizStore>,
    fail_streak_writes: AtomicBool,
    /// Number of `set_streak` calls seen, failed ones included.
    streak_writes: AtomicU32,
    /// Last streak write that was allowed through.
    last_streak_write: Mutex<Option<(String, StreakState)>>,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn QuizStore>) -> Self {
        Self {
            inner,
            fail_streak_writes: AtomicBool::new(false),
            streak_writes: AtomicU32::new(0),
            last_streak_write: Mutex::new(None),
        }
    }

    /// When set, every `set_streak` fails with [`StoreError::Unavailable`].
    pub fn fail_streak_writes(&self, fail: bool) {
        self.fail_streak_writes.store(fail, Ordering::Relaxed);
    }

    /// How many `set_streak` calls have been made.
    pub fn streak_write_attempts(&self) -> u32 {
        self.streak_writes.load(Ordering::Relaxed)
    }

    /// The last streak write that succeeded, if any.
    pub fn last_streak_write(&self) -> Option<(String, StreakState)> {
        self.last_streak_write.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuizStore for FlakyStore {
    async fn insert_quiz(&self, quiz: QuizDefinition) -> Result<(), StoreError> {
        self.inner.insert_quiz(quiz).await
    }

    async fn quiz(&self, quiz_id: &str) -> Result<QuizDefinition, StoreError> {
        self.inner.quiz(quiz_id).await
    }

    async fn list_quizzes(&self, filter: &QuizFilter) -> Result<Vec<QuizDefinition>, StoreError> {
        self.inner.list_quizzes(filter).await
    }

    async fn quiz_count(&self) -> Result<u32, StoreError> {
        self.inner.quiz_count().await
    }

    async fn insert_attempt(&self, attempt: Attempt) -> Result<(), StoreError> {
        self.inner.insert_attempt(attempt).await
    }

    async fn attempt(&self, attempt_id: Uuid) -> Result<Attempt, StoreError> {
        self.inner.attempt(attempt_id).await
    }

    async fn complete_attempt(
        &self,
        attempt_id: Uuid,
        score: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<Attempt, StoreError> {
        self.inner.complete_attempt(attempt_id, score, completed_at).await
    }

    async fn completed_attempts(&self) -> Result<Vec<Attempt>, StoreError> {
        self.inner.completed_attempts().await
    }

    async fn attempts_for_user(&self, user_id: &str) -> Result<Vec<Attempt>, StoreError> {
        self.inner.attempts_for_user(user_id).await
    }

    async fn upsert_answer(&self, record: AnswerRecord) -> Result<(), StoreError> {
        self.inner.upsert_answer(record).await
    }

    async fn answers_for_attempt(&self, attempt_id: Uuid) -> Result<Vec<AnswerRecord>, StoreError> {
        self.inner.answers_for_attempt(attempt_id).await
    }

    async fn answer_count(&self) -> Result<u64, StoreError> {
        self.inner.answer_count().await
    }

    async fn ensure_user(&self, user_id: &str) -> Result<(), StoreError> {
        self.inner.ensure_user(user_id).await
    }

    async fn user_count(&self) -> Result<u32, StoreError> {
        self.inner.user_count().await
    }

    async fn streak(&self, user_id: &str) -> Result<StreakState, StoreError> {
        self.inner.streak(user_id).await
    }

    async fn set_streak(&self, user_id: &str, streak: StreakState) -> Result<(), StoreError> {
        self.streak_writes.fetch_add(1, Ordering::Relaxed);
        if self.fail_streak_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable(
                "injected streak write failure".into(),
            ));
        }
        self.inner.set_streak(user_id, streak).await?;
        *self.last_streak_write.lock().unwrap() = Some((user_id.to_string(), streak));
        Ok(())
    }

    async fn active_streak_count(&self) -> Result<u32, StoreError> {
        self.inner.active_streak_count().await
    }
}
