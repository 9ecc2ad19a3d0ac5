//! Central quiz engine orchestrator.
//!
//! Ties the answer ledger, scorer, streak engine, and statistics together
//! over the `QuizStore` and `Clock` seams. All state changes flow through
//! here; the engine itself holds nothing but its collaborators.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::error::{QuizError, StoreError};
use crate::model::{AnswerRecord, Attempt, GradeResult, QuizDefinition, QuizFilter, StreakState};
use crate::scoring;
use crate::stats::{
    compute_user_summary, PlatformStats, StatsCache, UserSummary, DEFAULT_RECENT_LIMIT,
    DEFAULT_STATS_TTL,
};
use crate::streak;
use crate::traits::{Clock, QuizStore};

/// Configuration for the quiz engine.
#[derive(Debug, Clone)]
pub struct QuizEngineConfig {
    /// How long platform statistics stay cached.
    pub stats_ttl: Duration,
    /// How many rows a user summary's recent-activity list holds.
    pub recent_limit: usize,
}

impl Default for QuizEngineConfig {
    fn default() -> Self {
        Self {
            stats_ttl: DEFAULT_STATS_TTL,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

/// The central quiz engine.
pub struct QuizEngine {
    store: Arc<dyn QuizStore>,
    clock: Arc<dyn Clock>,
    stats_cache: StatsCache,
    config: QuizEngineConfig,
}

impl QuizEngine {
    pub fn new(store: Arc<dyn QuizStore>, clock: Arc<dyn Clock>, config: QuizEngineConfig) -> Self {
        let stats_cache = StatsCache::new(config.stats_ttl);
        Self {
            store,
            clock,
            stats_cache,
            config,
        }
    }

    /// Registers a quiz definition with the store.
    pub async fn register_quiz(&self, quiz: QuizDefinition) -> Result<(), QuizError> {
        self.store.insert_quiz(quiz).await?;
        Ok(())
    }

    /// Fetches a quiz by id.
    pub async fn quiz(&self, quiz_id: &str) -> Result<QuizDefinition, QuizError> {
        self.store.quiz(quiz_id).await.map_err(|e| match e {
            StoreError::NotFound { .. } => QuizError::UnknownQuiz(quiz_id.to_string()),
            other => other.into(),
        })
    }

    /// Lists catalog quizzes passing the filter.
    pub async fn quizzes(&self, filter: &QuizFilter) -> Result<Vec<QuizDefinition>, QuizError> {
        Ok(self.store.list_quizzes(filter).await?)
    }

    /// Starts a fresh in-progress attempt for `user_id` on `quiz_id`.
    pub async fn start_attempt(&self, user_id: &str, quiz_id: &str) -> Result<Attempt, QuizError> {
        let quiz = self.quiz(quiz_id).await?;
        self.store.ensure_user(user_id).await?;

        let attempt = Attempt::new(user_id, quiz.id.as_str(), self.clock.now());
        self.store.insert_attempt(attempt.clone()).await?;
        tracing::debug!(
            "started attempt {} for user '{}' on quiz '{}'",
            attempt.id,
            user_id,
            quiz.id
        );
        Ok(attempt)
    }

    /// Records one answer choice on an open attempt.
    ///
    /// A `None` answer leaves the question unanswered and is not an error;
    /// submitting with unanswered questions simply scores them as wrong.
    pub async fn submit_answer(
        &self,
        attempt_id: Uuid,
        question_id: &str,
        answer_id: Option<&str>,
    ) -> Result<(), QuizError> {
        let attempt = self.attempt(attempt_id).await?;
        if attempt.is_completed() {
            return Err(QuizError::InvalidState(attempt_id));
        }

        let quiz = self.quiz(&attempt.quiz_id).await?;
        let question =
            quiz.question(question_id)
                .ok_or_else(|| QuizError::InvalidQuestion {
                    quiz_id: quiz.id.clone(),
                    question_id: question_id.to_string(),
                })?;

        let Some(answer_id) = answer_id else {
            return Ok(());
        };
        if question.answer(answer_id).is_none() {
            return Err(QuizError::InvalidAnswer {
                question_id: question_id.to_string(),
                answer_id: answer_id.to_string(),
            });
        }

        let record = AnswerRecord {
            attempt_id,
            question_id: question_id.to_string(),
            answer_id: answer_id.to_string(),
        };
        // The store re-checks completion under its own lock, so a grade
        // racing past the check above still cannot mutate the ledger.
        self.store.upsert_answer(record).await.map_err(|e| match e {
            StoreError::AlreadyCompleted(id) => QuizError::InvalidState(id),
            other => other.into(),
        })
    }

    /// Grades an attempt: scores the ledger, marks the attempt completed,
    /// and advances the owner's daily streak.
    ///
    /// At most one call per attempt succeeds; every later or concurrent
    /// call fails with [`QuizError::AlreadyGraded`] and changes nothing.
    pub async fn submit_quiz(&self, attempt_id: Uuid) -> Result<GradeResult, QuizError> {
        let attempt = self.attempt(attempt_id).await?;
        if attempt.is_completed() {
            return Err(QuizError::AlreadyGraded(attempt_id));
        }

        let quiz = self.quiz(&attempt.quiz_id).await?;
        let ledger = self.store.answers_for_attempt(attempt_id).await?;
        let score = scoring::correct_count(&ledger, &quiz);
        let total_questions = quiz.total_questions();
        let completed_at = self.clock.now();

        // The single observable state change; concurrent graders serialize
        // here and losers surface as AlreadyGraded.
        match self
            .store
            .complete_attempt(attempt_id, score, completed_at)
            .await
        {
            Ok(_) => {}
            Err(StoreError::AlreadyCompleted(_)) => {
                return Err(QuizError::AlreadyGraded(attempt_id));
            }
            Err(e) => return Err(e.into()),
        }

        let streak = match self
            .update_streak(&attempt.user_id, completed_at.date_naive())
            .await
        {
            Ok(state) => Some(state),
            Err(e) => {
                // The attempt stays completed with a correct score; the
                // streak write is not rolled back, only reported missing.
                tracing::warn!(
                    "streak update failed for user '{}' after grading attempt {}: {e}",
                    attempt.user_id,
                    attempt_id
                );
                None
            }
        };

        tracing::info!(
            "graded attempt {} for user '{}': {}/{} on quiz '{}'",
            attempt_id,
            attempt.user_id,
            score,
            total_questions,
            quiz.id
        );

        Ok(GradeResult {
            score,
            total_questions,
            percentage: scoring::percentage(score, total_questions),
            completed_at,
            streak,
        })
    }

    /// Fetches an attempt by id.
    pub async fn attempt(&self, attempt_id: Uuid) -> Result<Attempt, QuizError> {
        self.store.attempt(attempt_id).await.map_err(|e| match e {
            StoreError::NotFound { .. } => QuizError::UnknownAttempt(attempt_id),
            other => other.into(),
        })
    }

    /// The attempt's recorded answers.
    pub async fn answers(&self, attempt_id: Uuid) -> Result<Vec<AnswerRecord>, QuizError> {
        Ok(self.store.answers_for_attempt(attempt_id).await?)
    }

    /// A user's current streak state.
    pub async fn streak(&self, user_id: &str) -> Result<StreakState, QuizError> {
        Ok(self.store.streak(user_id).await?)
    }

    /// Platform statistics, served from the TTL cache.
    pub async fn stats(&self) -> Result<PlatformStats, QuizError> {
        Ok(self
            .stats_cache
            .get_or_compute(self.store.as_ref(), self.clock.as_ref())
            .await?)
    }

    /// One user's dashboard summary, always computed fresh.
    pub async fn user_summary(&self, user_id: &str) -> Result<UserSummary, QuizError> {
        Ok(compute_user_summary(self.store.as_ref(), user_id, self.config.recent_limit).await?)
    }

    async fn update_streak(
        &self,
        user_id: &str,
        today: chrono::NaiveDate,
    ) -> Result<StreakState, StoreError> {
        let current = self.store.streak(user_id).await?;
        let advanced = streak::advance(&current, today);
        self.store.set_streak(user_id, advanced).await?;
        Ok(advanced)
    }
}
