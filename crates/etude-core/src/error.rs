//! Error types for grading and persistence.
//!
//! Defined in `etude-core` so callers can classify failures without string
//! matching: every rejection the engine can produce has its own variant.

use thiserror::Error;
use uuid::Uuid;

/// Errors produced by the grading engine and answer ledger.
#[derive(Debug, Error)]
pub enum QuizError {
    /// The question does not belong to the attempt's quiz.
    #[error("question '{question_id}' is not part of quiz '{quiz_id}'")]
    InvalidQuestion { quiz_id: String, question_id: String },

    /// The answer id is not one of the question's options.
    #[error("answer '{answer_id}' is not an option of question '{question_id}'")]
    InvalidAnswer {
        question_id: String,
        answer_id: String,
    },

    /// A mutation was attempted on a completed attempt.
    #[error("attempt {0} is already completed")]
    InvalidState(Uuid),

    /// The attempt was already graded; the first grading stands.
    #[error("attempt {0} has already been graded")]
    AlreadyGraded(Uuid),

    /// No quiz with this id is registered.
    #[error("unknown quiz: {0}")]
    UnknownQuiz(String),

    /// No attempt with this id exists.
    #[error("unknown attempt: {0}")]
    UnknownAttempt(Uuid),

    /// The persistence collaborator failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QuizError {
    /// Returns `true` for rejections that leave state exactly as a prior
    /// successful call did, so callers may treat them as a duplicate rather
    /// than a failure.
    pub fn is_benign(&self) -> bool {
        matches!(self, QuizError::AlreadyGraded(_))
    }
}

/// Errors produced by `QuizStore` implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The completion compare-and-set lost: the attempt was already
    /// completed by an earlier call.
    #[error("attempt {0} was already completed")]
    AlreadyCompleted(Uuid),

    /// The backing storage failed or is unreachable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
