//! Scoring arithmetic for graded attempts.
//!
//! Pure functions from an answer ledger plus a quiz definition to a raw
//! score, and from a raw score to a whole-number percentage.

use crate::model::{AnswerRecord, QuizDefinition};

/// Number of ledger entries whose chosen option is the question's correct one.
///
/// Entries that no longer resolve against the quiz (a question or option id
/// that has since disappeared) count as incorrect rather than erroring; the
/// denominator always comes from the quiz definition itself.
pub fn correct_count(ledger: &[AnswerRecord], quiz: &QuizDefinition) -> u32 {
    ledger
        .iter()
        .filter(|record| {
            quiz.question(&record.question_id)
                .and_then(|q| q.answer(&record.answer_id))
                .map(|a| a.correct)
                .unwrap_or(false)
        })
        .count() as u32
}

/// `correct / total` as a whole percentage, rounded half away from zero.
///
/// Returns 0 when `total` is zero.
pub fn percentage(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as u32
}
