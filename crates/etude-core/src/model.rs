//! Core data model types for etude.
//!
//! These are the fundamental types the whole system uses to represent
//! quizzes, questions, attempts, recorded answers, and streak state.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A quiz as authored: metadata plus an ordered list of questions.
///
/// Definitions are immutable once attempts reference them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizDefinition {
    /// Unique identifier for this quiz.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Description shown in the catalog.
    #[serde(default)]
    pub description: String,
    /// Overall difficulty of the quiz.
    pub difficulty: Difficulty,
    /// Catalog category (e.g. "Fundamentals", "Theory").
    #[serde(default = "default_category")]
    pub category: String,
    /// The questions, in presentation order.
    #[serde(default)]
    pub questions: Vec<QuestionDefinition>,
}

fn default_category() -> String {
    "General".to_string()
}

impl QuizDefinition {
    /// Number of questions, used as the grading denominator.
    pub fn total_questions(&self) -> u32 {
        self.questions.len() as u32
    }

    /// Looks up a question by id.
    pub fn question(&self, question_id: &str) -> Option<&QuestionDefinition> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

/// A single multiple-choice question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDefinition {
    /// Unique identifier within the quiz.
    pub id: String,
    /// The question text.
    pub prompt: String,
    /// Music-theory topic this question exercises.
    pub topic: Topic,
    /// Per-question difficulty; falls back to the quiz's when absent.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// The answer options; exactly one is marked correct.
    #[serde(default)]
    pub answers: Vec<AnswerOption>,
}

impl QuestionDefinition {
    /// Looks up an answer option by id.
    pub fn answer(&self, answer_id: &str) -> Option<&AnswerOption> {
        self.answers.iter().find(|a| a.id == answer_id)
    }

    /// The single option marked correct, if the question has one.
    pub fn correct_answer(&self) -> Option<&AnswerOption> {
        self.answers.iter().find(|a| a.correct)
    }
}

/// One selectable answer option.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    /// Unique identifier within the question.
    pub id: String,
    /// The option text.
    pub text: String,
    /// Whether choosing this option scores the question as correct.
    #[serde(default)]
    pub correct: bool,
}

/// Quiz difficulty levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// The fixed vocabulary of music-theory topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Intervals,
    Chords,
    Scales,
    KeySignatures,
    Notes,
    Rhythm,
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Intervals => write!(f, "intervals"),
            Topic::Chords => write!(f, "chords"),
            Topic::Scales => write!(f, "scales"),
            Topic::KeySignatures => write!(f, "key_signatures"),
            Topic::Notes => write!(f, "notes"),
            Topic::Rhythm => write!(f, "rhythm"),
        }
    }
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "intervals" => Ok(Topic::Intervals),
            "chords" => Ok(Topic::Chords),
            "scales" => Ok(Topic::Scales),
            "key_signatures" | "key signatures" => Ok(Topic::KeySignatures),
            "notes" => Ok(Topic::Notes),
            "rhythm" => Ok(Topic::Rhythm),
            other => Err(format!("unknown topic: {other}")),
        }
    }
}

/// One user's single pass through a quiz.
///
/// Lifecycle: created in progress (`score` and `completed_at` both `None`),
/// transitions exactly once to completed (both `Some`), never back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    /// Opaque unique identifier.
    pub id: Uuid,
    /// Owner of the attempt.
    pub user_id: String,
    /// The quiz being attempted.
    pub quiz_id: String,
    /// When the attempt was created.
    pub started_at: DateTime<Utc>,
    /// Raw correct-answer count, set at grading.
    pub score: Option<u32>,
    /// When the attempt was graded, set at grading.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Attempt {
    /// Creates a fresh in-progress attempt with a random id.
    pub fn new(
        user_id: impl Into<String>,
        quiz_id: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            quiz_id: quiz_id.into(),
            started_at,
            score: None,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Score as a whole-number percentage of `total_questions`.
    ///
    /// Returns 0 while ungraded and when the denominator is zero.
    pub fn percentage(&self, total_questions: u32) -> u32 {
        match self.score {
            Some(score) => crate::scoring::percentage(score, total_questions),
            None => 0,
        }
    }
}

/// One recorded answer choice: which option the user picked for a question.
///
/// At most one record exists per (attempt, question); re-answering an open
/// attempt overwrites the earlier choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub attempt_id: Uuid,
    pub question_id: String,
    pub answer_id: String,
}

/// Per-user daily engagement streak.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    /// Consecutive calendar days with at least one completed attempt.
    pub current_streak: u32,
    /// Highest value `current_streak` has ever reached.
    pub longest_streak: u32,
    /// Most recent day counted toward the streak.
    pub last_active_date: Option<NaiveDate>,
}

/// What a successful grading call returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeResult {
    /// Raw correct-answer count.
    pub score: u32,
    /// Denominator: question count of the quiz at grading time.
    pub total_questions: u32,
    /// `score / total_questions` as a rounded whole percentage.
    pub percentage: u32,
    /// Grading timestamp recorded on the attempt.
    pub completed_at: DateTime<Utc>,
    /// Updated streak state, or `None` if the streak write failed.
    pub streak: Option<StreakState>,
}

/// Catalog filter for listing quizzes.
#[derive(Debug, Clone, Default)]
pub struct QuizFilter {
    pub difficulty: Option<Difficulty>,
    pub category: Option<String>,
}

impl QuizFilter {
    /// True when `quiz` passes every set filter field.
    pub fn matches(&self, quiz: &QuizDefinition) -> bool {
        if let Some(difficulty) = self.difficulty {
            if quiz.difficulty != difficulty {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !quiz.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        true
    }
}
