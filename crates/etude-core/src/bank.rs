//! TOML quiz bank parser.
//!
//! Loads quiz definitions from TOML files and directories, and validates
//! them. Structural problems (unparsable TOML, unknown difficulty or topic,
//! a question without exactly one correct option) are hard errors; softer
//! authoring issues come back as [`ValidationWarning`]s.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{AnswerOption, Difficulty, QuestionDefinition, QuizDefinition, Topic};

/// Intermediate TOML structure for parsing bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    quiz: TomlQuizHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlQuizHeader {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    difficulty: String,
    #[serde(default = "default_category")]
    category: String,
}

fn default_category() -> String {
    "General".to_string()
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    prompt: String,
    topic: String,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    answers: Vec<TomlAnswer>,
}

#[derive(Debug, Deserialize)]
struct TomlAnswer {
    id: String,
    text: String,
    #[serde(default)]
    correct: bool,
}

/// Parse a single TOML bank file into a `QuizDefinition`.
pub fn parse_bank_file(path: &Path) -> Result<QuizDefinition> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read quiz bank file: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse a TOML string into a `QuizDefinition` (useful for testing).
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<QuizDefinition> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    bank_to_quiz(parsed).with_context(|| format!("invalid quiz bank: {}", source_path.display()))
}

fn bank_to_quiz(parsed: TomlBankFile) -> Result<QuizDefinition> {
    let difficulty: Difficulty = parsed
        .quiz
        .difficulty
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}", e))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let topic: Topic = q
                .topic
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question '{}': {}", q.id, e))?;

            let question_difficulty = q
                .difficulty
                .map(|d| {
                    d.parse::<Difficulty>()
                        .map_err(|e: String| anyhow::anyhow!("question '{}': {}", q.id, e))
                })
                .transpose()?;

            let correct = q.answers.iter().filter(|a| a.correct).count();
            if correct != 1 {
                anyhow::bail!(
                    "question '{}' must have exactly one correct answer, found {}",
                    q.id,
                    correct
                );
            }

            let answers = q
                .answers
                .into_iter()
                .map(|a| AnswerOption {
                    id: a.id,
                    text: a.text,
                    correct: a.correct,
                })
                .collect();

            Ok(QuestionDefinition {
                id: q.id,
                prompt: q.prompt,
                topic,
                difficulty: question_difficulty,
                answers,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(QuizDefinition {
        id: parsed.quiz.id,
        title: parsed.quiz.title,
        description: parsed.quiz.description,
        difficulty,
        category: parsed.quiz.category,
        questions,
    })
}

/// Recursively load all `.toml` bank files from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<QuizDefinition>> {
    let mut quizzes = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            quizzes.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_bank_file(&path) {
                Ok(quiz) => quizzes.push(quiz),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(quizzes)
}

/// A warning from quiz validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a quiz definition for common authoring issues.
pub fn validate_quiz(quiz: &QuizDefinition) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if quiz.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "quiz has no questions; every attempt will score 0%".into(),
        });
    }

    // Check for duplicate question IDs
    let mut seen_ids = std::collections::HashSet::new();
    for question in &quiz.questions {
        if !seen_ids.insert(&question.id) {
            warnings.push(ValidationWarning {
                question_id: Some(question.id.clone()),
                message: format!("duplicate question ID: {}", question.id),
            });
        }
    }

    for question in &quiz.questions {
        if question.prompt.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(question.id.clone()),
                message: "prompt is empty".into(),
            });
        }

        if question.answers.len() < 2 {
            warnings.push(ValidationWarning {
                question_id: Some(question.id.clone()),
                message: format!(
                    "only {} answer option(s); multiple choice needs at least 2",
                    question.answers.len()
                ),
            });
        }

        let mut seen_answer_ids = std::collections::HashSet::new();
        for answer in &question.answers {
            if !seen_answer_ids.insert(&answer.id) {
                warnings.push(ValidationWarning {
                    question_id: Some(question.id.clone()),
                    message: format!("duplicate answer ID: {}", answer.id),
                });
            }
        }
    }

    warnings
}
