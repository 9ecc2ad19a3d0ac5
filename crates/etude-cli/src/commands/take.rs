//! The `etude take` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{Cell, Table};

use etude_core::engine::{QuizEngine, QuizEngineConfig};
use etude_core::model::{AnswerRecord, QuizDefinition};
use etude_core::traits::{Clock, FixedClock, SystemClock};
use etude_store::{MemoryStore, StoreSnapshot};

use crate::config::load_config_from;

pub async fn execute(
    quiz_id: String,
    user: String,
    answers: String,
    bank: Option<PathBuf>,
    state: Option<PathBuf>,
    today: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let bank_path = bank.unwrap_or(config.bank_dir);
    let state_path = state.or(config.state_file);

    let answer_key = parse_answer_key(&answers)?;

    // Load the bank
    let quizzes = if bank_path.is_dir() {
        etude_core::bank::load_bank_directory(&bank_path)?
    } else {
        vec![etude_core::bank::parse_bank_file(&bank_path)?]
    };
    tracing::debug!(
        "loaded {} quiz(es) from {}",
        quizzes.len(),
        bank_path.display()
    );

    // Restore earlier attempts and streaks when a state file is in play
    let store = match &state_path {
        Some(path) if path.exists() => {
            let snapshot = StoreSnapshot::load_json(path)?;
            Arc::new(MemoryStore::from_snapshot(snapshot))
        }
        _ => Arc::new(MemoryStore::new()),
    };

    let clock: Arc<dyn Clock> = match &today {
        Some(date_str) => {
            let date = date_str.parse::<NaiveDate>().with_context(|| {
                format!("invalid --today date: '{date_str}' (expected YYYY-MM-DD)")
            })?;
            Arc::new(FixedClock::on_date(date))
        }
        None => Arc::new(SystemClock),
    };

    let engine = QuizEngine::new(
        store.clone(),
        clock,
        QuizEngineConfig {
            stats_ttl: Duration::from_secs(config.stats_ttl_secs),
            recent_limit: config.recent_limit,
        },
    );

    for quiz in quizzes {
        engine.register_quiz(quiz).await?;
    }

    let quiz = engine.quiz(&quiz_id).await?;
    println!("Taking '{}' as {user}\n", quiz.title);

    let attempt = engine.start_attempt(&user, &quiz_id).await?;
    for (question_id, answer_id) in &answer_key {
        engine
            .submit_answer(attempt.id, question_id, Some(answer_id.as_str()))
            .await?;
    }
    let result = engine.submit_quiz(attempt.id).await?;

    print_review(&quiz, &engine.answers(attempt.id).await?);

    println!(
        "\nQuiz completed! You scored {} out of {} ({}%)",
        result.score, result.total_questions, result.percentage
    );
    match result.streak {
        Some(s) => println!(
            "Current streak: {} day(s) (longest: {})",
            s.current_streak, s.longest_streak
        ),
        None => println!("Streak update unavailable; your score is saved."),
    }

    if let Some(path) = &state_path {
        store.snapshot().save_json(path)?;
        println!("Progress saved to {}", path.display());
    }

    Ok(())
}

/// Parses an answer key like "q1=a,q2=c" into (question, answer) pairs.
fn parse_answer_key(answers: &str) -> Result<Vec<(String, String)>> {
    let mut key = Vec::new();
    for part in answers.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let Some((question, answer)) = part.split_once('=') else {
            anyhow::bail!("invalid answer entry: '{part}' (expected question=answer)");
        };
        let question = question.trim();
        let answer = answer.trim();
        anyhow::ensure!(
            !question.is_empty() && !answer.is_empty(),
            "invalid answer entry: '{part}' (expected question=answer)"
        );
        key.push((question.to_string(), answer.to_string()));
    }
    Ok(key)
}

fn print_review(quiz: &QuizDefinition, ledger: &[AnswerRecord]) {
    let mut table = Table::new();
    table.set_header(vec!["Question", "Your answer", "Correct answer", "Result"]);

    for question in &quiz.questions {
        let picked = ledger
            .iter()
            .find(|r| r.question_id == question.id)
            .and_then(|r| question.answer(&r.answer_id));
        let correct = question.correct_answer();
        let verdict = match (picked, correct) {
            (Some(p), Some(c)) if p.id == c.id => "OK",
            (None, _) => "SKIPPED",
            _ => "WRONG",
        };
        table.add_row(vec![
            Cell::new(&question.prompt),
            Cell::new(picked.map(|a| a.text.as_str()).unwrap_or("-")),
            Cell::new(correct.map(|a| a.text.as_str()).unwrap_or("-")),
            Cell::new(verdict),
        ]);
    }

    println!("{table}");
}
