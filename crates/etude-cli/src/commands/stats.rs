//! The `etude stats` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use comfy_table::{Cell, Table};

use etude_core::engine::{QuizEngine, QuizEngineConfig};
use etude_core::traits::SystemClock;
use etude_store::{MemoryStore, StoreSnapshot};

use crate::config::load_config_from;

pub async fn execute(
    user: Option<String>,
    bank: Option<PathBuf>,
    state: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let bank_path = bank.unwrap_or(config.bank_dir);
    let state_path = state.or(config.state_file);

    let quizzes = if bank_path.is_dir() {
        etude_core::bank::load_bank_directory(&bank_path)?
    } else {
        vec![etude_core::bank::parse_bank_file(&bank_path)?]
    };

    let store = match &state_path {
        Some(path) if path.exists() => {
            let snapshot = StoreSnapshot::load_json(path)?;
            Arc::new(MemoryStore::from_snapshot(snapshot))
        }
        _ => Arc::new(MemoryStore::new()),
    };

    let engine = QuizEngine::new(
        store,
        Arc::new(SystemClock),
        QuizEngineConfig {
            stats_ttl: Duration::from_secs(config.stats_ttl_secs),
            recent_limit: config.recent_limit,
        },
    );

    for quiz in quizzes {
        engine.register_quiz(quiz).await?;
    }

    let stats = engine.stats().await?;

    let mut table = Table::new();
    table.set_header(vec![
        "Users",
        "Quizzes",
        "Completed",
        "Answers",
        "Active streaks",
        "Avg score",
    ]);
    table.add_row(vec![
        Cell::new(stats.total_users),
        Cell::new(stats.total_quizzes),
        Cell::new(stats.completed_attempts),
        Cell::new(stats.questions_answered),
        Cell::new(stats.active_learners),
        Cell::new(format!("{:.1}%", stats.average_score)),
    ]);
    println!("{table}");

    if let Some(user_id) = user {
        let summary = engine.user_summary(&user_id).await?;
        println!(
            "\n{}: {} completed, average {}%, streak {} day(s) (longest {})",
            summary.user_id,
            summary.completed_attempts,
            summary.average_score,
            summary.streak.current_streak,
            summary.streak.longest_streak,
        );

        if !summary.recent.is_empty() {
            let mut recent = Table::new();
            recent.set_header(vec!["Quiz", "Score", "%", "Completed"]);
            for row in &summary.recent {
                recent.add_row(vec![
                    Cell::new(&row.quiz_title),
                    Cell::new(format!("{}/{}", row.score, row.total_questions)),
                    Cell::new(format!("{}%", row.percentage)),
                    Cell::new(row.completed_at.format("%Y-%m-%d %H:%M")),
                ]);
            }
            println!("{recent}");
        }
    }

    Ok(())
}
