//! The `etude list` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use etude_core::model::{Difficulty, QuizFilter};

use crate::config::load_config_from;

pub fn execute(
    bank: Option<PathBuf>,
    difficulty: Option<String>,
    category: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let bank_path = bank.unwrap_or(config.bank_dir);

    let quizzes = if bank_path.is_dir() {
        etude_core::bank::load_bank_directory(&bank_path)?
    } else {
        vec![etude_core::bank::parse_bank_file(&bank_path)?]
    };

    let filter = QuizFilter {
        difficulty: difficulty
            .map(|d| d.parse::<Difficulty>().map_err(|e| anyhow::anyhow!(e)))
            .transpose()?,
        category,
    };

    let mut table = Table::new();
    table.set_header(vec!["Id", "Title", "Difficulty", "Category", "Questions"]);

    let mut shown = 0;
    for quiz in quizzes.iter().filter(|q| filter.matches(q)) {
        table.add_row(vec![
            Cell::new(&quiz.id),
            Cell::new(&quiz.title),
            Cell::new(quiz.difficulty),
            Cell::new(&quiz.category),
            Cell::new(quiz.total_questions()),
        ]);
        shown += 1;
    }

    if shown == 0 {
        println!("No quizzes match. Run `etude init` to create an example bank.");
    } else {
        println!("{table}");
    }

    Ok(())
}
