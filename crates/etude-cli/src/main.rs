//! etude CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "etude", version, about = "Music theory quiz engine with streak tracking")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a quiz and get it graded
    Take {
        /// Quiz to take (id from the bank)
        #[arg(long)]
        quiz: String,

        /// User taking the quiz
        #[arg(long, default_value = "student")]
        user: String,

        /// Answer key, e.g. "q1=a,q2=c" (unanswered questions count as wrong)
        #[arg(long)]
        answers: String,

        /// Path to .toml quiz bank file or directory
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Snapshot file holding attempts and streaks between runs
        #[arg(long)]
        state: Option<PathBuf>,

        /// Override today's date (YYYY-MM-DD) for streak bookkeeping
        #[arg(long)]
        today: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List quizzes in the bank
    List {
        /// Path to .toml quiz bank file or directory
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Filter by difficulty: easy, medium, hard
        #[arg(long)]
        difficulty: Option<String>,

        /// Filter by category
        #[arg(long)]
        category: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate quiz bank TOML files
    Validate {
        /// Path to quiz bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Show platform statistics and per-user summaries
    Stats {
        /// Also show a summary for this user
        #[arg(long)]
        user: Option<String>,

        /// Path to .toml quiz bank file or directory
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Snapshot file holding attempts and streaks between runs
        #[arg(long)]
        state: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example quiz bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("etude=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Take {
            quiz,
            user,
            answers,
            bank,
            state,
            today,
            config,
        } => commands::take::execute(quiz, user, answers, bank, state, today, config).await,
        Commands::List {
            bank,
            difficulty,
            category,
            config,
        } => commands::list::execute(bank, difficulty, category, config),
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Stats {
            user,
            bank,
            state,
            config,
        } => commands::stats::execute(user, bank, state, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
