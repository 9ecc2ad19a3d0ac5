//! JSON snapshots of store state.
//!
//! The CLI keeps its world in a single JSON file between invocations:
//! load a snapshot into a [`MemoryStore`](crate::MemoryStore), run the
//! engine, snapshot back out.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use etude_core::model::{AnswerRecord, Attempt, QuizDefinition, StreakState};

/// A serializable copy of everything a store holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub quizzes: Vec<QuizDefinition>,
    #[serde(default)]
    pub attempts: Vec<Attempt>,
    #[serde(default)]
    pub answers: Vec<AnswerRecord>,
    #[serde(default)]
    pub users: Vec<String>,
    /// Per-user streak states as (user, state) pairs.
    #[serde(default)]
    pub streaks: Vec<(String, StreakState)>,
}

impl StoreSnapshot {
    /// An empty snapshot, for starting a fresh state file.
    pub fn empty() -> Self {
        Self {
            saved_at: Utc::now(),
            quizzes: Vec::new(),
            attempts: Vec::new(),
            answers: Vec::new(),
            users: Vec::new(),
            streaks: Vec::new(),
        }
    }

    /// Save the snapshot as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize snapshot")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        debug!(
            path = %path.display(),
            attempts = self.attempts.len(),
            "saved store snapshot"
        );
        Ok(())
    }

    /// Load a snapshot from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot from {}", path.display()))?;
        let snapshot: StoreSnapshot =
            serde_json::from_str(&content).context("failed to parse snapshot JSON")?;
        debug!(
            path = %path.display(),
            attempts = snapshot.attempts.len(),
            "loaded store snapshot"
        );
        Ok(snapshot)
    }
}
