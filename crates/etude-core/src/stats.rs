//! Platform-wide and per-user rollups over completed attempts.
//!
//! Rollups are recomputed from the store on demand; the platform-wide set
//! sits behind [`StatsCache`] so hot paths reread at most once per TTL.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::model::StreakState;
use crate::scoring;
use crate::traits::{Clock, QuizStore};

/// How long a computed [`PlatformStats`] stays fresh.
pub const DEFAULT_STATS_TTL: Duration = Duration::from_secs(5 * 60);

/// How many recent attempts a [`UserSummary`] lists.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Site-wide counters shown on the landing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformStats {
    /// Users known to the store.
    pub total_users: u32,
    /// Registered quiz definitions.
    pub total_quizzes: u32,
    /// Attempts that have been graded.
    pub completed_attempts: u32,
    /// Answer records across all attempts.
    pub questions_answered: u64,
    /// Users whose current streak is above zero.
    pub active_learners: u32,
    /// Mean per-attempt percentage over completed attempts, rounded to one
    /// decimal place; 0.0 when nothing has been completed.
    pub average_score: f64,
}

/// Computes [`PlatformStats`] fresh from the store.
///
/// Per-attempt percentages use the attempt's quiz as it exists now;
/// attempts whose quiz has been removed are left out of the average.
pub async fn compute_platform_stats(store: &dyn QuizStore) -> Result<PlatformStats, StoreError> {
    let total_users = store.user_count().await?;
    let total_quizzes = store.quiz_count().await?;
    let questions_answered = store.answer_count().await?;
    let active_learners = store.active_streak_count().await?;
    let completed = store.completed_attempts().await?;

    let mut quiz_totals: HashMap<String, u32> = HashMap::new();
    let mut sum = 0.0_f64;
    let mut counted = 0_u32;
    for attempt in &completed {
        let Some(score) = attempt.score else { continue };
        let total = match quiz_totals.get(&attempt.quiz_id) {
            Some(total) => *total,
            None => match store.quiz(&attempt.quiz_id).await {
                Ok(quiz) => {
                    let total = quiz.total_questions();
                    quiz_totals.insert(attempt.quiz_id.clone(), total);
                    total
                }
                Err(StoreError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            },
        };
        sum += scoring::percentage(score, total) as f64;
        counted += 1;
    }

    let average_score = if counted == 0 {
        0.0
    } else {
        round_to_tenth(sum / counted as f64)
    };

    Ok(PlatformStats {
        total_users,
        total_quizzes,
        completed_attempts: completed.len() as u32,
        questions_answered,
        active_learners,
        average_score,
    })
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
// TTL cache
// ---------------------------------------------------------------------------

struct CachedStats {
    computed_at: DateTime<Utc>,
    stats: PlatformStats,
}

/// TTL cache around [`compute_platform_stats`].
///
/// The lock is held across recomputation, so concurrent readers of an
/// expired entry compute once and share the result. Freshness is judged
/// against the injected clock, never the wall clock.
pub struct StatsCache {
    ttl: Duration,
    cached: Mutex<Option<CachedStats>>,
}

impl StatsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            cached: Mutex::new(None),
        }
    }

    /// Returns the cached stats if still fresh, otherwise recomputes.
    pub async fn get_or_compute(
        &self,
        store: &dyn QuizStore,
        clock: &dyn Clock,
    ) -> Result<PlatformStats, StoreError> {
        let mut slot = self.cached.lock().await;
        let now = clock.now();
        if let Some(cached) = slot.as_ref() {
            // A clock that moved backwards reads as stale.
            let fresh = now
                .signed_duration_since(cached.computed_at)
                .to_std()
                .map(|age| age < self.ttl)
                .unwrap_or(false);
            if fresh {
                return Ok(cached.stats.clone());
            }
        }
        let stats = compute_platform_stats(store).await?;
        *slot = Some(CachedStats {
            computed_at: now,
            stats: stats.clone(),
        });
        Ok(stats)
    }

    /// Drops the cached entry; the next read recomputes.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}

impl Default for StatsCache {
    fn default() -> Self {
        Self::new(DEFAULT_STATS_TTL)
    }
}

// ---------------------------------------------------------------------------
// Per-user summary
// ---------------------------------------------------------------------------

/// One user's dashboard rollup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: String,
    /// Graded attempts by this user.
    pub completed_attempts: u32,
    /// Mean percentage over their completed attempts, rounded to a whole
    /// number; 0 when they have completed nothing.
    pub average_score: u32,
    pub streak: StreakState,
    /// Newest completed attempts first, capped at the configured limit.
    pub recent: Vec<RecentAttempt>,
}

/// One row of the dashboard's recent-activity list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentAttempt {
    pub quiz_id: String,
    pub quiz_title: String,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub completed_at: DateTime<Utc>,
}

/// Computes one user's [`UserSummary`] fresh from the store.
pub async fn compute_user_summary(
    store: &dyn QuizStore,
    user_id: &str,
    recent_limit: usize,
) -> Result<UserSummary, StoreError> {
    let attempts = store.attempts_for_user(user_id).await?;
    let streak = store.streak(user_id).await?;

    let mut sum = 0.0_f64;
    let mut counted = 0_u32;
    let mut recent = Vec::new();
    for attempt in attempts.iter().filter(|a| a.is_completed()) {
        let Some(score) = attempt.score else { continue };
        let quiz = match store.quiz(&attempt.quiz_id).await {
            Ok(quiz) => quiz,
            Err(StoreError::NotFound { .. }) => continue,
            Err(e) => return Err(e),
        };
        let total = quiz.total_questions();
        let percentage = scoring::percentage(score, total);
        sum += percentage as f64;
        counted += 1;
        if recent.len() < recent_limit {
            recent.push(RecentAttempt {
                quiz_id: attempt.quiz_id.clone(),
                quiz_title: quiz.title,
                score,
                total_questions: total,
                percentage,
                completed_at: attempt.completed_at.unwrap_or(attempt.started_at),
            });
        }
    }

    let average_score = if counted == 0 {
        0
    } else {
        (sum / counted as f64).round() as u32
    };

    Ok(UserSummary {
        user_id: user_id.to_string(),
        completed_attempts: counted,
        average_score,
        streak,
        recent,
    })
}
