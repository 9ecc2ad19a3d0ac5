//! In-memory quiz store.
//!
//! The reference `QuizStore` implementation: all state behind one mutex,
//! with the completion transition done as a compare-and-set under that
//! lock. Suitable for the CLI, tests, and as the model for what a
//! database-backed store must guarantee.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use etude_core::error::StoreError;
use etude_core::model::{AnswerRecord, Attempt, QuizDefinition, QuizFilter, StreakState};
use etude_core::traits::QuizStore;

use crate::snapshot::StoreSnapshot;

#[derive(Debug, Default)]
struct StoreState {
    quizzes: Vec<QuizDefinition>,
    attempts: Vec<Attempt>,
    answers: Vec<AnswerRecord>,
    users: Vec<String>,
    streaks: Vec<(String, StreakState)>,
}

impl StoreState {
    fn attempt(&self, attempt_id: Uuid) -> Option<&Attempt> {
        self.attempts.iter().find(|a| a.id == attempt_id)
    }

    fn attempt_mut(&mut self, attempt_id: Uuid) -> Option<&mut Attempt> {
        self.attempts.iter_mut().find(|a| a.id == attempt_id)
    }
}

/// An in-memory [`QuizStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with the given quiz definitions.
    pub fn with_quizzes(quizzes: Vec<QuizDefinition>) -> Self {
        Self {
            state: Mutex::new(StoreState {
                quizzes,
                ..StoreState::default()
            }),
        }
    }

    /// Copies the full store contents into a serializable snapshot.
    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.lock().unwrap();
        StoreSnapshot {
            saved_at: Utc::now(),
            quizzes: state.quizzes.clone(),
            attempts: state.attempts.clone(),
            answers: state.answers.clone(),
            users: state.users.clone(),
            streaks: state.streaks.clone(),
        }
    }

    /// Rebuilds a store from a snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            state: Mutex::new(StoreState {
                quizzes: snapshot.quizzes,
                attempts: snapshot.attempts,
                answers: snapshot.answers,
                users: snapshot.users,
                streaks: snapshot.streaks,
            }),
        }
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn insert_quiz(&self, quiz: QuizDefinition) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.quizzes.iter_mut().find(|q| q.id == quiz.id) {
            *existing = quiz;
        } else {
            state.quizzes.push(quiz);
        }
        Ok(())
    }

    async fn quiz(&self, quiz_id: &str) -> Result<QuizDefinition, StoreError> {
        let state = self.state.lock().unwrap();
        state
            .quizzes
            .iter()
            .find(|q| q.id == quiz_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("quiz", quiz_id))
    }

    async fn list_quizzes(&self, filter: &QuizFilter) -> Result<Vec<QuizDefinition>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .quizzes
            .iter()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect())
    }

    async fn quiz_count(&self) -> Result<u32, StoreError> {
        Ok(self.state.lock().unwrap().quizzes.len() as u32)
    }

    async fn insert_attempt(&self, attempt: Attempt) -> Result<(), StoreError> {
        self.state.lock().unwrap().attempts.push(attempt);
        Ok(())
    }

    async fn attempt(&self, attempt_id: Uuid) -> Result<Attempt, StoreError> {
        let state = self.state.lock().unwrap();
        state
            .attempt(attempt_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("attempt", attempt_id))
    }

    async fn complete_attempt(
        &self,
        attempt_id: Uuid,
        score: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<Attempt, StoreError> {
        let mut state = self.state.lock().unwrap();
        let attempt = state
            .attempt_mut(attempt_id)
            .ok_or_else(|| StoreError::not_found("attempt", attempt_id))?;
        // Compare-and-set: only an open attempt can transition, and score
        // and completed_at land together.
        if attempt.completed_at.is_some() {
            return Err(StoreError::AlreadyCompleted(attempt_id));
        }
        attempt.score = Some(score);
        attempt.completed_at = Some(completed_at);
        Ok(attempt.clone())
    }

    async fn completed_attempts(&self) -> Result<Vec<Attempt>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .attempts
            .iter()
            .filter(|a| a.is_completed())
            .cloned()
            .collect())
    }

    async fn attempts_for_user(&self, user_id: &str) -> Result<Vec<Attempt>, StoreError> {
        let state = self.state.lock().unwrap();
        // Reverse insertion order first so the stable sort breaks
        // same-instant ties toward the most recently inserted.
        let mut attempts: Vec<Attempt> = state
            .attempts
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(attempts)
    }

    async fn upsert_answer(&self, record: AnswerRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        let attempt = state
            .attempt(record.attempt_id)
            .ok_or_else(|| StoreError::not_found("attempt", record.attempt_id))?;
        // The ledger freezes at completion.
        if attempt.is_completed() {
            return Err(StoreError::AlreadyCompleted(record.attempt_id));
        }
        if let Some(existing) = state.answers.iter_mut().find(|r| {
            r.attempt_id == record.attempt_id && r.question_id == record.question_id
        }) {
            *existing = record;
        } else {
            state.answers.push(record);
        }
        Ok(())
    }

    async fn answers_for_attempt(&self, attempt_id: Uuid) -> Result<Vec<AnswerRecord>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .answers
            .iter()
            .filter(|r| r.attempt_id == attempt_id)
            .cloned()
            .collect())
    }

    async fn answer_count(&self) -> Result<u64, StoreError> {
        Ok(self.state.lock().unwrap().answers.len() as u64)
    }

    async fn ensure_user(&self, user_id: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if !state.users.iter().any(|u| u == user_id) {
            state.users.push(user_id.to_string());
        }
        Ok(())
    }

    async fn user_count(&self) -> Result<u32, StoreError> {
        Ok(self.state.lock().unwrap().users.len() as u32)
    }

    async fn streak(&self, user_id: &str) -> Result<StreakState, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .streaks
            .iter()
            .find(|(u, _)| u == user_id)
            .map(|(_, s)| *s)
            .unwrap_or_default())
    }

    async fn set_streak(&self, user_id: &str, streak: StreakState) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some((_, existing)) = state.streaks.iter_mut().find(|(u, _)| u == user_id) {
            *existing = streak;
        } else {
            state.streaks.push((user_id.to_string(), streak));
        }
        Ok(())
    }

    async fn active_streak_count(&self) -> Result<u32, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .streaks
            .iter()
            .filter(|(_, s)| s.current_streak > 0)
            .count() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etude_core::model::Difficulty;
    use std::sync::Arc;

    fn quiz(id: &str) -> QuizDefinition {
        QuizDefinition {
            id: id.into(),
            title: id.into(),
            description: String::new(),
            difficulty: Difficulty::Easy,
            category: "Theory".into(),
            questions: vec![],
        }
    }

    fn record(attempt_id: Uuid, question_id: &str, answer_id: &str) -> AnswerRecord {
        AnswerRecord {
            attempt_id,
            question_id: question_id.into(),
            answer_id: answer_id.into(),
        }
    }

    #[tokio::test]
    async fn quiz_insert_replace_and_lookup() {
        let store = MemoryStore::new();
        store.insert_quiz(quiz("intervals")).await.unwrap();
        store.insert_quiz(quiz("chords")).await.unwrap();
        assert_eq!(store.quiz_count().await.unwrap(), 2);

        let mut updated = quiz("intervals");
        updated.title = "Intervals, revised".into();
        store.insert_quiz(updated).await.unwrap();
        assert_eq!(store.quiz_count().await.unwrap(), 2);
        assert_eq!(
            store.quiz("intervals").await.unwrap().title,
            "Intervals, revised"
        );

        assert!(matches!(
            store.quiz("missing").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn complete_attempt_is_at_most_once() {
        let store = MemoryStore::new();
        let attempt = Attempt::new("ada", "intervals", Utc::now());
        let id = attempt.id;
        store.insert_attempt(attempt).await.unwrap();

        let graded = store.complete_attempt(id, 5, Utc::now()).await.unwrap();
        assert_eq!(graded.score, Some(5));
        assert!(graded.is_completed());

        let second = store.complete_attempt(id, 7, Utc::now()).await;
        assert!(matches!(second, Err(StoreError::AlreadyCompleted(_))));

        // The first write stands.
        assert_eq!(store.attempt(id).await.unwrap().score, Some(5));
    }

    #[tokio::test]
    async fn concurrent_completion_has_one_winner() {
        let store = Arc::new(MemoryStore::new());
        let attempt = Attempt::new("ada", "intervals", Utc::now());
        let id = attempt.id;
        store.insert_attempt(attempt).await.unwrap();

        let mut handles = Vec::new();
        for score in 0..8u32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.complete_attempt(id, score, Utc::now()).await
            }));
        }

        let mut winners = 0;
        let mut losers = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(StoreError::AlreadyCompleted(_)) => losers += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(losers, 7);
    }

    #[tokio::test]
    async fn upsert_answer_overwrites_per_question() {
        let store = MemoryStore::new();
        let attempt = Attempt::new("ada", "intervals", Utc::now());
        let id = attempt.id;
        store.insert_attempt(attempt).await.unwrap();

        store.upsert_answer(record(id, "q1", "a")).await.unwrap();
        store.upsert_answer(record(id, "q2", "b")).await.unwrap();
        store.upsert_answer(record(id, "q1", "c")).await.unwrap();

        let ledger = store.answers_for_attempt(id).await.unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0].question_id, "q1");
        assert_eq!(ledger[0].answer_id, "c");
        assert_eq!(store.answer_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn upsert_answer_rejected_after_completion() {
        let store = MemoryStore::new();
        let attempt = Attempt::new("ada", "intervals", Utc::now());
        let id = attempt.id;
        store.insert_attempt(attempt).await.unwrap();
        store.complete_attempt(id, 0, Utc::now()).await.unwrap();

        let result = store.upsert_answer(record(id, "q1", "a")).await;
        assert!(matches!(result, Err(StoreError::AlreadyCompleted(_))));
        assert_eq!(store.answer_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn attempts_for_user_newest_first() {
        let store = MemoryStore::new();
        let t0 = Utc::now();
        let older = Attempt::new("ada", "intervals", t0 - chrono::Duration::hours(2));
        let newer = Attempt::new("ada", "chords", t0);
        let other = Attempt::new("grace", "chords", t0);
        store.insert_attempt(older.clone()).await.unwrap();
        store.insert_attempt(newer.clone()).await.unwrap();
        store.insert_attempt(other).await.unwrap();

        let attempts = store.attempts_for_user("ada").await.unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].id, newer.id);
        assert_eq!(attempts[1].id, older.id);
    }

    #[tokio::test]
    async fn streaks_default_and_update() {
        let store = MemoryStore::new();
        assert_eq!(store.streak("ada").await.unwrap(), StreakState::default());

        let state = StreakState {
            current_streak: 3,
            longest_streak: 5,
            last_active_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 15),
        };
        store.set_streak("ada", state).await.unwrap();
        store.set_streak("grace", StreakState::default()).await.unwrap();

        assert_eq!(store.streak("ada").await.unwrap(), state);
        assert_eq!(store.active_streak_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn ensure_user_is_idempotent() {
        let store = MemoryStore::new();
        store.ensure_user("ada").await.unwrap();
        store.ensure_user("ada").await.unwrap();
        store.ensure_user("grace").await.unwrap();
        assert_eq!(store.user_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn snapshot_roundtrip_preserves_state() {
        let store = MemoryStore::new();
        store.insert_quiz(quiz("intervals")).await.unwrap();
        let attempt = Attempt::new("ada", "intervals", Utc::now());
        let id = attempt.id;
        store.insert_attempt(attempt).await.unwrap();
        store.upsert_answer(record(id, "q1", "a")).await.unwrap();
        store.ensure_user("ada").await.unwrap();
        store
            .set_streak(
                "ada",
                StreakState {
                    current_streak: 2,
                    longest_streak: 4,
                    last_active_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 15),
                },
            )
            .await
            .unwrap();

        let restored = MemoryStore::from_snapshot(store.snapshot());
        assert_eq!(restored.quiz_count().await.unwrap(), 1);
        assert_eq!(restored.user_count().await.unwrap(), 1);
        assert_eq!(restored.attempt(id).await.unwrap().user_id, "ada");
        assert_eq!(restored.answers_for_attempt(id).await.unwrap().len(), 1);
        assert_eq!(restored.streak("ada").await.unwrap().longest_streak, 4);
    }
}
