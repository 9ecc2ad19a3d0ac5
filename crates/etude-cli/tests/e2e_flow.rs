//! End-to-end grading flow tests against the in-memory store.
//!
//! These exercise the full path (start attempt, answer, grade, streak,
//! stats) with a pinned clock, including the double-grading races the
//! engine must win exactly once.

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use etude_core::engine::{QuizEngine, QuizEngineConfig};
use etude_core::error::QuizError;
use etude_core::model::{AnswerOption, Difficulty, QuestionDefinition, QuizDefinition, Topic};
use etude_core::traits::FixedClock;
use etude_store::{FlakyStore, MemoryStore};

fn make_question(id: &str, correct_id: &str) -> QuestionDefinition {
    QuestionDefinition {
        id: id.into(),
        prompt: format!("Question {id}"),
        topic: Topic::Intervals,
        difficulty: None,
        answers: ["a", "b", "c"]
            .iter()
            .map(|option| AnswerOption {
                id: (*option).into(),
                text: format!("Option {option}"),
                correct: *option == correct_id,
            })
            .collect(),
    }
}

/// A quiz whose every question has "b" as the correct option.
fn make_quiz(id: &str, questions: usize) -> QuizDefinition {
    QuizDefinition {
        id: id.into(),
        title: format!("Quiz {id}"),
        description: String::new(),
        difficulty: Difficulty::Medium,
        category: "Theory".into(),
        questions: (1..=questions)
            .map(|n| make_question(&format!("q{n}"), "b"))
            .collect(),
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn make_engine(
    quizzes: Vec<QuizDefinition>,
    today: NaiveDate,
) -> (QuizEngine, Arc<MemoryStore>, Arc<FixedClock>) {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::on_date(today));
    let engine = QuizEngine::new(store.clone(), clock.clone(), QuizEngineConfig::default());
    for quiz in quizzes {
        engine.register_quiz(quiz).await.unwrap();
    }
    (engine, store, clock)
}

// --- Grading flow ---

#[tokio::test]
async fn full_flow_grades_and_starts_streak() {
    let (engine, _store, _clock) =
        make_engine(vec![make_quiz("intervals", 3)], date(2025, 3, 10)).await;

    let attempt = engine.start_attempt("ada", "intervals").await.unwrap();
    assert!(attempt.score.is_none() && attempt.completed_at.is_none());

    engine
        .submit_answer(attempt.id, "q1", Some("b"))
        .await
        .unwrap();
    engine
        .submit_answer(attempt.id, "q2", Some("a"))
        .await
        .unwrap();
    // q3 left unanswered

    let result = engine.submit_quiz(attempt.id).await.unwrap();
    assert_eq!(result.score, 1);
    assert_eq!(result.total_questions, 3);
    assert_eq!(result.percentage, 33);

    let streak = result.streak.expect("streak should update");
    assert_eq!(streak.current_streak, 1);
    assert_eq!(streak.longest_streak, 1);
    assert_eq!(streak.last_active_date, Some(date(2025, 3, 10)));

    let stored = engine.attempt(attempt.id).await.unwrap();
    assert!(stored.is_completed());
    assert_eq!(stored.score, Some(1));
    assert_eq!(stored.completed_at, Some(result.completed_at));
}

#[tokio::test]
async fn reanswering_overwrites_before_grading() {
    let (engine, _store, _clock) =
        make_engine(vec![make_quiz("intervals", 2)], date(2025, 3, 10)).await;

    let attempt = engine.start_attempt("ada", "intervals").await.unwrap();
    engine
        .submit_answer(attempt.id, "q1", Some("a"))
        .await
        .unwrap();
    engine
        .submit_answer(attempt.id, "q1", Some("b"))
        .await
        .unwrap(); // change of mind
    engine
        .submit_answer(attempt.id, "q2", Some("b"))
        .await
        .unwrap();

    let ledger = engine.answers(attempt.id).await.unwrap();
    assert_eq!(ledger.len(), 2, "one record per question");

    let result = engine.submit_quiz(attempt.id).await.unwrap();
    assert_eq!(result.score, 2);
    assert_eq!(result.percentage, 100);
}

#[tokio::test]
async fn grading_no_questions_scores_zero_percent() {
    let (engine, _store, _clock) =
        make_engine(vec![make_quiz("empty-quiz", 0)], date(2025, 3, 10)).await;

    let attempt = engine.start_attempt("ada", "empty-quiz").await.unwrap();
    let result = engine.submit_quiz(attempt.id).await.unwrap();
    assert_eq!(result.score, 0);
    assert_eq!(result.total_questions, 0);
    assert_eq!(result.percentage, 0);
}

#[tokio::test]
async fn unknown_ids_surface_typed_errors() {
    let (engine, _store, _clock) =
        make_engine(vec![make_quiz("intervals", 1)], date(2025, 3, 10)).await;

    let err = engine.start_attempt("ada", "no-such").await.unwrap_err();
    assert!(matches!(err, QuizError::UnknownQuiz(_)));

    let err = engine.submit_quiz(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, QuizError::UnknownAttempt(_)));

    let attempt = engine.start_attempt("ada", "intervals").await.unwrap();
    let err = engine
        .submit_answer(attempt.id, "q9", Some("a"))
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::InvalidQuestion { .. }));

    let err = engine
        .submit_answer(attempt.id, "q1", Some("z"))
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::InvalidAnswer { .. }));

    // a skipped question is not an error and records nothing
    engine.submit_answer(attempt.id, "q1", None).await.unwrap();
    assert!(engine.answers(attempt.id).await.unwrap().is_empty());
}

// --- Double grading ---

#[tokio::test]
async fn sequential_regrade_is_rejected_and_state_frozen() {
    let (engine, _store, _clock) =
        make_engine(vec![make_quiz("intervals", 2)], date(2025, 3, 10)).await;

    let attempt = engine.start_attempt("ada", "intervals").await.unwrap();
    engine
        .submit_answer(attempt.id, "q1", Some("b"))
        .await
        .unwrap();
    let result = engine.submit_quiz(attempt.id).await.unwrap();

    let err = engine.submit_quiz(attempt.id).await.unwrap_err();
    assert!(matches!(err, QuizError::AlreadyGraded(id) if id == attempt.id));
    assert!(err.is_benign());

    // the ledger is frozen after completion
    let err = engine
        .submit_answer(attempt.id, "q1", Some("a"))
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::InvalidState(_)));

    // nothing the failed calls did changed the stored attempt
    let stored = engine.attempt(attempt.id).await.unwrap();
    assert_eq!(stored.score, Some(result.score));
    assert_eq!(stored.completed_at, Some(result.completed_at));

    let streak = engine.streak("ada").await.unwrap();
    assert_eq!(streak.current_streak, 1, "streak advanced exactly once");
}

#[tokio::test]
async fn concurrent_graders_have_exactly_one_winner() {
    let (engine, _store, _clock) =
        make_engine(vec![make_quiz("intervals", 2)], date(2025, 3, 10)).await;
    let engine = Arc::new(engine);

    let attempt = engine.start_attempt("ada", "intervals").await.unwrap();
    engine
        .submit_answer(attempt.id, "q1", Some("b"))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        let id = attempt.id;
        handles.push(tokio::spawn(async move { engine.submit_quiz(id).await }));
    }

    let mut wins = 0;
    let mut benign = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(result) => {
                wins += 1;
                assert_eq!(result.score, 1);
            }
            Err(e) => {
                assert!(e.is_benign(), "unexpected error: {e}");
                benign += 1;
            }
        }
    }
    assert_eq!(wins, 1, "exactly one grader must win");
    assert_eq!(benign, 7);

    let streak = engine.streak("ada").await.unwrap();
    assert_eq!(streak.current_streak, 1, "losers must not touch the streak");
}

// --- Streaks across days ---

#[tokio::test]
async fn same_day_second_completion_keeps_streak() {
    let (engine, _store, _clock) = make_engine(
        vec![make_quiz("intervals", 2), make_quiz("chords", 2)],
        date(2025, 3, 10),
    )
    .await;

    let first = engine.start_attempt("ada", "intervals").await.unwrap();
    engine.submit_quiz(first.id).await.unwrap();

    let second = engine.start_attempt("ada", "chords").await.unwrap();
    let result = engine.submit_quiz(second.id).await.unwrap();

    let streak = result.streak.unwrap();
    assert_eq!(streak.current_streak, 1, "same day counts once");
    assert_eq!(streak.longest_streak, 1);
}

#[tokio::test]
async fn streak_accumulates_daily_and_resets_after_gap() {
    let (engine, _store, clock) =
        make_engine(vec![make_quiz("intervals", 1)], date(2025, 3, 10)).await;

    for day in 0u32..3 {
        if day > 0 {
            clock.advance_days(1);
        }
        let attempt = engine.start_attempt("ada", "intervals").await.unwrap();
        engine
            .submit_answer(attempt.id, "q1", Some("b"))
            .await
            .unwrap();
        let result = engine.submit_quiz(attempt.id).await.unwrap();
        assert_eq!(result.streak.unwrap().current_streak, day + 1);
    }

    clock.advance_days(3);
    let attempt = engine.start_attempt("ada", "intervals").await.unwrap();
    let result = engine.submit_quiz(attempt.id).await.unwrap();
    let streak = result.streak.unwrap();
    assert_eq!(streak.current_streak, 1, "gap resets the run");
    assert_eq!(streak.longest_streak, 3, "the best run is remembered");
}

#[tokio::test]
async fn streak_write_failure_reports_none_but_score_persists() {
    let inner = Arc::new(MemoryStore::with_quizzes(vec![make_quiz("intervals", 2)]));
    let store = Arc::new(FlakyStore::new(inner));
    let clock = Arc::new(FixedClock::on_date(date(2025, 3, 10)));
    let engine = QuizEngine::new(store.clone(), clock, QuizEngineConfig::default());

    let attempt = engine.start_attempt("ada", "intervals").await.unwrap();
    engine
        .submit_answer(attempt.id, "q1", Some("b"))
        .await
        .unwrap();

    store.fail_streak_writes(true);
    let result = engine.submit_quiz(attempt.id).await.unwrap();
    assert!(
        result.streak.is_none(),
        "failed streak write must not fail grading"
    );
    assert_eq!(result.score, 1);
    assert_eq!(store.streak_write_attempts(), 1);

    // the grade stands, the streak is untouched
    let stored = engine.attempt(attempt.id).await.unwrap();
    assert!(stored.is_completed());
    let streak = engine.streak("ada").await.unwrap();
    assert_eq!(streak.current_streak, 0);

    // grading cannot be retried to patch the streak up afterwards
    let err = engine.submit_quiz(attempt.id).await.unwrap_err();
    assert!(err.is_benign());
}

// --- Stats and summaries ---

#[tokio::test]
async fn stats_cache_serves_stale_until_ttl() {
    let (engine, _store, clock) =
        make_engine(vec![make_quiz("intervals", 2)], date(2025, 3, 10)).await;

    let attempt = engine.start_attempt("ada", "intervals").await.unwrap();
    engine
        .submit_answer(attempt.id, "q1", Some("b"))
        .await
        .unwrap();
    engine.submit_quiz(attempt.id).await.unwrap();

    let first = engine.stats().await.unwrap();
    assert_eq!(first.completed_attempts, 1);
    assert_eq!(first.average_score, 50.0);

    // a completion inside the TTL window is not visible yet
    let attempt = engine.start_attempt("bea", "intervals").await.unwrap();
    engine.submit_quiz(attempt.id).await.unwrap();
    let cached = engine.stats().await.unwrap();
    assert_eq!(cached.completed_attempts, 1);

    // past the TTL the cache recomputes
    clock.advance_days(1);
    let fresh = engine.stats().await.unwrap();
    assert_eq!(fresh.completed_attempts, 2);
    assert_eq!(fresh.total_users, 2);
    assert_eq!(fresh.average_score, 25.0);
}

#[tokio::test]
async fn user_summary_caps_recent_and_averages() {
    let (engine, _store, clock) =
        make_engine(vec![make_quiz("intervals", 2)], date(2025, 3, 1)).await;

    // seven daily completions, alternating full and empty marks
    for day in 0u32..7 {
        if day > 0 {
            clock.advance_days(1);
        }
        let attempt = engine.start_attempt("ada", "intervals").await.unwrap();
        if day % 2 == 0 {
            engine
                .submit_answer(attempt.id, "q1", Some("b"))
                .await
                .unwrap();
            engine
                .submit_answer(attempt.id, "q2", Some("b"))
                .await
                .unwrap();
        }
        engine.submit_quiz(attempt.id).await.unwrap();
    }

    let summary = engine.user_summary("ada").await.unwrap();
    assert_eq!(summary.completed_attempts, 7);
    // four at 100%, three at 0%: 400 / 7 rounds to 57
    assert_eq!(summary.average_score, 57);
    assert_eq!(summary.recent.len(), 5, "recent list is capped");
    assert_eq!(
        summary.recent[0].completed_at.date_naive(),
        date(2025, 3, 7),
        "newest completion first"
    );
    assert_eq!(summary.streak.current_streak, 7);
    assert_eq!(summary.streak.longest_streak, 7);
}

#[tokio::test]
async fn user_summary_for_unknown_user_is_empty() {
    let (engine, _store, _clock) =
        make_engine(vec![make_quiz("intervals", 1)], date(2025, 3, 10)).await;

    let summary = engine.user_summary("nobody").await.unwrap();
    assert_eq!(summary.completed_attempts, 0);
    assert_eq!(summary.average_score, 0);
    assert!(summary.recent.is_empty());
    assert_eq!(summary.streak.current_streak, 0);
}
