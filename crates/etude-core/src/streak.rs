//! Daily engagement streak arithmetic.
//!
//! The streak engine is a pure function over `(state, today)`. Persistence
//! and "what is today" both live elsewhere; callers grade an attempt, then
//! feed the completion date through [`advance`] and store the result.

use chrono::NaiveDate;

use crate::model::StreakState;

/// Advance a user's streak for activity on `today`.
///
/// Decision table over `last_active_date`:
///
/// | last active   | new current | new longest               |
/// |---------------|-------------|---------------------------|
/// | none          | 1           | max(longest, 1)           |
/// | today         | unchanged   | unchanged (no-op)         |
/// | yesterday     | current + 1 | max(longest, current + 1) |
/// | anything else | 1           | max(longest, 1)           |
///
/// "Anything else" covers gaps of two or more days and last-active dates in
/// the future; both start a fresh one-day run. `longest_streak` only ever
/// grows, so the record survives every reset.
pub fn advance(state: &StreakState, today: NaiveDate) -> StreakState {
    match state.last_active_date {
        Some(last) if last == today => *state,
        Some(last) if Some(last) == today.pred_opt() => {
            let current = state.current_streak + 1;
            StreakState {
                current_streak: current,
                longest_streak: state.longest_streak.max(current),
                last_active_date: Some(today),
            }
        }
        _ => StreakState {
            current_streak: 1,
            longest_streak: state.longest_streak.max(1),
            last_active_date: Some(today),
        },
    }
}
