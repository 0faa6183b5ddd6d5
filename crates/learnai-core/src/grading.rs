//! Quiz scoring and benchmarking against a topic's score history.
//!
//! Quartiles are taken positionally from the ascending history
//! (`H[n/4]`, `H[n/2]`, `H[3n/4]`), not interpolated. The percentile counts
//! attempts strictly below the score, and the history already includes the
//! attempt being ranked.

use crate::error::GradeError;
use crate::model::{BenchmarkResult, Proficiency, QuartileStats, QuizAnswer, ScoreRecord};
use crate::traits::ScoreStore;

/// Percentile reported when there is too little history to rank against.
pub const NEUTRAL_PERCENTILE: u8 = 50;

/// Raw outcome of a quiz before benchmarking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub correct: usize,
    pub total: usize,
    /// `round(100 * correct / total)`.
    pub score: ScoreRecord,
}

/// `round(100 * part / whole)` with halves rounded up. `whole` must be non-zero.
pub(crate) fn rounded_percent(part: usize, whole: usize) -> u8 {
    debug_assert!(whole > 0 && part <= whole);
    let pct = (200 * part + whole) / (2 * whole);
    pct.min(100) as u8
}

/// Count correct answers and compute the whole-percent score.
pub fn tally(answers: &[QuizAnswer]) -> Result<Tally, GradeError> {
    if answers.is_empty() {
        return Err(GradeError::EmptyQuiz);
    }
    let total = answers.len();
    let correct = answers.iter().filter(|a| a.is_correct).count();
    let score = ScoreRecord::clamped(rounded_percent(correct, total));
    Ok(Tally {
        correct,
        total,
        score,
    })
}

/// Positional quartiles of a history, or `None` if it is empty.
pub fn summarize(history: &[ScoreRecord]) -> Option<QuartileStats> {
    if history.is_empty() {
        return None;
    }
    let mut sorted = history.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();
    Some(QuartileStats {
        q1: sorted[n / 4].value(),
        median: sorted[n / 2].value(),
        q3: sorted[3 * n / 4].value(),
        n,
    })
}

/// Synthetic quartiles used when no history is available.
fn placeholder_stats(score: u8) -> QuartileStats {
    QuartileStats {
        q1: score.saturating_sub(15),
        median: score,
        q3: score.saturating_add(10).min(100),
        n: 0,
    }
}

/// Benchmark a tally against `history`, which should already contain the
/// tallied score.
pub fn benchmark(tally: Tally, history: &[ScoreRecord]) -> BenchmarkResult {
    let score = tally.score.value();
    let stats = summarize(history).unwrap_or_else(|| placeholder_stats(score));

    let n = history.len();
    let percentile = if n > 1 {
        let below = history.iter().filter(|s| s.value() < score).count();
        rounded_percent(below, n)
    } else {
        NEUTRAL_PERCENTILE
    };

    BenchmarkResult {
        score,
        correct: tally.correct,
        total: tally.total,
        proficiency: Proficiency::from_score(score),
        percentile,
        stats,
    }
}

/// Grade a finished quiz: record the score for `topic`, then benchmark it
/// against the updated history.
pub fn grade(
    store: &dyn ScoreStore,
    topic: &str,
    answers: &[QuizAnswer],
) -> Result<BenchmarkResult, GradeError> {
    let tally = tally(answers)?;
    store.record(topic, tally.score);
    let history = store.history(topic);
    let result = benchmark(tally, &history);
    tracing::debug!(
        topic,
        score = result.score,
        percentile = result.percentile,
        n = result.stats.n,
        "graded quiz"
    );
    Ok(result)
}

/// Degraded result used when remote grading is unavailable.
pub fn fallback_result(answers: &[QuizAnswer]) -> Result<BenchmarkResult, GradeError> {
    let tally = tally(answers)?;
    let score = tally.score.value();
    Ok(BenchmarkResult {
        score,
        correct: tally.correct,
        total: tally.total,
        proficiency: Proficiency::Unknown,
        percentile: NEUTRAL_PERCENTILE,
        stats: placeholder_stats(score),
    })
}
