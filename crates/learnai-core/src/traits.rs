//! Core trait definitions for the remote API and the score store.
//!
//! `LearnApi` is implemented by the `learnai-client` crate; `ScoreStore` is
//! implemented in [`crate::store`].

use async_trait::async_trait;

use crate::model::{
    BenchmarkResult, Leaderboard, LearningPath, PathRequest, QuizSubmission, ResourceSearch,
    ScoreRecord, TopicRequest, TopicSuggestions, Tutorial, TutorialRequest,
};

// ---------------------------------------------------------------------------
// Remote API trait
// ---------------------------------------------------------------------------

/// The remote LearnAI service: resource search, content generation, grading.
///
/// Failures are reported as `anyhow::Error` wrapping an
/// [`ApiError`](crate::error::ApiError) where the cause is known.
#[async_trait]
pub trait LearnApi: Send + Sync {
    /// Human-readable backend name (e.g. "http").
    fn name(&self) -> &str;

    /// `POST /api/search-resources`.
    async fn search_resources(&self, request: &TopicRequest) -> anyhow::Result<ResourceSearch>;

    /// `POST /api/suggest-topics`.
    async fn suggest_topics(&self, request: &TopicRequest) -> anyhow::Result<TopicSuggestions>;

    /// `POST /api/generate-path`.
    async fn generate_path(&self, request: &PathRequest) -> anyhow::Result<LearningPath>;

    /// `POST /api/generate-tutorial`.
    async fn generate_tutorial(&self, request: &TutorialRequest) -> anyhow::Result<Tutorial>;

    /// `POST /api/submit-quiz`.
    async fn submit_quiz(&self, submission: &QuizSubmission) -> anyhow::Result<BenchmarkResult>;

    /// `GET /api/leaderboard/{topic}`.
    async fn leaderboard(&self, topic: &str) -> anyhow::Result<Leaderboard>;
}

// ---------------------------------------------------------------------------
// Score store trait
// ---------------------------------------------------------------------------

/// Durable per-topic quiz score history.
///
/// Neither operation fails: storage problems degrade to a dropped write or an
/// empty history.
pub trait ScoreStore: Send + Sync {
    /// Append `score` to the history of `topic`'s key.
    fn record(&self, topic: &str, score: ScoreRecord);

    /// All recorded scores for `topic`'s key, sorted ascending.
    fn history(&self, topic: &str) -> Vec<ScoreRecord>;
}
