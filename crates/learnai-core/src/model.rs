//! Core data model types for LearnAI.
//!
//! Topic keys, score records, quiz answers and benchmark results, plus the
//! request and response payloads exchanged with the remote LearnAI API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of characters kept in a [`TopicKey`].
pub const TOPIC_KEY_MAX_CHARS: usize = 40;

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Normalized identifier used to group quiz scores by subject.
///
/// Case-folded and truncated to [`TOPIC_KEY_MAX_CHARS`] characters. Distinct
/// long topics that share a prefix collide on purpose.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicKey(String);

impl TopicKey {
    pub fn new(topic: &str) -> Self {
        Self(topic.to_lowercase().chars().take(TOPIC_KEY_MAX_CHARS).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One completed quiz attempt, as a whole percentage in `[0, 100]`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "u8")]
pub struct ScoreRecord(u8);

impl ScoreRecord {
    pub const MAX: u8 = 100;

    /// Returns `None` when `value` is above 100.
    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    /// Like [`ScoreRecord::new`], but caps values above 100.
    pub fn clamped(value: u8) -> Self {
        Self(value.min(Self::MAX))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for ScoreRecord {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(ScoreRecord::new)
            .ok_or_else(|| format!("score out of range: {value}"))
    }
}

impl From<ScoreRecord> for u8 {
    fn from(score: ScoreRecord) -> Self {
        score.0
    }
}

impl fmt::Display for ScoreRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One confirmed response to a quiz question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAnswer {
    /// Index of the chosen option.
    pub selected: usize,
    /// Whether the chosen option was the correct one.
    pub is_correct: bool,
}

/// Proficiency tier derived from a quiz score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Proficiency {
    Beginner,
    Developing,
    Intermediate,
    Advanced,
    Expert,
    /// The attempt could not be benchmarked (remote grading unavailable).
    Unknown,
}

impl Proficiency {
    /// Tier for a score. Thresholds are inclusive lower bounds, checked top-down.
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => Proficiency::Expert,
            75.. => Proficiency::Advanced,
            60.. => Proficiency::Intermediate,
            40.. => Proficiency::Developing,
            _ => Proficiency::Beginner,
        }
    }

    /// Short learner-facing explanation of the tier.
    pub fn description(self) -> &'static str {
        match self {
            Proficiency::Expert => {
                "Outstanding! You've demonstrated mastery-level understanding."
            }
            Proficiency::Advanced => "Excellent work! You have a strong grasp of this topic.",
            Proficiency::Intermediate => "Good progress! Keep practising to advance further.",
            Proficiency::Developing => {
                "You're building a foundation! Review the resources and retake the quiz."
            }
            Proficiency::Beginner => {
                "Everyone starts somewhere! Work through the learning path before retaking."
            }
            Proficiency::Unknown => {
                "Your answers were scored, but this attempt could not be benchmarked."
            }
        }
    }
}

impl fmt::Display for Proficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Proficiency::Beginner => "Beginner",
            Proficiency::Developing => "Developing",
            Proficiency::Intermediate => "Intermediate",
            Proficiency::Advanced => "Advanced",
            Proficiency::Expert => "Expert",
            Proficiency::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

impl FromStr for Proficiency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(Proficiency::Beginner),
            "developing" => Ok(Proficiency::Developing),
            "intermediate" => Ok(Proficiency::Intermediate),
            "advanced" => Ok(Proficiency::Advanced),
            "expert" => Ok(Proficiency::Expert),
            "unknown" => Ok(Proficiency::Unknown),
            other => Err(format!("unknown proficiency: {other}")),
        }
    }
}

/// Positional quartiles drawn from a sorted score history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuartileStats {
    pub q1: u8,
    pub median: u8,
    pub q3: u8,
    /// Sample size the quartiles were drawn from.
    pub n: usize,
}

/// Outcome of a graded quiz, benchmarked against the topic's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub score: u8,
    pub correct: usize,
    pub total: usize,
    pub proficiency: Proficiency,
    /// Share of historical attempts strictly below `score`, 0–100.
    pub percentile: u8,
    pub stats: QuartileStats,
}

// ---------------------------------------------------------------------------
// Remote payloads: resource search / learning path
// ---------------------------------------------------------------------------

/// Request body carrying just a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicRequest {
    pub topic: String,
}

/// A video found by the resource search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A free course found by the resource search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Response of `/api/search-resources`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSearch {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub videos: Vec<Video>,
    #[serde(default)]
    pub courses: Vec<Course>,
}

/// Request body of `/api/generate-path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathRequest {
    pub topic: String,
    pub videos: Vec<Video>,
    pub courses: Vec<Course>,
    /// Available study time in minutes.
    pub duration: u32,
}

/// A single resource placed into a learning-path phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathResource {
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub why: Option<String>,
    #[serde(default)]
    pub estimated_minutes: Option<u32>,
}

impl PathResource {
    pub fn is_video(&self) -> bool {
        self.kind.as_deref() == Some("video") || self.platform.as_deref() == Some("YouTube")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub resources: Vec<PathResource>,
}

/// Response of `/api/generate-path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPath {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub phases: Vec<Phase>,
    #[serde(default)]
    pub key_skills: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub quiz: Vec<QuizQuestion>,
}

// ---------------------------------------------------------------------------
// Remote payloads: topic suggestions / tutorial
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtopic {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub estimated_minutes: u32,
}

fn default_difficulty() -> Difficulty {
    Difficulty::Other
}

/// Response of `/api/suggest-topics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSuggestions {
    #[serde(default)]
    pub main_topic: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subtopics: Vec<Subtopic>,
    #[serde(default)]
    pub related_topics: Vec<String>,
    #[serde(default)]
    pub total_estimated_hours: f64,
}

/// Request body of `/api/generate-tutorial`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorialRequest {
    pub topic: String,
    pub subtopics: Vec<String>,
    /// Available study time in minutes.
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorialSection {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub has_code: bool,
    #[serde(default)]
    pub estimated_minutes: u32,
}

/// Response of `/api/generate-tutorial`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tutorial {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub sections: Vec<TutorialSection>,
    #[serde(default)]
    pub quiz: Vec<QuizQuestion>,
    #[serde(default)]
    pub summary: String,
}

// ---------------------------------------------------------------------------
// Quiz and grading payloads
// ---------------------------------------------------------------------------

/// A generated multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    #[serde(default)]
    pub id: Option<String>,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    /// Index of the correct option.
    pub correct: usize,
    #[serde(default)]
    pub explanation: String,
}

/// Request body of `/api/submit-quiz`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSubmission {
    pub topic: String,
    pub answers: Vec<QuizAnswer>,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub score: f64,
    /// Completion time as reported by the server (naive UTC).
    pub date: chrono::NaiveDateTime,
}

/// Response of `/api/leaderboard/{topic}`: top scores, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub topic: String,
    #[serde(default)]
    pub entries: Vec<LeaderboardEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_key_folds_case_and_truncates() {
        let key = TopicKey::new("Machine Learning");
        assert_eq!(key.as_str(), "machine learning");

        let long = "A".repeat(60);
        assert_eq!(TopicKey::new(&long).as_str().chars().count(), TOPIC_KEY_MAX_CHARS);
    }

    #[test]
    fn topic_key_is_idempotent() {
        for topic in ["Rust", "  Spaced Topic ", "ÄÖÜ Umlaut Studies", &"xY".repeat(50)] {
            let once = TopicKey::new(topic);
            let twice = TopicKey::new(once.as_str());
            assert_eq!(once, twice, "normalization not idempotent for {topic:?}");
        }
    }

    #[test]
    fn long_topics_with_shared_prefix_collide() {
        let prefix = "the complete history of the roman empire ";
        let a = TopicKey::new(&format!("{prefix}part one"));
        let b = TopicKey::new(&format!("{prefix}PART TWO"));
        assert_eq!(a, b);
    }

    #[test]
    fn score_record_rejects_out_of_range() {
        assert!(ScoreRecord::new(100).is_some());
        assert!(ScoreRecord::new(101).is_none());
        assert!(serde_json::from_str::<ScoreRecord>("-1").is_err());
        assert!(serde_json::from_str::<ScoreRecord>("250").is_err());
        assert_eq!(serde_json::from_str::<ScoreRecord>("75").unwrap().value(), 75);
    }

    #[test]
    fn proficiency_display_and_parse() {
        assert_eq!(Proficiency::Expert.to_string(), "Expert");
        assert_eq!("advanced".parse::<Proficiency>().unwrap(), Proficiency::Advanced);
        assert_eq!("UNKNOWN".parse::<Proficiency>().unwrap(), Proficiency::Unknown);
        assert!("guru".parse::<Proficiency>().is_err());
    }

    #[test]
    fn path_resource_kind_uses_type_field() {
        let json = r#"{"title": "Intro", "url": "https://youtube.com/watch?v=abc", "type": "video"}"#;
        let res: PathResource = serde_json::from_str(json).unwrap();
        assert!(res.is_video());
        assert_eq!(res.estimated_minutes, None);
    }

    #[test]
    fn unknown_difficulty_is_tolerated() {
        let json = r#"{"id": "3", "name": "Lifetimes", "difficulty": "expert", "estimated_minutes": 20}"#;
        let sub: Subtopic = serde_json::from_str(json).unwrap();
        assert_eq!(sub.difficulty, Difficulty::Other);
    }

    #[test]
    fn leaderboard_parses_naive_iso_dates() {
        let json = r#"{"topic": "rust", "entries": [{"score": 87.5, "date": "2024-03-01T10:15:30.123456"}]}"#;
        let board: Leaderboard = serde_json::from_str(json).unwrap();
        assert_eq!(board.entries.len(), 1);
        assert_eq!(board.entries[0].score, 87.5);
    }
}
