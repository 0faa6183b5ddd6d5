//! Mock API for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use learnai_core::error::ApiError;
use learnai_core::grading::{benchmark, tally};
use learnai_core::model::{
    BenchmarkResult, Course, Difficulty, Leaderboard, LeaderboardEntry, LearningPath, PathRequest,
    PathResource, Phase, QuizQuestion, QuizSubmission, ResourceSearch, ScoreRecord, Subtopic,
    TopicKey, TopicRequest, TopicSuggestions, Tutorial, TutorialRequest, TutorialSection, Video,
};
use learnai_core::traits::LearnApi;

/// The API operations, for targeted failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    SearchResources,
    SuggestTopics,
    GeneratePath,
    GenerateTutorial,
    SubmitQuiz,
    Leaderboard,
}

/// A mock LearnAI service for exercising the wizard without a network.
///
/// Content responses are canned. `submit_quiz` keeps its own score history
/// per topic and benchmarks against it, like the real service.
pub struct MockApi {
    search: ResourceSearch,
    suggestions: TopicSuggestions,
    path: LearningPath,
    tutorial: Tutorial,
    /// Endpoint → `detail` returned with a 500.
    failures: Mutex<HashMap<Endpoint, String>>,
    submitted: Mutex<HashMap<TopicKey, Vec<ScoreRecord>>>,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last quiz submission received.
    last_submission: Mutex<Option<QuizSubmission>>,
}

fn question(text: &str, options: [&str; 4], correct: usize, explanation: &str) -> QuizQuestion {
    QuizQuestion {
        id: None,
        question: text.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct,
        explanation: explanation.to_string(),
    }
}

fn sample_quiz() -> Vec<QuizQuestion> {
    vec![
        question(
            "What is the first step when learning a new topic?",
            ["Skim the fundamentals", "Memorize trivia", "Skip to experts", "Do nothing"],
            0,
            "Fundamentals give you the vocabulary for everything else.",
        ),
        question(
            "Which habit helps knowledge stick?",
            ["Cramming", "Spaced practice", "Rereading once", "Highlighting"],
            1,
            "Spacing practice over time improves retention.",
        ),
    ]
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            search: ResourceSearch {
                topic: String::new(),
                videos: vec![
                    Video {
                        title: "Crash course".into(),
                        url: "https://www.youtube.com/watch?v=mock0000001".into(),
                        thumbnail: None,
                        description: Some("A fast overview.".into()),
                    },
                    Video {
                        title: "Deep dive".into(),
                        url: "https://www.youtube.com/watch?v=mock0000002".into(),
                        thumbnail: None,
                        description: None,
                    },
                ],
                courses: vec![Course {
                    title: "Structured course".into(),
                    url: "https://www.coursera.org/learn/mock".into(),
                    platform: Some("Coursera".into()),
                    description: None,
                }],
            },
            suggestions: TopicSuggestions {
                main_topic: String::new(),
                description: "A guided tour of the essentials.".into(),
                subtopics: [
                    ("Foundations", Difficulty::Beginner, 15),
                    ("Core techniques", Difficulty::Intermediate, 20),
                    ("Advanced practice", Difficulty::Advanced, 25),
                ]
                .into_iter()
                .enumerate()
                .map(|(i, (name, difficulty, minutes))| Subtopic {
                    id: (i + 1).to_string(),
                    name: name.into(),
                    difficulty,
                    estimated_minutes: minutes,
                })
                .collect(),
                related_topics: vec!["Study skills".into()],
                total_estimated_hours: 1.0,
            },
            path: LearningPath {
                title: None,
                overview: Some("Start broad, then go deep.".into()),
                phases: vec![Phase {
                    title: "Getting started".into(),
                    description: None,
                    resources: vec![PathResource {
                        title: "Crash course".into(),
                        url: "https://www.youtube.com/watch?v=mock0000001".into(),
                        platform: Some("YouTube".into()),
                        kind: Some("video".into()),
                        why: Some("Quick orientation.".into()),
                        estimated_minutes: Some(20),
                    }],
                }],
                key_skills: vec!["Fundamentals".into()],
                next_steps: vec!["Build something small".into()],
                quiz: sample_quiz(),
            },
            tutorial: Tutorial {
                title: String::new(),
                overview: "What you will learn.".into(),
                sections: vec![TutorialSection {
                    id: "1".into(),
                    title: "Foundations".into(),
                    content: "Every topic rests on a few key ideas.".into(),
                    key_points: vec!["Start small".into()],
                    has_code: false,
                    estimated_minutes: 15,
                }],
                quiz: sample_quiz(),
                summary: "Keep practising.".into(),
            },
            failures: Mutex::new(HashMap::new()),
            submitted: Mutex::new(HashMap::new()),
            call_count: AtomicU32::new(0),
            last_submission: Mutex::new(None),
        }
    }

    /// Replace the canned learning path.
    pub fn with_path(mut self, path: LearningPath) -> Self {
        self.path = path;
        self
    }

    /// Replace the canned tutorial.
    pub fn with_tutorial(mut self, tutorial: Tutorial) -> Self {
        self.tutorial = tutorial;
        self
    }

    /// Make `endpoint` answer with HTTP 500 and `detail` until [`recover`](Self::recover).
    pub fn fail(&self, endpoint: Endpoint, detail: &str) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(endpoint, detail.to_string());
    }

    pub fn recover(&self, endpoint: Endpoint) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&endpoint);
    }

    /// Get the number of calls made to this API.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last quiz submission received.
    pub fn last_submission(&self) -> Option<QuizSubmission> {
        self.last_submission
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn enter(&self, endpoint: Endpoint) -> Result<(), ApiError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        match self
            .failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&endpoint)
        {
            Some(detail) => Err(ApiError::Status {
                status: 500,
                detail: detail.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LearnApi for MockApi {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search_resources(&self, request: &TopicRequest) -> anyhow::Result<ResourceSearch> {
        self.enter(Endpoint::SearchResources)?;
        Ok(ResourceSearch {
            topic: request.topic.clone(),
            ..self.search.clone()
        })
    }

    async fn suggest_topics(&self, request: &TopicRequest) -> anyhow::Result<TopicSuggestions> {
        self.enter(Endpoint::SuggestTopics)?;
        Ok(TopicSuggestions {
            main_topic: request.topic.clone(),
            ..self.suggestions.clone()
        })
    }

    async fn generate_path(&self, request: &PathRequest) -> anyhow::Result<LearningPath> {
        self.enter(Endpoint::GeneratePath)?;
        let mut path = self.path.clone();
        if path.title.is_none() {
            path.title = Some(format!("Learning Path: {}", request.topic));
        }
        Ok(path)
    }

    async fn generate_tutorial(&self, request: &TutorialRequest) -> anyhow::Result<Tutorial> {
        self.enter(Endpoint::GenerateTutorial)?;
        let mut tutorial = self.tutorial.clone();
        if tutorial.title.is_empty() {
            tutorial.title = format!("{}: A Guided Tutorial", request.topic);
        }
        Ok(tutorial)
    }

    async fn submit_quiz(&self, submission: &QuizSubmission) -> anyhow::Result<BenchmarkResult> {
        self.enter(Endpoint::SubmitQuiz)?;
        *self
            .last_submission
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(submission.clone());

        let t = tally(&submission.answers)?;
        let mut submitted = self.submitted.lock().unwrap_or_else(|e| e.into_inner());
        let history = submitted
            .entry(TopicKey::new(&submission.topic))
            .or_default();
        history.push(t.score);
        Ok(benchmark(t, history))
    }

    async fn leaderboard(&self, topic: &str) -> anyhow::Result<Leaderboard> {
        self.enter(Endpoint::Leaderboard)?;
        let submitted = self.submitted.lock().unwrap_or_else(|e| e.into_inner());
        let mut scores = submitted
            .get(&TopicKey::new(topic))
            .cloned()
            .unwrap_or_default();
        scores.sort_unstable_by(|a, b| b.cmp(a));
        let date = chrono::DateTime::<chrono::Utc>::UNIX_EPOCH.naive_utc();
        Ok(Leaderboard {
            topic: topic.to_string(),
            entries: scores
                .into_iter()
                .take(20)
                .map(|s| LeaderboardEntry {
                    score: f64::from(s.value()),
                    date,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnai_core::model::QuizAnswer;

    fn submission(topic: &str, flags: &[bool]) -> QuizSubmission {
        QuizSubmission {
            topic: topic.into(),
            answers: flags
                .iter()
                .map(|&is_correct| QuizAnswer {
                    selected: 0,
                    is_correct,
                })
                .collect(),
            user_id: "user_mock".into(),
        }
    }

    #[tokio::test]
    async fn canned_content_echoes_topic() {
        let api = MockApi::new();
        let search = api
            .search_resources(&TopicRequest {
                topic: "Rust".into(),
            })
            .await
            .unwrap();
        assert_eq!(search.topic, "Rust");
        assert_eq!(search.videos.len(), 2);

        let tutorial = api
            .generate_tutorial(&TutorialRequest {
                topic: "Rust".into(),
                subtopics: vec![],
                duration: 60,
            })
            .await
            .unwrap();
        assert_eq!(tutorial.title, "Rust: A Guided Tutorial");
        assert_eq!(api.call_count(), 2);
    }

    #[tokio::test]
    async fn failure_injection() {
        let api = MockApi::new();
        api.fail(Endpoint::SuggestTopics, "AI error: overloaded");

        let request = TopicRequest {
            topic: "Chess".into(),
        };
        let err = api.suggest_topics(&request).await.unwrap_err();
        let api_err = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api_err.status(), Some(500));

        api.recover(Endpoint::SuggestTopics);
        assert!(api.suggest_topics(&request).await.is_ok());
    }

    #[tokio::test]
    async fn submissions_are_benchmarked_and_ranked() {
        let api = MockApi::new();
        api.submit_quiz(&submission("SQL", &[true, false])).await.unwrap();
        let result = api
            .submit_quiz(&submission("sql", &[true, true]))
            .await
            .unwrap();

        assert_eq!(result.score, 100);
        assert_eq!(result.stats.n, 2);
        assert_eq!(result.percentile, 50);
        assert_eq!(api.last_submission().unwrap().topic, "sql");

        let board = api.leaderboard("SQL").await.unwrap();
        let scores: Vec<f64> = board.entries.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![100.0, 50.0]);
    }
}
