//! HTTP implementation of the LearnAI API.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use learnai_core::error::ApiError;
use learnai_core::model::{
    BenchmarkResult, Leaderboard, LearningPath, PathRequest, Proficiency, QuartileStats,
    QuizSubmission, ResourceSearch, TopicRequest, TopicSuggestions, Tutorial, TutorialRequest,
};
use learnai_core::traits::LearnApi;

pub const DEFAULT_BASE_URL: &str = "https://learnai-backend-p96s.onrender.com";

/// JSON-over-HTTP client for the LearnAI service.
pub struct HttpClient {
    base_url: String,
    timeout_secs: Option<u64>,
    client: reqwest::Client,
}

impl HttpClient {
    /// `timeout_secs: None` waits on a request for as long as it takes.
    pub fn new(base_url: &str, timeout_secs: Option<u64>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.timeout_secs.unwrap_or_default())
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }

    async fn read<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail: error_detail(status.as_u16(), &body),
            });
        }
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.read(response).await
    }

    fn leaderboard_url(&self, topic: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::Network(format!("invalid base URL '{}': {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Network(format!("base URL '{}' cannot have a path", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "leaderboard", topic]);
        Ok(url)
    }
}

/// Learner-facing message for a failed response: the body's `detail` when
/// present, otherwise a generic line naming the status.
fn error_detail(status: u16, body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned());
    match detail {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s,
        Some(serde_json::Value::Null | serde_json::Value::String(_)) | None => {
            format!("Request failed ({status})")
        }
        Some(other) => other.to_string(),
    }
}

#[derive(Deserialize)]
struct SubmitQuizResponse {
    score: f64,
    correct: usize,
    total: usize,
    #[serde(default)]
    proficiency: Option<String>,
    percentile: f64,
    stats: SubmitQuizStats,
}

#[derive(Deserialize)]
struct SubmitQuizStats {
    median: f64,
    q1: f64,
    q3: f64,
    #[serde(default)]
    total_participants: usize,
}

fn whole_percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

impl From<SubmitQuizResponse> for BenchmarkResult {
    fn from(r: SubmitQuizResponse) -> Self {
        let score = whole_percent(r.score);
        let proficiency = r
            .proficiency
            .and_then(|p| p.parse::<Proficiency>().ok())
            .unwrap_or_else(|| Proficiency::from_score(score));
        BenchmarkResult {
            score,
            correct: r.correct,
            total: r.total,
            proficiency,
            percentile: whole_percent(r.percentile),
            stats: QuartileStats {
                q1: whole_percent(r.stats.q1),
                median: whole_percent(r.stats.median),
                q3: whole_percent(r.stats.q3),
                n: r.stats.total_participants,
            },
        }
    }
}

#[async_trait]
impl LearnApi for HttpClient {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, request), fields(topic = %request.topic))]
    async fn search_resources(&self, request: &TopicRequest) -> anyhow::Result<ResourceSearch> {
        Ok(self.post("/api/search-resources", request).await?)
    }

    #[instrument(skip(self, request), fields(topic = %request.topic))]
    async fn suggest_topics(&self, request: &TopicRequest) -> anyhow::Result<TopicSuggestions> {
        Ok(self.post("/api/suggest-topics", request).await?)
    }

    #[instrument(skip(self, request), fields(topic = %request.topic, duration = request.duration))]
    async fn generate_path(&self, request: &PathRequest) -> anyhow::Result<LearningPath> {
        Ok(self.post("/api/generate-path", request).await?)
    }

    #[instrument(skip(self, request), fields(topic = %request.topic, duration = request.duration))]
    async fn generate_tutorial(&self, request: &TutorialRequest) -> anyhow::Result<Tutorial> {
        Ok(self.post("/api/generate-tutorial", request).await?)
    }

    #[instrument(skip(self, submission), fields(topic = %submission.topic))]
    async fn submit_quiz(&self, submission: &QuizSubmission) -> anyhow::Result<BenchmarkResult> {
        let response: SubmitQuizResponse = self.post("/api/submit-quiz", submission).await?;
        Ok(response.into())
    }

    #[instrument(skip(self))]
    async fn leaderboard(&self, topic: &str) -> anyhow::Result<Leaderboard> {
        let url = self.leaderboard_url(topic)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Ok(self.read(response).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnai_core::model::QuizAnswer;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_error(err: &anyhow::Error) -> &ApiError {
        err.downcast_ref::<ApiError>().expect("expected an ApiError")
    }

    #[tokio::test]
    async fn search_resources_posts_topic() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/search-resources"))
            .and(body_json(serde_json::json!({"topic": "Rust"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "topic": "Rust",
                "videos": [{"title": "Rust in 100 seconds", "url": "https://youtube.com/watch?v=5C_HPTJg5ek"}],
                "courses": [{"title": "The Book", "url": "https://doc.rust-lang.org/book/", "platform": "Docs"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri(), None).unwrap();
        let search = client
            .search_resources(&TopicRequest {
                topic: "Rust".into(),
            })
            .await
            .unwrap();

        assert_eq!(search.videos.len(), 1);
        assert_eq!(search.courses[0].platform.as_deref(), Some("Docs"));
    }

    #[tokio::test]
    async fn error_detail_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate-path"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({"detail": "AI error: quota exhausted"})),
            )
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri(), None).unwrap();
        let err = client
            .generate_path(&PathRequest {
                topic: "Rust".into(),
                videos: vec![],
                courses: vec![],
                duration: 60,
            })
            .await
            .unwrap_err();

        match api_error(&err) {
            ApiError::Status { status, detail } => {
                assert_eq!(*status, 500);
                assert_eq!(detail, "AI error: quota exhausted");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_without_detail_names_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/suggest-topics"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let client = HttpClient::new(&format!("{}/", server.uri()), None).unwrap();
        let err = client
            .suggest_topics(&TopicRequest {
                topic: "Chess".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(api_error(&err).status(), Some(502));
        assert_eq!(err.to_string(), "Request failed (502) (HTTP 502)");
    }

    #[test]
    fn structured_detail_is_stringified() {
        let body = r#"{"detail": [{"loc": ["body", "topic"], "msg": "field required"}]}"#;
        assert!(error_detail(422, body).contains("field required"));
        assert_eq!(error_detail(404, r#"{"detail": null}"#), "Request failed (404)");
        assert_eq!(error_detail(500, r#"{"detail": ""}"#), "Request failed (500)");
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate-tutorial"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri(), None).unwrap();
        let err = client
            .generate_tutorial(&TutorialRequest {
                topic: "Chess".into(),
                subtopics: vec!["Openings".into()],
                duration: 30,
            })
            .await
            .unwrap_err();

        assert!(matches!(api_error(&err), ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn submit_quiz_rounds_service_figures() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/submit-quiz"))
            .and(body_json(serde_json::json!({
                "topic": "SQL",
                "answers": [
                    {"selected": 0, "is_correct": true},
                    {"selected": 2, "is_correct": true},
                    {"selected": 1, "is_correct": false}
                ],
                "user_id": "user_abc"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "score": 66.66666666666667,
                "correct": 2,
                "total": 3,
                "proficiency": "Intermediate",
                "percentile": 42.9,
                "stats": {"median": 70.0, "q1": 55.5, "q3": 80.0, "total_participants": 7}
            })))
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri(), None).unwrap();
        let answer = |selected, is_correct| QuizAnswer {
            selected,
            is_correct,
        };
        let result = client
            .submit_quiz(&QuizSubmission {
                topic: "SQL".into(),
                answers: vec![answer(0, true), answer(2, true), answer(1, false)],
                user_id: "user_abc".into(),
            })
            .await
            .unwrap();

        assert_eq!(result.score, 67);
        assert_eq!(result.proficiency, Proficiency::Intermediate);
        assert_eq!(result.percentile, 43);
        assert_eq!(result.stats.q1, 56);
        assert_eq!(result.stats.n, 7);
    }

    #[tokio::test]
    async fn leaderboard_encodes_topic() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/leaderboard/machine%20learning"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "topic": "machine learning",
                "entries": [{"score": 100.0, "date": "2025-03-01T09:30:00.123456"}]
            })))
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri(), None).unwrap();
        let board = client.leaderboard("machine learning").await.unwrap();

        assert_eq!(board.entries.len(), 1);
        assert_eq!(board.entries[0].score, 100.0);
    }

    #[tokio::test]
    async fn slow_response_times_out_when_configured() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"topic": "x", "entries": []}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri(), Some(1)).unwrap();
        let err = client.leaderboard("x").await.unwrap_err();
        assert!(matches!(api_error(&err), ApiError::Timeout(1)));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let client = HttpClient::new("http://127.0.0.1:1", None).unwrap();
        let err = client
            .search_resources(&TopicRequest {
                topic: "Rust".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(api_error(&err), ApiError::Network(_)));
    }
}
