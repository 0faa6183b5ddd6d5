//! CLI tests against a mocked LearnAI service.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn learnai_against(dir: &TempDir, server: &MockServer) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("learnai").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("LEARNAI_API_URL", server.uri())
        .env_remove("LEARNAI_DATA_DIR")
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(dir.path().join("data"));
    cmd
}

async fn mount_resources_flow(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/search-resources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "topic": "Rust",
            "videos": [{"title": "Rust in 100 seconds", "url": "https://www.youtube.com/watch?v=5C_HPTJg5ek"}],
            "courses": []
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/generate-path"))
        .and(body_partial_json(serde_json::json!({"topic": "Rust", "duration": 60})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "title": "Learning Path: Rust",
            "phases": [{"title": "Basics", "resources": [
                {"title": "Rust in 100 seconds", "url": "https://www.youtube.com/watch?v=5C_HPTJg5ek", "type": "video"}
            ]}],
            "quiz": [{
                "question": "Which keyword makes a binding mutable?",
                "options": ["mut", "let", "var", "const"],
                "correct": 0,
                "explanation": "`let mut` declares a mutable binding."
            }]
        })))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn learn_runs_the_wizard_and_saves_a_report() {
    let server = MockServer::start().await;
    mount_resources_flow(&server).await;
    let dir = TempDir::new().unwrap();
    let report_path = dir.path().join("report.json");

    // generate, start quiz, answer correctly, finish
    learnai_against(&dir, &server)
        .args(["learn", "--topic", "Rust", "--save-report"])
        .arg(&report_path)
        .write_stdin("\n\n1\n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Learning Path: Rust"))
        .stdout(predicate::str::contains("Correct!"))
        .stdout(predicate::str::contains("Results for \"Rust\""));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["topic"], "Rust");
    assert_eq!(report["result"]["score"], 100);
    assert_eq!(report["grading"], "local");

    learnai_against(&dir, &server)
        .args(["history", "Rust"])
        .assert()
        .success()
        .stdout(predicate::str::contains("100"));
}

#[tokio::test(flavor = "multi_thread")]
async fn remote_grading_submits_to_the_service() {
    let server = MockServer::start().await;
    mount_resources_flow(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/submit-quiz"))
        .and(body_partial_json(serde_json::json!({"topic": "Rust"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "score": 100.0, "correct": 1, "total": 1, "proficiency": "Expert",
            "percentile": 87.5,
            "stats": {"median": 60.0, "q1": 40.0, "q3": 80.0, "total_participants": 9}
        })))
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    learnai_against(&dir, &server)
        .args(["learn", "--topic", "Rust", "--grading", "remote"])
        .write_stdin("\n\n1\n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("88%"))
        .stdout(predicate::str::contains("better than 88% of attempts"));

    learnai_against(&dir, &server)
        .args(["history", "Rust"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No scores recorded"));
}

#[tokio::test(flavor = "multi_thread")]
async fn leaderboard_lists_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/leaderboard/rust"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "topic": "rust",
            "entries": [
                {"score": 100.0, "date": "2025-03-01T09:30:00.123456"},
                {"score": 66.66666666666667, "date": "2025-02-11T18:05:42"}
            ]
        })))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    learnai_against(&dir, &server)
        .args(["leaderboard", "rust"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Leaderboard: rust"))
        .stdout(predicate::str::contains("67%"))
        .stdout(predicate::str::contains("2025-03-01 09:30"));
}

#[tokio::test(flavor = "multi_thread")]
async fn service_errors_exit_nonzero_with_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(serde_json::json!({"detail": "database locked"})),
        )
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    learnai_against(&dir, &server)
        .args(["leaderboard", "rust"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: database locked (HTTP 500)"));
}
