//! Wizard engine: drives the state machine against the API and score store.
//!
//! Commands run one at a time, in the order they are issued. There is no
//! cancellation; a `Reset` only takes effect once the running request ends.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::grading::{fallback_result, grade};
use crate::model::QuizSubmission;
use crate::report::SessionReport;
use crate::traits::{LearnApi, ScoreStore};
use crate::wizard::{reduce, Command, Event, Rejection, Stage, Transition, WizardState};

/// Where finished quizzes are graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradingMode {
    /// Grade against the local score store.
    #[default]
    Local,
    /// Grade with `submit-quiz`, falling back to an unbenchmarked result.
    Remote,
}

impl fmt::Display for GradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingMode::Local => write!(f, "local"),
            GradingMode::Remote => write!(f, "remote"),
        }
    }
}

impl FromStr for GradingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(GradingMode::Local),
            "remote" => Ok(GradingMode::Remote),
            other => Err(format!("unknown grading mode: {other}")),
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_request_start(&self, label: &str);
    fn on_request_complete(&self, label: &str);
    fn on_request_error(&self, label: &str, error: &str);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_request_start(&self, _: &str) {}
    fn on_request_complete(&self, _: &str) {}
    fn on_request_error(&self, _: &str, _: &str) {}
}

/// Message shown to the learner for a failed request.
fn describe_failure(error: &anyhow::Error) -> String {
    match error.downcast_ref::<ApiError>() {
        Some(ApiError::Status { detail, .. }) => detail.clone(),
        Some(other) => other.to_string(),
        None => format!("{error:#}"),
    }
}

/// Owns one wizard session and executes the commands it issues.
pub struct WizardEngine {
    api: Arc<dyn LearnApi>,
    store: Arc<dyn ScoreStore>,
    grading: GradingMode,
    user_id: String,
    state: WizardState,
}

impl WizardEngine {
    pub fn new(
        api: Arc<dyn LearnApi>,
        store: Arc<dyn ScoreStore>,
        grading: GradingMode,
        user_id: impl Into<String>,
        state: WizardState,
    ) -> Self {
        Self {
            api,
            store,
            grading,
            user_id: user_id.into(),
            state,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    /// A report of the finished session, once the result stage is reached.
    pub fn report(&self) -> Option<SessionReport> {
        match &self.state.stage {
            Stage::Result(result) => Some(SessionReport::new(
                &self.state.topic,
                self.state.mode,
                self.grading,
                *result,
            )),
            _ => None,
        }
    }

    /// Apply `event`, then run any resulting command to completion.
    ///
    /// A rejected event leaves the state unchanged. Request failures are not
    /// errors here: they land in [`WizardState::error`].
    pub async fn dispatch(
        &mut self,
        event: Event,
        progress: &dyn ProgressReporter,
    ) -> Result<(), Rejection> {
        let Transition { state, mut command } = reduce(&self.state, event)?;
        self.state = state;

        while let Some(next) = command.take() {
            let label = next.label();
            progress.on_request_start(label);

            let completion = match self.execute(next).await {
                Ok(event) => {
                    progress.on_request_complete(label);
                    event
                }
                Err(e) => {
                    let message = describe_failure(&e);
                    tracing::debug!("{label} failed: {e:#}");
                    progress.on_request_error(label, &message);
                    Event::RequestFailed(format!("Error: {message}"))
                }
            };

            let transition = reduce(&self.state, completion)?;
            self.state = transition.state;
            command = transition.command;
        }
        Ok(())
    }

    async fn execute(&self, command: Command) -> anyhow::Result<Event> {
        match command {
            Command::SearchResources(request) => self
                .api
                .search_resources(&request)
                .await
                .map(Event::ResourcesLoaded),
            Command::SuggestTopics(request) => self
                .api
                .suggest_topics(&request)
                .await
                .map(Event::SuggestionsLoaded),
            Command::GeneratePath(request) => self
                .api
                .generate_path(&request)
                .await
                .map(Event::PathGenerated),
            Command::GenerateTutorial(request) => self
                .api
                .generate_tutorial(&request)
                .await
                .map(Event::TutorialGenerated),
            Command::Grade { topic, answers } => {
                let result = match self.grading {
                    GradingMode::Local => grade(self.store.as_ref(), &topic, &answers)?,
                    GradingMode::Remote => {
                        let submission = QuizSubmission {
                            topic,
                            answers,
                            user_id: self.user_id.clone(),
                        };
                        match self.api.submit_quiz(&submission).await {
                            Ok(result) => result,
                            Err(e) => {
                                tracing::warn!("remote grading unavailable, using fallback: {e:#}");
                                fallback_result(&submission.answers)?
                            }
                        }
                    }
                };
                Ok(Event::Graded(result))
            }
        }
    }
}
