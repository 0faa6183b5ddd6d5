//! The LearnAI wizard as an explicit state machine.
//!
//! A session moves strictly forward through its stages:
//!
//! ```text
//! Resources mode: landing → resources   → path     → quiz → result
//! Tutorial mode:  landing → suggestions → tutorial → quiz → result
//! ```
//!
//! [`reduce`] is a pure function from the current state and an [`Event`] to
//! the next state plus, optionally, a [`Command`] the caller must execute.
//! The outcome of that command is fed back in as a completion event. A
//! rejected event leaves the caller's state untouched and issues nothing.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grading::rounded_percent;
use crate::model::{
    BenchmarkResult, LearningPath, PathRequest, QuizAnswer, QuizQuestion, ResourceSearch,
    TopicRequest, TopicSuggestions, Tutorial, TutorialRequest,
};

/// Study time offered by default on the selection stage, in minutes.
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

/// Which pair of endpoints drives the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardMode {
    /// Search videos and courses, then arrange them into a learning path.
    #[default]
    Resources,
    /// Suggest subtopics, then generate a written tutorial.
    Tutorial,
}

impl fmt::Display for WizardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardMode::Resources => write!(f, "resources"),
            WizardMode::Tutorial => write!(f, "tutorial"),
        }
    }
}

impl FromStr for WizardMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "resources" | "path" => Ok(WizardMode::Resources),
            "tutorial" | "suggestions" => Ok(WizardMode::Tutorial),
            other => Err(format!("unknown wizard mode: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Kinds of selectable items on the selection stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Video,
    Course,
    Subtopic,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Video => write!(f, "video"),
            ItemKind::Course => write!(f, "course"),
            ItemKind::Subtopic => write!(f, "subtopic"),
        }
    }
}

/// A single selectable item, by position in the fetched payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemRef {
    pub kind: ItemKind,
    pub index: usize,
}

impl ItemRef {
    pub fn video(index: usize) -> Self {
        Self {
            kind: ItemKind::Video,
            index,
        }
    }

    pub fn course(index: usize) -> Self {
        Self {
            kind: ItemKind::Course,
            index,
        }
    }

    pub fn subtopic(index: usize) -> Self {
        Self {
            kind: ItemKind::Subtopic,
            index,
        }
    }
}

fn toggle_index(set: &mut BTreeSet<usize>, index: usize, len: usize, kind: ItemKind) -> Result<(), Rejection> {
    if index >= len {
        return Err(Rejection::NoSuchItem { kind, index });
    }
    if !set.remove(&index) {
        set.insert(index);
    }
    Ok(())
}

/// Found videos and courses, and which of them the learner picked.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourcesStage {
    pub search: ResourceSearch,
    pub selected_videos: BTreeSet<usize>,
    pub selected_courses: BTreeSet<usize>,
    pub duration: u32,
}

impl ResourcesStage {
    fn new(search: ResourceSearch, duration: u32) -> Self {
        Self {
            selected_videos: (0..search.videos.len()).collect(),
            selected_courses: (0..search.courses.len()).collect(),
            search,
            duration,
        }
    }

    pub fn selected_count(&self) -> usize {
        self.selected_videos.len() + self.selected_courses.len()
    }

    fn toggle(&mut self, item: ItemRef) -> Result<(), Rejection> {
        match item.kind {
            ItemKind::Video => toggle_index(
                &mut self.selected_videos,
                item.index,
                self.search.videos.len(),
                item.kind,
            ),
            ItemKind::Course => toggle_index(
                &mut self.selected_courses,
                item.index,
                self.search.courses.len(),
                item.kind,
            ),
            ItemKind::Subtopic => Err(Rejection::NoSuchItem {
                kind: item.kind,
                index: item.index,
            }),
        }
    }

    fn select(&mut self, kind: ItemKind, all: bool) -> bool {
        let (set, len) = match kind {
            ItemKind::Video => (&mut self.selected_videos, self.search.videos.len()),
            ItemKind::Course => (&mut self.selected_courses, self.search.courses.len()),
            ItemKind::Subtopic => return false,
        };
        *set = if all { (0..len).collect() } else { BTreeSet::new() };
        true
    }

    fn request(&self, topic: &str) -> PathRequest {
        PathRequest {
            topic: topic.to_string(),
            videos: self
                .selected_videos
                .iter()
                .filter_map(|&i| self.search.videos.get(i).cloned())
                .collect(),
            courses: self
                .selected_courses
                .iter()
                .filter_map(|&i| self.search.courses.get(i).cloned())
                .collect(),
            duration: self.duration,
        }
    }
}

/// Suggested subtopics and which of them the learner picked.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionsStage {
    pub suggestions: TopicSuggestions,
    pub selected: BTreeSet<usize>,
    pub duration: u32,
}

impl SuggestionsStage {
    fn new(suggestions: TopicSuggestions, duration: u32) -> Self {
        Self {
            selected: (0..suggestions.subtopics.len()).collect(),
            suggestions,
            duration,
        }
    }

    fn toggle(&mut self, item: ItemRef) -> Result<(), Rejection> {
        match item.kind {
            ItemKind::Subtopic => toggle_index(
                &mut self.selected,
                item.index,
                self.suggestions.subtopics.len(),
                item.kind,
            ),
            _ => Err(Rejection::NoSuchItem {
                kind: item.kind,
                index: item.index,
            }),
        }
    }

    fn select(&mut self, kind: ItemKind, all: bool) -> bool {
        if kind != ItemKind::Subtopic {
            return false;
        }
        self.selected = if all {
            (0..self.suggestions.subtopics.len()).collect()
        } else {
            BTreeSet::new()
        };
        true
    }

    fn request(&self, topic: &str) -> TutorialRequest {
        TutorialRequest {
            topic: topic.to_string(),
            subtopics: self
                .selected
                .iter()
                .filter_map(|&i| self.suggestions.subtopics.get(i))
                .map(|s| s.name.clone())
                .collect(),
            duration: self.duration,
        }
    }
}

/// Progress through the quiz: one confirmed answer per question, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizStage {
    pub questions: Vec<QuizQuestion>,
    pub current: usize,
    pub selected: Option<usize>,
    pub confirmed: bool,
    pub answers: Vec<QuizAnswer>,
}

impl QuizStage {
    fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions,
            current: 0,
            selected: None,
            confirmed: false,
            answers: Vec::new(),
        }
    }

    pub fn question(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.current)
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.questions.len()
    }

    /// Share of questions already behind the learner, 0–100.
    pub fn progress_percent(&self) -> u8 {
        if self.questions.is_empty() {
            return 0;
        }
        rounded_percent(self.current, self.questions.len())
    }

    fn select(&mut self, option: usize) -> Result<(), Rejection> {
        if self.confirmed {
            return Err(Rejection::AlreadyConfirmed);
        }
        let options = self.question().map_or(0, |q| q.options.len());
        if option >= options {
            return Err(Rejection::NoSuchOption(option));
        }
        self.selected = Some(option);
        Ok(())
    }

    fn confirm(&mut self) -> Result<(), Rejection> {
        if self.confirmed {
            return Err(Rejection::AlreadyConfirmed);
        }
        let selected = self.selected.ok_or(Rejection::NothingChosen)?;
        let correct = self.question().map(|q| q.correct);
        self.answers.push(QuizAnswer {
            selected,
            is_correct: Some(selected) == correct,
        });
        self.confirmed = true;
        Ok(())
    }

    /// Move to the next question. Returns the full answer list once the last
    /// question has been confirmed.
    fn advance(&mut self) -> Result<Option<Vec<QuizAnswer>>, Rejection> {
        if !self.confirmed {
            return Err(Rejection::NotConfirmed);
        }
        if self.is_last() {
            return Ok(Some(self.answers.clone()));
        }
        self.current += 1;
        self.selected = None;
        self.confirmed = false;
        Ok(None)
    }
}

/// The current stage, carrying only the data that stage needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Landing,
    Resources(ResourcesStage),
    Suggestions(SuggestionsStage),
    Path(LearningPath),
    Tutorial(Tutorial),
    Quiz(QuizStage),
    Result(BenchmarkResult),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Landing => "landing",
            Stage::Resources(_) => "resources",
            Stage::Suggestions(_) => "suggestions",
            Stage::Path(_) => "path",
            Stage::Tutorial(_) => "tutorial",
            Stage::Quiz(_) => "quiz",
            Stage::Result(_) => "result",
        }
    }
}

// ---------------------------------------------------------------------------
// Events, commands, rejections
// ---------------------------------------------------------------------------

/// Inputs to the state machine: user actions and request completions.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    SubmitTopic(String),
    Toggle(ItemRef),
    SelectAll(ItemKind),
    SelectNone(ItemKind),
    SetDuration(u32),
    Generate,
    StartQuiz,
    SelectOption(usize),
    ConfirmAnswer,
    NextQuestion,
    Reset,

    ResourcesLoaded(ResourceSearch),
    SuggestionsLoaded(TopicSuggestions),
    PathGenerated(LearningPath),
    TutorialGenerated(Tutorial),
    Graded(BenchmarkResult),
    RequestFailed(String),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::SubmitTopic(_) => "submit-topic",
            Event::Toggle(_) => "toggle",
            Event::SelectAll(_) => "select-all",
            Event::SelectNone(_) => "select-none",
            Event::SetDuration(_) => "set-duration",
            Event::Generate => "generate",
            Event::StartQuiz => "start-quiz",
            Event::SelectOption(_) => "select-option",
            Event::ConfirmAnswer => "confirm-answer",
            Event::NextQuestion => "next-question",
            Event::Reset => "reset",
            Event::ResourcesLoaded(_) => "resources-loaded",
            Event::SuggestionsLoaded(_) => "suggestions-loaded",
            Event::PathGenerated(_) => "path-generated",
            Event::TutorialGenerated(_) => "tutorial-generated",
            Event::Graded(_) => "graded",
            Event::RequestFailed(_) => "request-failed",
        }
    }

    /// Whether this event reports the outcome of a [`Command`].
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            Event::ResourcesLoaded(_)
                | Event::SuggestionsLoaded(_)
                | Event::PathGenerated(_)
                | Event::TutorialGenerated(_)
                | Event::Graded(_)
                | Event::RequestFailed(_)
        )
    }
}

/// Side effects requested by [`reduce`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SearchResources(TopicRequest),
    SuggestTopics(TopicRequest),
    GeneratePath(PathRequest),
    GenerateTutorial(TutorialRequest),
    Grade {
        topic: String,
        answers: Vec<QuizAnswer>,
    },
}

impl Command {
    /// Short label for progress output.
    pub fn label(&self) -> &'static str {
        match self {
            Command::SearchResources(_) => "searching for videos and courses",
            Command::SuggestTopics(_) => "suggesting subtopics",
            Command::GeneratePath(_) => "building your learning path",
            Command::GenerateTutorial(_) => "writing your tutorial",
            Command::Grade { .. } => "grading your quiz",
        }
    }
}

/// Why an event was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("a request is already in progress")]
    Busy,
    #[error("no request is in progress")]
    NotPending,
    #[error("enter a topic first")]
    EmptyTopic,
    #[error("select at least one item")]
    NothingSelected,
    #[error("study time must be at least one minute")]
    ZeroDuration,
    #[error("there is no {kind} #{}", .index + 1)]
    NoSuchItem { kind: ItemKind, index: usize },
    #[error("the generated content has no quiz")]
    NoQuiz,
    #[error("there is no option #{}", .0 + 1)]
    NoSuchOption(usize),
    #[error("choose an option first")]
    NothingChosen,
    #[error("this answer is already confirmed")]
    AlreadyConfirmed,
    #[error("confirm your answer first")]
    NotConfirmed,
    #[error("'{event}' is not valid on the {stage} stage")]
    InvalidEvent {
        event: &'static str,
        stage: &'static str,
    },
}

// ---------------------------------------------------------------------------
// State and reducer
// ---------------------------------------------------------------------------

/// One wizard session. Lives in memory only.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    pub mode: WizardMode,
    pub stage: Stage,
    /// Topic the session is about; empty until a topic is submitted.
    pub topic: String,
    /// A command was issued and its completion has not arrived yet.
    pub pending: bool,
    /// Message from the last failed request, cleared by the next request.
    pub error: Option<String>,
    /// Study time preselected on the selection stage.
    pub default_duration: u32,
}

/// Result of a successful [`reduce`].
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: WizardState,
    pub command: Option<Command>,
}

impl WizardState {
    pub fn new(mode: WizardMode) -> Self {
        Self {
            mode,
            stage: Stage::Landing,
            topic: String::new(),
            pending: false,
            error: None,
            default_duration: DEFAULT_DURATION_MINUTES,
        }
    }

    pub fn with_default_duration(mut self, minutes: u32) -> Self {
        self.default_duration = minutes.max(1);
        self
    }

    /// A fresh landing state that keeps only the session settings.
    pub fn reset(&self) -> Self {
        Self::new(self.mode).with_default_duration(self.default_duration)
    }

    fn issue(mut self, command: Command) -> Transition {
        self.pending = true;
        self.error = None;
        Transition {
            state: self,
            command: Some(command),
        }
    }

    fn settle(mut self) -> Transition {
        self.pending = false;
        Transition {
            state: self,
            command: None,
        }
    }
}

fn adopt_topic(current: &mut String, from_response: &str) {
    let trimmed = from_response.trim();
    if !trimmed.is_empty() {
        *current = trimmed.to_string();
    }
}

/// Only `Reset` passes while a request is pending, and completions only
/// pass while one is.
fn gate(state: &WizardState, event: &Event) -> Result<(), Rejection> {
    if matches!(event, Event::Reset) {
        return Ok(());
    }
    match (state.pending, event.is_completion()) {
        (true, false) => Err(Rejection::Busy),
        (false, true) => Err(Rejection::NotPending),
        _ => Ok(()),
    }
}

/// Apply `event` to `state`.
pub fn reduce(state: &WizardState, event: Event) -> Result<Transition, Rejection> {
    gate(state, &event)?;

    let invalid = Rejection::InvalidEvent {
        event: event.name(),
        stage: state.stage.name(),
    };
    let mut next = state.clone();

    match event {
        Event::Reset => Ok(next.reset().settle()),

        Event::SubmitTopic(topic) => {
            if next.stage != Stage::Landing {
                return Err(invalid);
            }
            let topic = topic.trim();
            if topic.is_empty() {
                return Err(Rejection::EmptyTopic);
            }
            next.topic = topic.to_string();
            let request = TopicRequest {
                topic: next.topic.clone(),
            };
            let command = match next.mode {
                WizardMode::Resources => Command::SearchResources(request),
                WizardMode::Tutorial => Command::SuggestTopics(request),
            };
            Ok(next.issue(command))
        }

        Event::ResourcesLoaded(search) => {
            if next.stage != Stage::Landing || next.mode != WizardMode::Resources {
                return Err(invalid);
            }
            adopt_topic(&mut next.topic, &search.topic);
            next.stage = Stage::Resources(ResourcesStage::new(search, next.default_duration));
            Ok(next.settle())
        }

        Event::SuggestionsLoaded(suggestions) => {
            if next.stage != Stage::Landing || next.mode != WizardMode::Tutorial {
                return Err(invalid);
            }
            adopt_topic(&mut next.topic, &suggestions.main_topic);
            next.stage =
                Stage::Suggestions(SuggestionsStage::new(suggestions, next.default_duration));
            Ok(next.settle())
        }

        Event::Toggle(item) => {
            match &mut next.stage {
                Stage::Resources(r) => r.toggle(item)?,
                Stage::Suggestions(s) => s.toggle(item)?,
                _ => return Err(invalid),
            }
            Ok(next.settle())
        }

        Event::SelectAll(kind) | Event::SelectNone(kind) => {
            let all = matches!(event, Event::SelectAll(_));
            let applied = match &mut next.stage {
                Stage::Resources(r) => r.select(kind, all),
                Stage::Suggestions(s) => s.select(kind, all),
                _ => false,
            };
            if !applied {
                return Err(invalid);
            }
            Ok(next.settle())
        }

        Event::SetDuration(minutes) => {
            if minutes == 0 {
                return Err(Rejection::ZeroDuration);
            }
            match &mut next.stage {
                Stage::Resources(r) => r.duration = minutes,
                Stage::Suggestions(s) => s.duration = minutes,
                _ => return Err(invalid),
            }
            Ok(next.settle())
        }

        Event::Generate => {
            let command = match &next.stage {
                Stage::Resources(r) if r.selected_count() == 0 => {
                    return Err(Rejection::NothingSelected)
                }
                Stage::Resources(r) => Command::GeneratePath(r.request(&next.topic)),
                Stage::Suggestions(s) if s.selected.is_empty() => {
                    return Err(Rejection::NothingSelected)
                }
                Stage::Suggestions(s) => Command::GenerateTutorial(s.request(&next.topic)),
                _ => return Err(invalid),
            };
            Ok(next.issue(command))
        }

        Event::PathGenerated(path) => {
            if !matches!(next.stage, Stage::Resources(_)) {
                return Err(invalid);
            }
            next.stage = Stage::Path(path);
            Ok(next.settle())
        }

        Event::TutorialGenerated(tutorial) => {
            if !matches!(next.stage, Stage::Suggestions(_)) {
                return Err(invalid);
            }
            next.stage = Stage::Tutorial(tutorial);
            Ok(next.settle())
        }

        Event::StartQuiz => {
            let questions = match &next.stage {
                Stage::Path(path) => path.quiz.clone(),
                Stage::Tutorial(tutorial) => tutorial.quiz.clone(),
                _ => return Err(invalid),
            };
            if questions.is_empty() {
                return Err(Rejection::NoQuiz);
            }
            next.stage = Stage::Quiz(QuizStage::new(questions));
            Ok(next.settle())
        }

        Event::SelectOption(option) => {
            let Stage::Quiz(quiz) = &mut next.stage else {
                return Err(invalid);
            };
            quiz.select(option)?;
            Ok(next.settle())
        }

        Event::ConfirmAnswer => {
            let Stage::Quiz(quiz) = &mut next.stage else {
                return Err(invalid);
            };
            quiz.confirm()?;
            Ok(next.settle())
        }

        Event::NextQuestion => {
            let Stage::Quiz(quiz) = &mut next.stage else {
                return Err(invalid);
            };
            match quiz.advance()? {
                Some(answers) => {
                    let topic = next.topic.clone();
                    Ok(next.issue(Command::Grade { topic, answers }))
                }
                None => Ok(next.settle()),
            }
        }

        Event::Graded(result) => {
            if !matches!(next.stage, Stage::Quiz(_)) {
                return Err(invalid);
            }
            next.stage = Stage::Result(result);
            Ok(next.settle())
        }

        Event::RequestFailed(message) => {
            next.error = Some(message);
            Ok(next.settle())
        }
    }
}
