//! The `learnai learn` command: the interactive wizard.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use learnai_client::config::{create_client, LearnaiConfig};
use learnai_core::engine::{GradingMode, ProgressReporter, WizardEngine};
use learnai_core::model::{LearningPath, Tutorial};
use learnai_core::report::SessionReport;
use learnai_core::store::{anonymous_user_id, LocalScoreStore};
use learnai_core::traits::LearnApi;
use learnai_core::wizard::{
    Event, ItemKind, ItemRef, QuizStage, ResourcesStage, Stage, SuggestionsStage, WizardMode,
    WizardState,
};

use super::{result_blurb, result_table};

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_request_start(&self, label: &str) {
        eprintln!("  {label}...");
    }

    fn on_request_complete(&self, _: &str) {}

    fn on_request_error(&self, _: &str, error: &str) {
        eprintln!("  Error: {error}");
    }
}

pub async fn execute(
    config: &LearnaiConfig,
    topic: Option<String>,
    mode: Option<WizardMode>,
    grading: Option<GradingMode>,
    save_report: Option<PathBuf>,
) -> Result<()> {
    let storage = config.storage();
    let user_id = anonymous_user_id(&storage);
    let store = Arc::new(LocalScoreStore::new(storage));
    let api: Arc<dyn LearnApi> = Arc::from(create_client(config)?);

    let state = WizardState::new(mode.unwrap_or(config.mode))
        .with_default_duration(config.default_duration_minutes);
    let mut engine = WizardEngine::new(
        api,
        store,
        grading.unwrap_or(config.grading),
        user_id,
        state,
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    let report = run_wizard(
        &mut engine,
        topic,
        &mut stdin.lock(),
        &mut stdout.lock(),
        &ConsoleReporter,
    )
    .await?;

    match (report, save_report) {
        (Some(report), Some(path)) => {
            report.save_json(&path)?;
            eprintln!("Report saved to: {}", path.display());
        }
        (None, Some(_)) => eprintln!("No quiz was finished, so no report was written."),
        _ => {}
    }
    Ok(())
}

/// What the learner asked for at a prompt.
enum Step {
    Quit,
    Send(Vec<Event>),
    Answer(usize),
    /// Input was not understood; ask again.
    Again,
}

/// Drive `engine` from line-based input until the learner quits or input
/// ends. Returns the report of the last finished quiz, if any.
pub async fn run_wizard<R: BufRead, W: Write>(
    engine: &mut WizardEngine,
    mut topic: Option<String>,
    input: &mut R,
    out: &mut W,
    progress: &dyn ProgressReporter,
) -> Result<Option<SessionReport>> {
    let mut last_report = None;

    loop {
        let step = {
            let state = engine.state();
            match &state.stage {
                Stage::Landing => {
                    let entered = match topic.take() {
                        Some(t) => Some(t),
                        None => prompt(input, out, "What do you want to learn? ")?,
                    };
                    match entered {
                        Some(t) => Step::Send(vec![Event::SubmitTopic(t)]),
                        None => Step::Quit,
                    }
                }
                Stage::Resources(r) => {
                    show_resources(out, &state.topic, r)?;
                    selection_step(
                        input,
                        out,
                        &[ItemKind::Video, ItemKind::Course],
                        "v1/c1 toggles an item, all, none, time <minutes>, Enter builds your path, reset starts over, q quits: ",
                    )?
                }
                Stage::Suggestions(s) => {
                    show_suggestions(out, s)?;
                    selection_step(
                        input,
                        out,
                        &[ItemKind::Subtopic],
                        "1..n toggles a subtopic, all, none, time <minutes>, Enter writes your tutorial, reset starts over, q quits: ",
                    )?
                }
                Stage::Path(path) => {
                    show_path(out, path)?;
                    continue_step(input, out)?
                }
                Stage::Tutorial(tutorial) => {
                    show_tutorial(out, tutorial)?;
                    continue_step(input, out)?
                }
                Stage::Quiz(quiz) => {
                    show_question(out, quiz)?;
                    let count = quiz.question().map_or(0, |q| q.options.len());
                    match prompt(input, out, &format!("Your answer (1-{count}): "))? {
                        None => Step::Quit,
                        Some(line) if line.eq_ignore_ascii_case("q") => Step::Quit,
                        Some(line) => match line.parse::<usize>() {
                            Ok(n) if n >= 1 => Step::Answer(n - 1),
                            _ => {
                                writeln!(out, "  Enter the number of an option.")?;
                                Step::Again
                            }
                        },
                    }
                }
                Stage::Result(result) => {
                    writeln!(out, "\nResults for \"{}\"", state.topic)?;
                    writeln!(out, "{}", result_table(result))?;
                    writeln!(out, "{}", result_blurb(result))?;
                    last_report = engine.report();
                    match prompt(
                        input,
                        out,
                        "Type 'again' to learn something new, or press Enter to finish: ",
                    )? {
                        Some(line) if line.eq_ignore_ascii_case("again") => {
                            Step::Send(vec![Event::Reset])
                        }
                        _ => Step::Quit,
                    }
                }
            }
        };

        match step {
            Step::Quit => break,
            Step::Again => {}
            Step::Send(events) => {
                for event in events {
                    if let Err(rejection) = engine.dispatch(event, progress).await {
                        writeln!(out, "  {rejection}")?;
                        break;
                    }
                }
            }
            Step::Answer(option) => answer(engine, option, out, progress).await?,
        }
    }

    Ok(last_report)
}

async fn answer<W: Write>(
    engine: &mut WizardEngine,
    option: usize,
    out: &mut W,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    for event in [Event::SelectOption(option), Event::ConfirmAnswer] {
        if let Err(rejection) = engine.dispatch(event, progress).await {
            writeln!(out, "  {rejection}")?;
            return Ok(());
        }
    }

    if let Stage::Quiz(quiz) = &engine.state().stage {
        let correct = quiz.answers.last().is_some_and(|a| a.is_correct);
        if let Some(q) = quiz.question() {
            if correct {
                writeln!(out, "  Correct!")?;
            } else {
                let right = q.options.get(q.correct).map(String::as_str).unwrap_or("?");
                writeln!(out, "  Not quite. The answer was: {right}")?;
            }
            if !q.explanation.is_empty() {
                writeln!(out, "  {}", q.explanation)?;
            }
        }
    }

    if let Err(rejection) = engine.dispatch(Event::NextQuestion, progress).await {
        writeln!(out, "  {rejection}")?;
    }
    Ok(())
}

fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, text: &str) -> Result<Option<String>> {
    write!(out, "{text}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn continue_step<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Step> {
    Ok(
        match prompt(
            input,
            out,
            "Press Enter to take the quiz, reset to start over, or q to quit: ",
        )? {
            Some(line) if line.eq_ignore_ascii_case("q") => Step::Quit,
            Some(line) if is_start_over(&line) => Step::Send(vec![Event::Reset]),
            Some(_) => Step::Send(vec![Event::StartQuiz]),
            None => Step::Quit,
        },
    )
}

fn selection_step<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    kinds: &[ItemKind],
    help: &str,
) -> Result<Step> {
    let Some(line) = prompt(input, out, help)? else {
        return Ok(Step::Quit);
    };
    if line.eq_ignore_ascii_case("q") {
        return Ok(Step::Quit);
    }
    match parse_selection(&line, kinds) {
        Ok(events) => Ok(Step::Send(events)),
        Err(message) => {
            writeln!(out, "  {message}")?;
            Ok(Step::Again)
        }
    }
}

fn is_start_over(word: &str) -> bool {
    ["reset", "back", "home"]
        .iter()
        .any(|w| word.eq_ignore_ascii_case(w))
}

/// Turn a selection-stage command line into wizard events. An empty line
/// means "generate".
fn parse_selection(line: &str, kinds: &[ItemKind]) -> Result<Vec<Event>, String> {
    if is_start_over(line) {
        return Ok(vec![Event::Reset]);
    }
    let mut tokens = line.split_whitespace();
    let mut events = Vec::new();

    while let Some(token) = tokens.next() {
        let lower = token.to_lowercase();
        match lower.as_str() {
            "all" => events.extend(kinds.iter().map(|&k| Event::SelectAll(k))),
            "none" => events.extend(kinds.iter().map(|&k| Event::SelectNone(k))),
            "time" => {
                let minutes = tokens
                    .next()
                    .and_then(|m| m.parse::<u32>().ok())
                    .ok_or_else(|| "usage: time <minutes>".to_string())?;
                events.push(Event::SetDuration(minutes));
            }
            _ => events.push(Event::Toggle(parse_item(&lower, kinds)?)),
        }
    }

    if events.is_empty() {
        events.push(Event::Generate);
    }
    Ok(events)
}

fn parse_item(token: &str, kinds: &[ItemKind]) -> Result<ItemRef, String> {
    let (kind, digits) = match token.split_at(token.find(|c: char| c.is_ascii_digit()).unwrap_or(0)) {
        ("v", n) if kinds.contains(&ItemKind::Video) => (ItemKind::Video, n),
        ("c", n) if kinds.contains(&ItemKind::Course) => (ItemKind::Course, n),
        ("", n) if kinds.contains(&ItemKind::Subtopic) => (ItemKind::Subtopic, n),
        _ => return Err(format!("unrecognised input '{token}'")),
    };
    match digits.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(ItemRef { kind, index: n - 1 }),
        _ => Err(format!("unrecognised input '{token}'")),
    }
}

fn mark(selected: bool) -> &'static str {
    if selected {
        "[x]"
    } else {
        "[ ]"
    }
}

fn show_resources<W: Write>(out: &mut W, topic: &str, r: &ResourcesStage) -> io::Result<()> {
    writeln!(out, "\nResources for \"{topic}\"")?;
    if !r.search.videos.is_empty() {
        writeln!(out, " Videos:")?;
        for (i, video) in r.search.videos.iter().enumerate() {
            let on = r.selected_videos.contains(&i);
            writeln!(out, "  {} v{}  {}  <{}>", mark(on), i + 1, video.title, video.url)?;
        }
    }
    if !r.search.courses.is_empty() {
        writeln!(out, " Courses:")?;
        for (i, course) in r.search.courses.iter().enumerate() {
            let on = r.selected_courses.contains(&i);
            let platform = course
                .platform
                .as_deref()
                .map(|p| format!(" ({p})"))
                .unwrap_or_default();
            writeln!(
                out,
                "  {} c{}  {}{}  <{}>",
                mark(on),
                i + 1,
                course.title,
                platform,
                course.url
            )?;
        }
    }
    writeln!(
        out,
        " Study time: {} min, {} selected",
        r.duration,
        r.selected_count()
    )
}

fn show_suggestions<W: Write>(out: &mut W, s: &SuggestionsStage) -> io::Result<()> {
    writeln!(out, "\n{}", s.suggestions.main_topic)?;
    if !s.suggestions.description.is_empty() {
        writeln!(out, "{}", s.suggestions.description)?;
    }
    for (i, sub) in s.suggestions.subtopics.iter().enumerate() {
        writeln!(
            out,
            "  {} {}. {} ({:?}, {} min)",
            mark(s.selected.contains(&i)),
            i + 1,
            sub.name,
            sub.difficulty,
            sub.estimated_minutes
        )?;
    }
    if !s.suggestions.related_topics.is_empty() {
        writeln!(out, " Related: {}", s.suggestions.related_topics.join(", "))?;
    }
    writeln!(
        out,
        " Study time: {} min, {} selected",
        s.duration,
        s.selected.len()
    )
}

fn show_path<W: Write>(out: &mut W, path: &LearningPath) -> io::Result<()> {
    writeln!(out, "\n{}", path.title.as_deref().unwrap_or("Your learning path"))?;
    if let Some(overview) = &path.overview {
        writeln!(out, "{overview}")?;
    }
    for (i, phase) in path.phases.iter().enumerate() {
        writeln!(out, "\nPhase {}: {}", i + 1, phase.title)?;
        if let Some(description) = &phase.description {
            writeln!(out, "  {description}")?;
        }
        for resource in &phase.resources {
            let tag = if resource.is_video() { "video" } else { "course" };
            let minutes = resource
                .estimated_minutes
                .map(|m| format!(", {m} min"))
                .unwrap_or_default();
            writeln!(out, "  - [{tag}{minutes}] {}  <{}>", resource.title, resource.url)?;
            if let Some(why) = &resource.why {
                writeln!(out, "      {why}")?;
            }
        }
    }
    if !path.key_skills.is_empty() {
        writeln!(out, "\nKey skills: {}", path.key_skills.join(", "))?;
    }
    if !path.next_steps.is_empty() {
        writeln!(out, "Next steps:")?;
        for step in &path.next_steps {
            writeln!(out, "  - {step}")?;
        }
    }
    writeln!(out, "\nQuiz: {} questions", path.quiz.len())
}

fn show_tutorial<W: Write>(out: &mut W, tutorial: &Tutorial) -> io::Result<()> {
    writeln!(out, "\n{}", tutorial.title)?;
    if !tutorial.overview.is_empty() {
        writeln!(out, "{}", tutorial.overview)?;
    }
    for (i, section) in tutorial.sections.iter().enumerate() {
        writeln!(
            out,
            "\n{}. {} ({} min)",
            i + 1,
            section.title,
            section.estimated_minutes
        )?;
        writeln!(out, "{}", section.content)?;
        for point in &section.key_points {
            writeln!(out, "  * {point}")?;
        }
    }
    if !tutorial.summary.is_empty() {
        writeln!(out, "\nSummary: {}", tutorial.summary)?;
    }
    writeln!(out, "\nQuiz: {} questions", tutorial.quiz.len())
}

fn show_question<W: Write>(out: &mut W, quiz: &QuizStage) -> io::Result<()> {
    let Some(q) = quiz.question() else {
        return Ok(());
    };
    writeln!(
        out,
        "\nQuestion {}/{} ({}% done)",
        quiz.current + 1,
        quiz.questions.len(),
        quiz.progress_percent()
    )?;
    writeln!(out, "{}", q.question)?;
    for (i, option) in q.options.iter().enumerate() {
        writeln!(out, "  {}) {option}", i + 1)?;
    }
    Ok(())
}
