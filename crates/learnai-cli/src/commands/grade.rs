//! The `learnai grade` command.

use anyhow::Result;

use learnai_client::config::LearnaiConfig;
use learnai_core::grading::{benchmark, grade, tally};
use learnai_core::model::QuizAnswer;
use learnai_core::traits::ScoreStore;

use super::{result_blurb, result_table, score_store};

/// Parse one correctness flag: `1`/`0`, `true`/`false`, `y`/`n`.
pub fn parse_flag(s: &str) -> Result<bool, String> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "y" | "yes" => Ok(true),
        "0" | "false" | "n" | "no" => Ok(false),
        other => Err(format!("expected 1 or 0, got '{other}'")),
    }
}

pub fn execute(config: &LearnaiConfig, topic: &str, flags: &[bool], no_record: bool) -> Result<()> {
    let topic = topic.trim();
    anyhow::ensure!(!topic.is_empty(), "topic must not be empty");

    let answers: Vec<QuizAnswer> = flags
        .iter()
        .map(|&is_correct| QuizAnswer {
            selected: 0,
            is_correct,
        })
        .collect();

    let store = score_store(config);
    let result = if no_record {
        let t = tally(&answers)?;
        let mut history = store.history(topic);
        history.push(t.score);
        benchmark(t, &history)
    } else {
        grade(&store, topic, &answers)?
    };

    println!("{}", result_table(&result));
    println!("{}", result_blurb(&result));
    if no_record {
        println!("(not recorded)");
    }
    Ok(())
}
