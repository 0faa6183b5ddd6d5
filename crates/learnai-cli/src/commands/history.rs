//! The `learnai history` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use learnai_client::config::LearnaiConfig;
use learnai_core::grading::summarize;
use learnai_core::model::TopicKey;
use learnai_core::traits::ScoreStore;

use super::score_store;

pub fn execute(config: &LearnaiConfig, topic: &str) -> Result<()> {
    let topic = topic.trim();
    let store = score_store(config);
    let history = store.history(topic);

    let Some(stats) = summarize(&history) else {
        println!("No scores recorded for '{topic}' yet.");
        return Ok(());
    };

    let scores: Vec<String> = history.iter().map(|s| s.to_string()).collect();
    let best = history.iter().max().map(|s| s.value()).unwrap_or_default();

    println!("Topic key: {}", TopicKey::new(topic));
    let mut table = Table::new();
    table.set_header(vec!["Attempts", "Q1", "Median", "Q3", "Best", "Scores"]);
    table.add_row(vec![
        Cell::new(stats.n),
        Cell::new(stats.q1),
        Cell::new(stats.median),
        Cell::new(stats.q3),
        Cell::new(best),
        Cell::new(scores.join(", ")),
    ]);
    println!("{table}");
    Ok(())
}
