//! The `learnai leaderboard` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use learnai_client::config::{create_client, LearnaiConfig};

pub async fn execute(config: &LearnaiConfig, topic: &str) -> Result<()> {
    anyhow::ensure!(!topic.trim().is_empty(), "topic must not be empty");

    let api = create_client(config)?;
    let board = api.leaderboard(topic.trim()).await?;

    if board.entries.is_empty() {
        println!("No scores yet for '{}'.", board.topic);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Score", "Date"]);
    for (rank, entry) in board.entries.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(format!("{:.0}%", entry.score)),
            Cell::new(entry.date.format("%Y-%m-%d %H:%M")),
        ]);
    }
    println!("Leaderboard: {}", board.topic);
    println!("{table}");
    Ok(())
}
