pub mod grade;
pub mod history;
pub mod init;
pub mod leaderboard;
pub mod learn;
pub mod whoami;

use std::path::{Path, PathBuf};

use anyhow::Result;
use comfy_table::{Cell, Table};

use learnai_client::config::{load_config_from, LearnaiConfig};
use learnai_core::model::BenchmarkResult;
use learnai_core::store::{FileStorage, LocalScoreStore};

/// Load configuration, letting `--data-dir` win over every other source.
pub fn load_settings(config_path: Option<&Path>, data_dir: Option<PathBuf>) -> Result<LearnaiConfig> {
    let mut config = load_config_from(config_path)?;
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    tracing::debug!(data_dir = %config.data_dir.display(), base_url = %config.base_url, "settings loaded");
    Ok(config)
}

pub fn score_store(config: &LearnaiConfig) -> LocalScoreStore<FileStorage> {
    LocalScoreStore::new(config.storage())
}

/// Benchmark summary shown after a quiz.
pub fn result_table(result: &BenchmarkResult) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Score", "Correct", "Proficiency", "Percentile", "Q1", "Median", "Q3", "Attempts"]);
    table.add_row(vec![
        Cell::new(format!("{}%", result.score)),
        Cell::new(format!("{}/{}", result.correct, result.total)),
        Cell::new(result.proficiency),
        Cell::new(format!("{}%", result.percentile)),
        Cell::new(result.stats.q1),
        Cell::new(result.stats.median),
        Cell::new(result.stats.q3),
        Cell::new(result.stats.n),
    ]);
    table
}

/// One-line reading of a result for the learner.
pub fn result_blurb(result: &BenchmarkResult) -> String {
    if result.stats.n <= 1 {
        format!(
            "{} Not enough attempts yet to compare against.",
            result.proficiency.description()
        )
    } else {
        format!(
            "{} You scored better than {}% of attempts.",
            result.proficiency.description(),
            result.percentile
        )
    }
}
