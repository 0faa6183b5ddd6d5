//! Saved quiz results with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::GradingMode;
use crate::model::BenchmarkResult;
use crate::wizard::WizardMode;

/// The outcome of one finished wizard session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Topic as the learner last saw it.
    pub topic: String,
    pub mode: WizardMode,
    pub grading: GradingMode,
    pub result: BenchmarkResult,
}

impl SessionReport {
    pub fn new(topic: &str, mode: WizardMode, grading: GradingMode, result: BenchmarkResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            topic: topic.to_string(),
            mode,
            grading,
            result,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SessionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
