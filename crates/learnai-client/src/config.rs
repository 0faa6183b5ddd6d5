//! LearnAI configuration and client factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use learnai_core::engine::GradingMode;
use learnai_core::store::FileStorage;
use learnai_core::traits::LearnApi;
use learnai_core::wizard::{WizardMode, DEFAULT_DURATION_MINUTES};

use crate::http::{HttpClient, DEFAULT_BASE_URL};

/// Top-level LearnAI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnaiConfig {
    /// Root URL of the LearnAI service.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout. Unset means wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Wizard flavour used when `learn` is not given `--mode`.
    #[serde(default)]
    pub mode: WizardMode,
    /// Where quizzes are graded when `learn` is not given `--grading`.
    #[serde(default)]
    pub grading: GradingMode,
    /// Directory holding the score history and user id.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Study time preselected before generating content.
    #[serde(default = "default_duration")]
    pub default_duration_minutes: u32,
    /// Largest value the store may write, in bytes.
    #[serde(default)]
    pub storage_quota_bytes: Option<usize>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_data_dir() -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(".local").join("share").join("learnai"))
        .unwrap_or_else(|_| PathBuf::from(".learnai"))
}
fn default_duration() -> u32 {
    DEFAULT_DURATION_MINUTES
}

impl Default for LearnaiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
            mode: WizardMode::default(),
            grading: GradingMode::default(),
            data_dir: default_data_dir(),
            default_duration_minutes: default_duration(),
            storage_quota_bytes: None,
        }
    }
}

impl LearnaiConfig {
    /// Key-value storage rooted at `data_dir`.
    pub fn storage(&self) -> FileStorage {
        let storage = FileStorage::new(&self.data_dir);
        match self.storage_quota_bytes {
            Some(bytes) => storage.with_quota(bytes),
            None => storage,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load config from an explicit path, or search the well-known locations.
///
/// Search order when `path` is `None`:
/// 1. `learnai.toml` in the current directory
/// 2. `~/.config/learnai/config.toml`
///
/// Environment variable overrides: `LEARNAI_API_URL`, `LEARNAI_DATA_DIR`.
pub fn load_config_from(path: Option<&Path>) -> Result<LearnaiConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("learnai.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<LearnaiConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => LearnaiConfig::default(),
    };

    // Apply env var overrides
    if let Ok(url) = std::env::var("LEARNAI_API_URL") {
        if !url.trim().is_empty() {
            config.base_url = url;
        }
    }
    if let Ok(dir) = std::env::var("LEARNAI_DATA_DIR") {
        if !dir.trim().is_empty() {
            config.data_dir = PathBuf::from(dir);
        }
    }

    config.base_url = resolve_env_vars(&config.base_url);
    if config.base_url.trim().is_empty() {
        config.base_url = default_base_url();
    }
    config.data_dir = PathBuf::from(resolve_env_vars(&config.data_dir.to_string_lossy()));

    if config.default_duration_minutes == 0 {
        anyhow::bail!("default_duration_minutes must be at least 1");
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("learnai"))
}

/// Create the API client described by `config`.
pub fn create_client(config: &LearnaiConfig) -> Result<Box<dyn LearnApi>> {
    let client = HttpClient::new(&config.base_url, config.timeout_secs)
        .with_context(|| format!("failed to create client for {}", config.base_url))?;
    Ok(Box::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_LEARNAI_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_LEARNAI_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_LEARNAI_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${unterminated"), "${unterminated");
        std::env::remove_var("_LEARNAI_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = LearnaiConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, None);
        assert_eq!(config.mode, WizardMode::Resources);
        assert_eq!(config.grading, GradingMode::Local);
        assert_eq!(config.default_duration_minutes, 60);
    }

    #[test]
    fn parse_partial_config() {
        let toml_str = r#"
base_url = "http://localhost:8000"
mode = "tutorial"
grading = "remote"
timeout_secs = 30
"#;
        let config: LearnaiConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.mode, WizardMode::Tutorial);
        assert_eq!(config.grading, GradingMode::Remote);
        assert_eq!(config.timeout_secs, Some(30));
        assert_eq!(config.default_duration_minutes, 60);
    }

    #[test]
    fn load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learnai.toml");
        let data_dir = dir.path().join("data");
        std::fs::write(
            &path,
            format!(
                "data_dir = {:?}\ndefault_duration_minutes = 45\nstorage_quota_bytes = 1024\n",
                data_dir.to_string_lossy()
            ),
        )
        .unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.default_duration_minutes, 45);
        assert_eq!(config.storage().dir(), data_dir.as_path());
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = load_config_from(Some(Path::new("/nonexistent/learnai.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn unset_variable_falls_back_to_default_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learnai.toml");
        std::fs::write(&path, "base_url = \"${_LEARNAI_SURELY_UNSET}\"\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        if std::env::var("LEARNAI_API_URL").is_err() {
            assert_eq!(config.base_url, DEFAULT_BASE_URL);
        }
    }

    #[test]
    fn zero_duration_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learnai.toml");
        std::fs::write(&path, "default_duration_minutes = 0\n").unwrap();
        assert!(load_config_from(Some(&path)).is_err());
    }

    #[test]
    fn create_client_uses_base_url() {
        let config = LearnaiConfig {
            base_url: "http://localhost:8000/".into(),
            ..LearnaiConfig::default()
        };
        let client = create_client(&config).unwrap();
        assert_eq!(client.name(), "http");
    }
}
