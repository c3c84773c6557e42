//! Configuration loading.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::Difficulty;
use crate::session::SessionPlan;

/// Top-level sqlgrade configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlgradeConfig {
    /// Question bank file or directory.
    #[serde(default = "default_question_bank")]
    pub question_bank: PathBuf,
    /// Where submissions are saved.
    #[serde(default = "default_submissions_dir")]
    pub submissions_dir: PathBuf,
    /// Shuffle question order per candidate.
    #[serde(default = "default_true")]
    pub shuffle: bool,
    /// Questions to draw per difficulty. Empty asks every question.
    #[serde(default)]
    pub questions_per_difficulty: BTreeMap<Difficulty, usize>,
}

fn default_question_bank() -> PathBuf {
    PathBuf::from("./question-banks")
}
fn default_submissions_dir() -> PathBuf {
    PathBuf::from("./submissions")
}
fn default_true() -> bool {
    true
}

impl Default for SqlgradeConfig {
    fn default() -> Self {
        Self {
            question_bank: default_question_bank(),
            submissions_dir: default_submissions_dir(),
            shuffle: true,
            questions_per_difficulty: BTreeMap::new(),
        }
    }
}

impl SqlgradeConfig {
    /// The session plan described by this configuration.
    pub fn session_plan(&self) -> SessionPlan {
        SessionPlan {
            shuffle: self.shuffle,
            per_difficulty: self.questions_per_difficulty.clone(),
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

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `sqlgrade.toml` in the current directory
/// 2. `~/.config/sqlgrade/config.toml`
///
/// Environment variable overrides: `SQLGRADE_QUESTION_BANK`,
/// `SQLGRADE_SUBMISSIONS_DIR`.
pub fn load_config() -> Result<SqlgradeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<SqlgradeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("sqlgrade.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match &config_path {
        Some(path) => parse_config_file(path)?,
        None => SqlgradeConfig::default(),
    };

    if let Ok(bank) = std::env::var("SQLGRADE_QUESTION_BANK") {
        config.question_bank = PathBuf::from(bank);
    }
    if let Ok(dir) = std::env::var("SQLGRADE_SUBMISSIONS_DIR") {
        config.submissions_dir = PathBuf::from(dir);
    }

    config.question_bank = resolve_path(&config.question_bank);
    config.submissions_dir = resolve_path(&config.submissions_dir);

    tracing::debug!(
        source = ?config_path,
        bank = %config.question_bank.display(),
        submissions = %config.submissions_dir.display(),
        "loaded configuration"
    );
    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<SqlgradeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<SqlgradeConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("sqlgrade"))
}
