//! TOML question bank parser.
//!
//! Loads question banks from TOML files and directories, and validates them.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Difficulty, Question, QuestionBank, QuestionKind, TableInfo};
use crate::normalize::normalize;

/// Intermediate TOML structure for parsing question bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: u32,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default = "default_kind")]
    kind: String,
    #[serde(default)]
    solution: Option<String>,
    #[serde(default)]
    choices: Vec<String>,
    #[serde(default)]
    answer: Option<usize>,
    #[serde(default)]
    relationship: Option<String>,
    #[serde(default)]
    tables: Vec<TomlTable>,
}

#[derive(Debug, Deserialize)]
struct TomlTable {
    table: String,
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    sample: Option<String>,
}

fn default_kind() -> String {
    "sql".to_string()
}

/// Parse a single TOML file into a `QuestionBank`.
pub fn parse_question_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    parse_question_bank_str(&content, path)
}

/// Parse a TOML string into a `QuestionBank` (useful for testing).
pub fn parse_question_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(convert_question)
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("invalid question in {}", source_path.display()))?;

    Ok(QuestionBank {
        id: parsed.bank.id,
        name: parsed.bank.name,
        description: parsed.bank.description,
        questions,
    })
}

fn convert_question(q: TomlQuestion) -> Result<Question> {
    let difficulty = q
        .difficulty
        .map(|d| d.parse::<Difficulty>().map_err(|e| anyhow::anyhow!("{}", e)))
        .transpose()?
        .unwrap_or_default();

    let kind = match q.kind.as_str() {
        "sql" => QuestionKind::Sql {
            solution: q
                .solution
                .with_context(|| format!("question {} has no solution", q.id))?,
        },
        "multiple_choice" => QuestionKind::MultipleChoice {
            answer: q
                .answer
                .with_context(|| format!("question {} has no answer index", q.id))?,
            choices: q.choices,
        },
        other => anyhow::bail!("question {}: unknown kind '{}'", q.id, other),
    };

    let tables = q
        .tables
        .into_iter()
        .map(|t| TableInfo {
            table: t.table,
            columns: t.columns,
            sample: t.sample,
        })
        .collect();

    Ok(Question {
        id: q.id,
        title: q.title,
        description: q.description,
        difficulty,
        tables,
        relationship: q.relationship,
        kind,
    })
}

/// Load a bank from a file, or every bank found under a directory.
pub fn load_banks(path: &Path) -> Result<Vec<QuestionBank>> {
    if path.is_dir() {
        load_bank_directory(path)
    } else {
        Ok(vec![parse_question_bank(path)?])
    }
}

/// Recursively load all `.toml` question bank files from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_question_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// A warning from question bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<u32>,
    /// Warning message.
    pub message: String,
}

/// Validate a question bank for common issues.
pub fn validate_question_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut warn = |id: Option<u32>, message: String| {
        warnings.push(ValidationWarning {
            question_id: id,
            message,
        })
    };

    if bank.questions.is_empty() {
        warn(None, "bank has no questions".into());
    }

    let mut seen_ids = HashSet::new();
    for q in &bank.questions {
        if !seen_ids.insert(q.id) {
            warn(Some(q.id), format!("duplicate question ID: {}", q.id));
        }
    }

    for q in &bank.questions {
        if q.title.trim().is_empty() {
            warn(Some(q.id), "title is empty".into());
        }
    }

    // Two SQL questions with the same canonical answer are almost always a
    // copy-paste mistake in the bank.
    let mut seen_solutions: HashMap<String, u32> = HashMap::new();
    for q in &bank.questions {
        match &q.kind {
            QuestionKind::Sql { solution } => {
                if solution.trim().is_empty() {
                    warn(Some(q.id), "solution is empty".into());
                    continue;
                }
                let normalized = normalize(solution).into_string();
                if let Some(first) = seen_solutions.get(&normalized) {
                    warn(
                        Some(q.id),
                        format!("solution duplicates question {first}: {normalized}"),
                    );
                } else {
                    seen_solutions.insert(normalized, q.id);
                }
            }
            QuestionKind::MultipleChoice { choices, answer } => {
                if choices.len() < 2 {
                    warn(
                        Some(q.id),
                        format!("needs at least 2 choices, has {}", choices.len()),
                    );
                }
                if *answer >= choices.len() {
                    warn(
                        Some(q.id),
                        format!("answer index {answer} is out of range"),
                    );
                }
            }
        }
    }

    warnings
}
