//! Submission records with JSON persistence.
//!
//! Every finished session is written as one JSON file in the submissions
//! directory. The admin view reads the whole directory back.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::{AnswerRecord, Candidate};

/// The persisted result of one completed assessment session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// Unique session identifier.
    pub session_id: Uuid,
    pub name: String,
    pub email: String,
    /// Bank the questions were drawn from.
    pub bank_id: String,
    /// When the session was finished.
    pub submitted_at: DateTime<Utc>,
    pub total_questions: usize,
    pub correct_answers: usize,
    /// Percentage of correct answers, rounded to two decimals.
    pub score_percent: f64,
    /// One record per asked question, in the order asked.
    pub answers: Vec<AnswerRecord>,
}

impl Submission {
    /// Build a submission from graded answers, computing the totals.
    pub fn new(
        session_id: Uuid,
        candidate: &Candidate,
        bank_id: impl Into<String>,
        answers: Vec<AnswerRecord>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        let total_questions = answers.len();
        let correct_answers = answers.iter().filter(|a| a.is_correct).count();
        Self {
            session_id,
            name: candidate.name.clone(),
            email: candidate.email.clone(),
            bank_id: bank_id.into(),
            submitted_at,
            total_questions,
            correct_answers,
            score_percent: score_percent(correct_answers, total_questions),
            answers,
        }
    }

    /// File name used when saving: `<email>_<YYYYmmdd_HHMMSS>.json`.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}.json",
            sanitize_file_component(&self.email),
            self.submitted_at.format("%Y%m%d_%H%M%S")
        )
    }

    /// Save the submission as JSON into `dir`, returning the written path.
    ///
    /// If a file with the same name already exists (same candidate within
    /// the same second), the session id is appended instead of overwriting.
    pub fn save_json(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;

        let mut path = dir.join(self.file_name());
        if path.exists() {
            let stem = self.file_name().trim_end_matches(".json").to_string();
            path = dir.join(format!("{stem}_{}.json", self.session_id.simple()));
        }

        let json = serde_json::to_string_pretty(self).context("failed to serialize submission")?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write submission to {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            email = %self.email,
            score = self.score_percent,
            "saved submission"
        );
        Ok(path)
    }

    /// Load a submission from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read submission from {}", path.display()))?;
        let submission: Submission = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse submission JSON: {}", path.display()))?;
        Ok(submission)
    }
}

/// Percentage of `correct` out of `total`, rounded to two decimals. Zero
/// when there is nothing to score.
pub fn score_percent(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = correct as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

fn sanitize_file_component(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '-' | '_' | '+') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Load every `.json` submission in `dir`, oldest first.
///
/// A missing directory means nothing has been submitted yet and yields an
/// empty list. Files that fail to parse are logged and skipped.
pub fn load_submission_directory(dir: &Path) -> Result<Vec<Submission>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut submissions = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if !path.is_file() || !path.extension().is_some_and(|ext| ext == "json") {
            continue;
        }
        match Submission::load_json(&path) {
            Ok(s) => submissions.push(s),
            Err(e) => tracing::warn!("skipping {}: {:#}", path.display(), e),
        }
    }

    submissions.sort_by(|a, b| {
        a.submitted_at
            .cmp(&b.submitted_at)
            .then_with(|| a.email.cmp(&b.email))
    });
    Ok(submissions)
}
