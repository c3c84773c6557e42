//! Aggregate statistics over saved submissions.
//!
//! Powers the admin view: how many people took the assessment, how they
//! scored, and which questions trip candidates up.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::report::Submission;

/// Summary across a set of submissions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionSummary {
    /// Number of submissions.
    pub total_submissions: usize,
    /// Distinct candidates, by case-folded email.
    pub unique_candidates: usize,
    /// Earliest submission time.
    pub first_submission: Option<DateTime<Utc>>,
    /// Latest submission time.
    pub last_submission: Option<DateTime<Utc>>,
    /// Mean of `score_percent` across submissions.
    pub average_score: f64,
    pub best_score: f64,
    pub worst_score: f64,
    /// Per-question statistics keyed by question id.
    pub per_question: BTreeMap<u32, QuestionStats>,
}

/// How candidates did on a single question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionStats {
    pub question_id: u32,
    pub title: String,
    /// Times the question was answered.
    pub attempts: usize,
    /// Times it was answered correctly.
    pub correct: usize,
    /// `correct / attempts`, in `0.0..=1.0`.
    pub correct_rate: f64,
}

impl SubmissionSummary {
    /// Compute the summary. An empty slice gives an all-zero summary.
    pub fn compute(submissions: &[Submission]) -> Self {
        if submissions.is_empty() {
            return Self::default();
        }

        let unique: HashSet<String> = submissions
            .iter()
            .map(|s| s.email.trim().to_lowercase())
            .collect();

        let scores: Vec<f64> = submissions.iter().map(|s| s.score_percent).collect();
        let average_score = scores.iter().sum::<f64>() / scores.len() as f64;
        let best_score = scores.iter().copied().fold(f64::MIN, f64::max);
        let worst_score = scores.iter().copied().fold(f64::MAX, f64::min);

        let mut per_question: BTreeMap<u32, QuestionStats> = BTreeMap::new();
        for answer in submissions.iter().flat_map(|s| &s.answers) {
            let stats = per_question
                .entry(answer.question_id)
                .or_insert_with(|| QuestionStats {
                    question_id: answer.question_id,
                    title: answer.title.clone(),
                    attempts: 0,
                    correct: 0,
                    correct_rate: 0.0,
                });
            stats.attempts += 1;
            if answer.is_correct {
                stats.correct += 1;
            }
        }
        for stats in per_question.values_mut() {
            stats.correct_rate = stats.correct as f64 / stats.attempts as f64;
        }

        Self {
            total_submissions: submissions.len(),
            unique_candidates: unique.len(),
            first_submission: submissions.iter().map(|s| s.submitted_at).min(),
            last_submission: submissions.iter().map(|s| s.submitted_at).max(),
            average_score,
            best_score,
            worst_score,
            per_question,
        }
    }

    /// Questions ordered from most to least often missed.
    pub fn hardest_questions(&self) -> Vec<&QuestionStats> {
        let mut stats: Vec<&QuestionStats> = self.per_question.values().collect();
        stats.sort_by(|a, b| {
            a.correct_rate
                .total_cmp(&b.correct_rate)
                .then_with(|| a.question_id.cmp(&b.question_id))
        });
        stats
    }

    /// Format the summary as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str("## Assessment Results\n\n");
        md.push_str(&format!(
            "**Summary:** {} submissions from {} candidates, average score {:.1}%\n\n",
            self.total_submissions, self.unique_candidates, self.average_score
        ));

        if let (Some(first), Some(last)) = (self.first_submission, self.last_submission) {
            md.push_str(&format!(
                "**Date range:** {} to {}\n\n",
                first.format("%Y-%m-%d"),
                last.format("%Y-%m-%d")
            ));
        }

        if !self.per_question.is_empty() {
            md.push_str("### Per Question\n\n");
            md.push_str("| Question | Title | Attempts | Correct | Rate |\n");
            md.push_str("|----------|-------|----------|---------|------|\n");
            for q in self.per_question.values() {
                md.push_str(&format!(
                    "| Q{} | {} | {} | {} | {:.1}% |\n",
                    q.question_id,
                    q.title.replace('|', "\\|"),
                    q.attempts,
                    q.correct,
                    q.correct_rate * 100.0
                ));
            }
        }

        md
    }
}
