//! CSV export.
//!
//! One row per submission. Per-question columns cover the union of question
//! ids across all submissions, so candidates who drew different questions
//! still line up; a question a candidate never saw is left blank.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};

use sqlgrade_core::report::Submission;

const FIXED_COLUMNS: &[&str] = &[
    "Name",
    "Email",
    "Session ID",
    "Submitted At",
    "Total Questions",
    "Correct Answers",
    "Score (%)",
];

/// Quote a field per RFC 4180 when it contains a delimiter, quote, or line
/// break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn push_row(out: &mut String, fields: &[String]) {
    let row: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
    out.push_str(&row.join(","));
    out.push_str("\r\n");
}

/// Render submissions as CSV text, header row included.
pub fn to_csv(submissions: &[Submission]) -> String {
    let question_ids: BTreeSet<u32> = submissions
        .iter()
        .flat_map(|s| s.answers.iter().map(|a| a.question_id))
        .collect();

    let mut out = String::new();

    let header: Vec<String> = FIXED_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(question_ids.iter().map(|id| format!("Q{id}_Answer")))
        .collect();
    push_row(&mut out, &header);

    for s in submissions {
        let mut fields = vec![
            s.name.clone(),
            s.email.clone(),
            s.session_id.to_string(),
            s.submitted_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            s.total_questions.to_string(),
            s.correct_answers.to_string(),
            format!("{:.2}", s.score_percent),
        ];
        for id in &question_ids {
            let cell = s
                .answers
                .iter()
                .find(|a| a.question_id == *id)
                .map(|a| a.is_correct.to_string())
                .unwrap_or_default();
            fields.push(cell);
        }
        push_row(&mut out, &fields);
    }

    out
}

/// Write submissions as a CSV file.
pub fn write_csv_export(submissions: &[Submission], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, to_csv(submissions))
        .with_context(|| format!("failed to write CSV export to {}", path.display()))?;
    Ok(())
}
