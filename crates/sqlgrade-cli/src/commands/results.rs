//! The `sqlgrade results` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use sqlgrade_core::config::load_config_from;
use sqlgrade_core::report::{load_submission_directory, Submission};
use sqlgrade_core::statistics::SubmissionSummary;
use sqlgrade_report::csv::write_csv_export;
use sqlgrade_report::html::write_html_report;

pub fn execute(
    submissions_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
    format: String,
    export: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let dir = submissions_dir.unwrap_or(config.submissions_dir);

    let submissions = load_submission_directory(&dir)?;
    let summary = SubmissionSummary::compute(&submissions);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", summary.to_markdown());
        }
        "json" => {
            let output = serde_json::json!({
                "summary": serde_json::to_value(&summary)?,
                "submissions": serde_json::to_value(&submissions)?,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        _ => {
            // text format
            if submissions.is_empty() {
                println!("No submissions yet in {}.", dir.display());
            } else {
                print_text(&submissions, &summary);
            }
        }
    }

    if let Some(kind) = export {
        let path = output.unwrap_or_else(|| PathBuf::from(format!("sqlgrade-results.{kind}")));
        match kind.as_str() {
            "csv" => write_csv_export(&submissions, &path)?,
            "html" => write_html_report(&submissions, &path)?,
            other => anyhow::bail!("unknown export format: {other} (expected csv or html)"),
        }
        eprintln!(
            "Exported {} submission(s) to {}",
            submissions.len(),
            path.display()
        );
    }

    Ok(())
}

fn print_text(submissions: &[Submission], summary: &SubmissionSummary) {
    let mut table = Table::new();
    table.set_header(vec!["Name", "Email", "Submitted At", "Correct", "Score"]);
    for s in submissions {
        table.add_row(vec![
            Cell::new(&s.name),
            Cell::new(&s.email),
            Cell::new(s.submitted_at.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(format!("{}/{}", s.correct_answers, s.total_questions)),
            Cell::new(format!("{:.2}%", s.score_percent)),
        ]);
    }
    println!("{table}");

    println!(
        "\nTotal submissions: {}  Unique candidates: {}",
        summary.total_submissions, summary.unique_candidates
    );
    if let (Some(first), Some(last)) = (summary.first_submission, summary.last_submission) {
        println!(
            "Date range: {} to {}",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        );
    }
    println!(
        "Average score: {:.1}% (best {:.1}%, worst {:.1}%)",
        summary.average_score, summary.best_score, summary.worst_score
    );

    let mut questions = Table::new();
    questions.set_header(vec!["Question", "Title", "Attempts", "Correct", "Rate"]);
    for q in summary.per_question.values() {
        questions.add_row(vec![
            Cell::new(format!("Q{}", q.question_id)),
            Cell::new(&q.title),
            Cell::new(q.attempts),
            Cell::new(q.correct),
            Cell::new(format!("{:.1}%", q.correct_rate * 100.0)),
        ]);
    }
    println!("\n{questions}");
}
