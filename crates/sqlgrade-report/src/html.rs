//! Admin results page.
//!
//! A single HTML file with inline styles and script, so it can be mailed or
//! opened straight from disk.

use anyhow::{Context, Result};
use std::path::Path;

use sqlgrade_core::report::Submission;
use sqlgrade_core::statistics::{QuestionStats, SubmissionSummary};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn score_class(percent: f64) -> &'static str {
    if percent >= 80.0 {
        "pass"
    } else if percent >= 50.0 {
        "warn"
    } else {
        "fail"
    }
}

/// Generate an HTML report from saved submissions.
pub fn generate_html(submissions: &[Submission]) -> String {
    let summary = SubmissionSummary::compute(submissions);
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>sqlgrade results</title>\n");
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>sqlgrade results</h1>\n");
    let range = match (summary.first_submission, summary.last_submission) {
        (Some(first), Some(last)) => format!(
            "{} to {}",
            first.format("%Y-%m-%d %H:%M UTC"),
            last.format("%Y-%m-%d %H:%M UTC")
        ),
        _ => "no submissions yet".to_string(),
    };
    html.push_str(&format!(
        "<p class=\"meta\">{} submissions | {} unique candidates | {}</p>\n",
        summary.total_submissions, summary.unique_candidates, range
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str(
        "<thead><tr><th>Average Score</th><th>Best</th><th>Worst</th></tr></thead>\n",
    );
    html.push_str(&format!(
        "<tbody><tr><td>{:.1}%</td><td>{:.1}%</td><td>{:.1}%</td></tr></tbody></table>\n",
        summary.average_score, summary.best_score, summary.worst_score
    ));

    if !summary.per_question.is_empty() {
        html.push_str("<h2>Per Question</h2>\n");
        html.push_str(&generate_bar_chart(&summary.hardest_questions()));
    }
    html.push_str("</section>\n");

    // Per-submission results
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Submissions</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Name</th><th onclick=\"sortTable(1)\">Email</th><th onclick=\"sortTable(2)\">Submitted</th><th onclick=\"sortTable(3)\">Correct</th><th onclick=\"sortTable(4)\">Score</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for s in submissions {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}/{}</td><td class=\"{}\">{:.2}%</td></tr>\n",
            html_escape(&s.name),
            html_escape(&s.email),
            s.submitted_at.format("%Y-%m-%d %H:%M:%S"),
            s.correct_answers,
            s.total_questions,
            score_class(s.score_percent),
            s.score_percent
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Answers per submission
    html.push_str("<section class=\"answers\">\n");
    html.push_str("<h2>Answers</h2>\n");
    for s in submissions {
        html.push_str(&format!(
            "<details>\n<summary>{} &lt;{}&gt; {:.2}%</summary>\n",
            html_escape(&s.name),
            html_escape(&s.email),
            s.score_percent
        ));
        html.push_str("<table>\n<thead><tr><th>Question</th><th>Answer</th><th>Reference</th><th>Result</th></tr></thead>\n<tbody>\n");
        for a in &s.answers {
            let (class, text) = if a.is_correct {
                ("pass", "OK")
            } else {
                ("fail", "WRONG")
            };
            html.push_str(&format!(
                "<tr><td>Q{} {}</td><td><code>{}</code></td><td><code>{}</code></td><td class=\"{}\">{}</td></tr>\n",
                a.question_id,
                html_escape(&a.title),
                html_escape(&a.answer),
                html_escape(&a.reference),
                class,
                text
            ));
        }
        html.push_str("</tbody></table>\n</details>\n");
    }
    html.push_str("</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(submissions: &[Submission], path: &Path) -> Result<()> {
    let html = generate_html(submissions);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

fn generate_bar_chart(questions: &[&QuestionStats]) -> String {
    let bar_height = 24;
    let max_width = 400;
    let padding = 8;
    let label_width = 80;

    let total_height = questions.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, q) in questions.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = (q.correct_rate * max_width as f64) as usize;
        let class = score_class(q.correct_rate * 100.0);

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\"><title>{}</title>Q{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&q.title),
            q.question_id
        ));
        svg.push_str(&format!(
            "  <rect class=\"bar-{}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"4\"/>\n",
            class, label_width, y, width, bar_height
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.0}% ({}/{})</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            q.correct_rate * 100.0,
            q.correct,
            q.attempts
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --warn: #fef9c3; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --warn: #713f12; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; vertical-align: top; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.warn { background: var(--warn); }
.fail { background: var(--fail); }
.bar-pass { fill: #22c55e; }
.bar-warn { fill: #eab308; }
.bar-fail { fill: #ef4444; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; white-space: pre-wrap; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const results = document.getElementById('results');
  const body = results.tBodies[0];
  const descending = results.dataset.col === String(col) && results.dataset.dir !== 'desc';
  const key = row => row.cells[col].textContent.trim();
  const sorted = [...body.rows].sort((a, b) =>
    key(a).localeCompare(key(b), undefined, {numeric: true}) * (descending ? -1 : 1));
  results.dataset.col = col;
  results.dataset.dir = descending ? 'desc' : 'asc';
  body.append(...sorted);
}
"#;
