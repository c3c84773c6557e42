//! The `sqlgrade take` command.
//!
//! Walks a candidate through an assessment on stdin/stdout and saves the
//! submission at the end.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

use sqlgrade_core::config::load_config_from;
use sqlgrade_core::model::{Question, QuestionBank, QuestionKind};
use sqlgrade_core::parser::load_banks;
use sqlgrade_core::report::Submission;
use sqlgrade_core::session::{Answer, AnswerRecord, AssessmentSession, Candidate};

pub fn execute(
    name: String,
    email: String,
    bank_path: Option<PathBuf>,
    submissions_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
    no_shuffle: bool,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let bank_path = bank_path.unwrap_or_else(|| config.question_bank.clone());
    let submissions_dir = submissions_dir.unwrap_or_else(|| config.submissions_dir.clone());

    let bank = single_bank(load_banks(&bank_path)?, &bank_path)?;
    let candidate = Candidate::new(name, email)?;

    let mut plan = config.session_plan();
    if no_shuffle {
        plan.shuffle = false;
    }

    let session = AssessmentSession::new(&bank, candidate, &plan)?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let submission = run_session(session, &mut stdin.lock(), &mut stdout.lock())?;

    let path = submission.save_json(&submissions_dir)?;
    println!(
        "\nAssessment complete! Score: {}/{} ({:.2}%)",
        submission.correct_answers, submission.total_questions, submission.score_percent
    );
    println!("Submission saved to {}", path.display());

    Ok(())
}

fn single_bank(mut banks: Vec<QuestionBank>, path: &std::path::Path) -> Result<QuestionBank> {
    match banks.len() {
        0 => anyhow::bail!("no question banks found in {}", path.display()),
        1 => Ok(banks.remove(0)),
        n => {
            let ids: Vec<&str> = banks.iter().map(|b| b.id.as_str()).collect();
            anyhow::bail!(
                "found {n} question banks in {} ({}); pass --bank with a single file",
                path.display(),
                ids.join(", ")
            )
        }
    }
}

/// Drive `session` to completion, reading answers from `input`.
fn run_session<R: BufRead, W: Write>(
    mut session: AssessmentSession<'_>,
    input: &mut R,
    out: &mut W,
) -> Result<Submission> {
    writeln!(
        out,
        "Welcome, {}! {} questions ahead.",
        session.candidate().name,
        session.len()
    )?;

    while let Some(question) = session.current() {
        writeln!(out)?;
        writeln!(
            out,
            "Question {} of {} [{}]: {}",
            session.position() + 1,
            session.len(),
            question.difficulty,
            question.title
        )?;
        print_question(question, out)?;

        loop {
            let answer = read_answer(question, input, out)?;
            match session.submit(answer) {
                Ok(record) => {
                    print_verdict(record, out)?;
                    break;
                }
                Err(e) if e.is_retryable() => writeln!(out, "  {e}, please try again.")?,
                Err(e) => return Err(e.into()),
            }
        }
        session.advance()?;
    }

    let submission = session.finish()?;

    writeln!(out, "\nResults:")?;
    for record in &submission.answers {
        let mark = if record.is_correct { "correct" } else { "incorrect" };
        writeln!(out, "  Q{} {}: {mark}", record.question_id, record.title)?;
    }
    Ok(submission)
}

fn print_verdict<W: Write>(record: &AnswerRecord, out: &mut W) -> Result<()> {
    if record.is_correct {
        writeln!(out, "Correct!")?;
    } else {
        writeln!(out, "Incorrect.")?;
        writeln!(out, "  Your answer: {}", record.answer)?;
        writeln!(out, "  Expected:    {}", record.reference)?;
    }
    Ok(())
}

fn print_question<W: Write>(question: &Question, out: &mut W) -> Result<()> {
    if !question.description.is_empty() {
        writeln!(out, "{}", question.description)?;
    }

    for table in &question.tables {
        writeln!(out, "  Table {}: {}", table.table, table.columns.join(", "))?;
        if let Some(sample) = &table.sample {
            writeln!(out, "    e.g. {sample}")?;
        }
    }
    if let Some(relationship) = &question.relationship {
        writeln!(out, "  Relationship: {relationship}")?;
    }

    if let QuestionKind::MultipleChoice { choices, .. } = &question.kind {
        for (i, choice) in choices.iter().enumerate() {
            writeln!(out, "  {}) {}", i + 1, choice)?;
        }
    }
    Ok(())
}

fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    let read = input.read_line(&mut line).context("failed to read input")?;
    Ok((read > 0).then_some(line))
}

/// Read one answer. SQL answers end at a line ending in `;` or at a blank
/// line; choices are a 1-based number.
fn read_answer<R: BufRead, W: Write>(
    question: &Question,
    input: &mut R,
    out: &mut W,
) -> Result<Answer> {
    let ended = || anyhow::anyhow!("input ended before the assessment was complete");

    match &question.kind {
        QuestionKind::Sql { .. } => {
            writeln!(out, "Your SQL (finish with ';' or an empty line):")?;
            out.flush()?;
            let mut sql = String::new();
            loop {
                let line = read_line(input)?.ok_or_else(ended)?;
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    break;
                }
                sql.push_str(&line);
                if trimmed.ends_with(';') {
                    break;
                }
            }
            Ok(Answer::Sql(sql))
        }
        QuestionKind::MultipleChoice { choices, .. } => loop {
            write!(out, "Your choice (1-{}): ", choices.len())?;
            out.flush()?;
            let line = read_line(input)?.ok_or_else(ended)?;
            match line.trim().parse::<usize>() {
                Ok(n) if n >= 1 => return Ok(Answer::Choice(n - 1)),
                _ => writeln!(out, "  Please enter a number between 1 and {}.", choices.len())?,
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlgrade_core::model::Difficulty;
    use sqlgrade_core::session::SessionPlan;

    fn bank() -> QuestionBank {
        sqlgrade_core::parser::parse_question_bank_str(
            r#"
[bank]
id = "mini"
name = "Mini"

[[questions]]
id = 1
title = "Shippers"
solution = "SELECT * FROM shippers"

[[questions]]
id = 2
title = "Aggregate filter"
difficulty = "medium"
kind = "multiple_choice"
choices = ["WHERE", "HAVING"]
answer = 1

[[questions]]
id = 3
title = "Categories"
difficulty = "hard"
solution = "SELECT categoryname, description FROM categories"
"#,
            std::path::Path::new("mini.toml"),
        )
        .unwrap()
    }

    fn run(bank: &QuestionBank, input: &str) -> (Result<Submission>, String) {
        let plan = SessionPlan {
            shuffle: false,
            ..SessionPlan::default()
        };
        let candidate = Candidate::new("Ann", "ann@example.com").unwrap();
        let session = AssessmentSession::new(bank, candidate, &plan).unwrap();
        let mut out = Vec::new();
        let result = run_session(session, &mut input.as_bytes(), &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn completes_a_session() {
        let bank = bank();
        let input = "select *\nfrom Shippers;\n2\nSELECT description,\n  categoryname\nFROM categories\n\n";
        let (result, out) = run(&bank, input);
        let submission = result.unwrap();

        assert_eq!(submission.total_questions, 3);
        assert_eq!(submission.correct_answers, 3);
        assert!(out.contains("Question 1 of 3 [beginner]: Shippers"));
        assert!(out.contains("  2) HAVING"));
        assert_eq!(out.matches("Correct!").count(), 3);
        assert!(!out.contains("Incorrect."));
        assert!(out.contains("Results:\n  Q1 Shippers: correct\n"));
        assert!(out.contains("  Q3 Categories: correct"));
        assert_eq!(submission.answers[0].answer, "select *\nfrom Shippers;");
        assert_eq!(bank.questions[2].difficulty, Difficulty::Hard);
    }

    #[test]
    fn retries_invalid_answers() {
        let bank = bank();
        let input = "\nselect 1;\nabc\n0\n7\n1\nselect 2;\n";
        let (result, out) = run(&bank, input);
        let submission = result.unwrap();

        assert!(out.contains("answer is empty, please try again."));
        assert!(out.contains("Please enter a number between 1 and 2."));
        assert!(out.contains("choice 7 is out of range"));
        assert_eq!(out.matches("Incorrect.").count(), 3);
        assert!(out.contains("  Your answer: select 1;\n  Expected:    SELECT * FROM shippers\n"));
        assert!(out.contains("  Your answer: WHERE\n  Expected:    HAVING\n"));
        assert!(out.contains("  Q2 Aggregate filter: incorrect"));
        assert_eq!(submission.correct_answers, 0);
        assert_eq!(submission.answers[1].answer, "WHERE");
    }

    #[test]
    fn early_end_of_input_is_an_error() {
        let bank = bank();
        let (result, _) = run(&bank, "select * from shippers;\n");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("input ended"));
    }

    #[test]
    fn single_bank_selection() {
        let path = std::path::Path::new("banks");
        assert!(single_bank(vec![], path).is_err());
        assert_eq!(single_bank(vec![bank()], path).unwrap().id, "mini");
        let err = single_bank(vec![bank(), bank()], path).unwrap_err();
        assert!(err.to_string().contains("found 2 question banks"));
    }
}
