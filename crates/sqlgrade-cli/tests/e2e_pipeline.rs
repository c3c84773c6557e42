//! End-to-end pipeline tests: take an assessment, then read the results
//! back through the admin commands.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const BANK: &str = r#"
[bank]
id = "pipeline"
name = "Pipeline Bank"

[[questions]]
id = 1
title = "Which shippers do we have?"
solution = "SELECT * FROM shippers"

[[questions]]
id = 2
title = "Certain fields from Categories"
solution = "SELECT categoryname, description FROM categories"

[[questions]]
id = 3
title = "Filtering aggregated rows"
difficulty = "medium"
kind = "multiple_choice"
choices = ["WHERE", "HAVING", "ORDER BY"]
answer = 1
"#;

fn sqlgrade() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("sqlgrade").unwrap()
}

fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("bank.toml"), BANK).unwrap();
    dir
}

fn take(dir: &Path, name: &str, email: &str, input: &str) -> assert_cmd::assert::Assert {
    sqlgrade()
        .current_dir(dir)
        .arg("take")
        .arg("--name")
        .arg(name)
        .arg("--email")
        .arg(email)
        .arg("--bank")
        .arg("bank.toml")
        .arg("--submissions")
        .arg("submissions")
        .arg("--no-shuffle")
        .write_stdin(input)
        .assert()
}

fn saved_files(dir: &Path) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir.join("submissions"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}

#[test]
fn take_then_review_results() {
    let dir = setup();

    take(
        dir.path(),
        "Ann Example",
        "ann@example.com",
        "select *\nfrom Shippers s;\nSELECT Description, CategoryName FROM Categories;\n2\n",
    )
    .success()
    .stdout(predicate::str::contains("Question 1 of 3"))
    .stdout(predicate::str::contains("Correct!"))
    .stdout(predicate::str::contains("Q2 Certain fields from Categories: correct"))
    .stdout(predicate::str::contains("Score: 3/3 (100.00%)"));

    take(
        dir.path(),
        "Bob Example",
        "bob@example.com",
        "select companyname from shippers;\nselect categoryname from categories;\n1\n",
    )
    .success()
    .stdout(predicate::str::contains("Expected:    SELECT * FROM shippers"))
    .stdout(predicate::str::contains("Score: 0/3 (0.00%)"));

    let files = saved_files(dir.path());
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|p| p.extension().unwrap() == "json"));
    assert!(files.iter().any(|p| p
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("ann@example.com_")));

    sqlgrade()
        .current_dir(dir.path())
        .arg("results")
        .arg("--submissions")
        .arg("submissions")
        .assert()
        .success()
        .stdout(predicate::str::contains("ann@example.com"))
        .stdout(predicate::str::contains("bob@example.com"))
        .stdout(predicate::str::contains("Total submissions: 2"))
        .stdout(predicate::str::contains("Average score: 50.0%"));

    let output = sqlgrade()
        .current_dir(dir.path())
        .arg("results")
        .arg("--submissions")
        .arg("submissions")
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["summary"]["total_submissions"], 2);
    assert_eq!(json["summary"]["unique_candidates"], 2);
    assert_eq!(json["submissions"].as_array().unwrap().len(), 2);

    sqlgrade()
        .current_dir(dir.path())
        .arg("results")
        .arg("--submissions")
        .arg("submissions")
        .arg("--format")
        .arg("markdown")
        .assert()
        .success()
        .stdout(predicate::str::contains("| Q3 |"));
}

#[test]
fn export_csv_and_html() {
    let dir = setup();
    take(
        dir.path(),
        "Ann Example",
        "ann@example.com",
        "select * from shippers;\nselect 1;\n2\n",
    )
    .success()
    .stdout(predicate::str::contains("Score: 2/3 (66.67%)"));

    sqlgrade()
        .current_dir(dir.path())
        .arg("results")
        .arg("--submissions")
        .arg("submissions")
        .arg("--export")
        .arg("csv")
        .arg("--output")
        .arg("out/results.csv")
        .assert()
        .success()
        .stderr(predicate::str::contains("Exported 1 submission(s)"));

    let csv = std::fs::read_to_string(dir.path().join("out/results.csv")).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Name,Email,Session ID,Submitted At,Total Questions,Correct Answers,Score (%),\
         Q1_Answer,Q2_Answer,Q3_Answer"
    );
    let row = lines.next().unwrap();
    assert!(row.starts_with("Ann Example,ann@example.com,"));
    assert!(row.ends_with(",3,2,66.67,true,false,true"));

    sqlgrade()
        .current_dir(dir.path())
        .arg("results")
        .arg("--submissions")
        .arg("submissions")
        .arg("--export")
        .arg("html")
        .assert()
        .success();

    let html = std::fs::read_to_string(dir.path().join("sqlgrade-results.html")).unwrap();
    assert!(html.contains("ann@example.com"));

    sqlgrade()
        .current_dir(dir.path())
        .arg("results")
        .arg("--submissions")
        .arg("submissions")
        .arg("--export")
        .arg("pdf")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown export format"));
}

#[test]
fn same_email_gets_same_question_order() {
    let dir = setup();
    let order = |email: &str| {
        let output = sqlgrade()
            .current_dir(dir.path())
            .arg("take")
            .arg("--name")
            .arg("Someone")
            .arg("--email")
            .arg(email)
            .arg("--bank")
            .arg("bank.toml")
            .arg("--submissions")
            .arg("submissions")
            .write_stdin("1\n\n".repeat(6))
            .output()
            .unwrap();
        let stdout = String::from_utf8(output.stdout).unwrap();
        stdout
            .lines()
            .filter(|l| l.starts_with("Question "))
            .map(|l| l.split_once("]: ").unwrap().1.to_string())
            .collect::<Vec<_>>()
    };

    let first = order("ann@example.com");
    assert_eq!(first.len(), 3);
    assert_eq!(first, order("ANN@example.com"));
}

#[test]
fn incomplete_input_saves_nothing() {
    let dir = setup();
    take(dir.path(), "Ann", "ann@example.com", "select * from shippers;\n")
        .failure()
        .stderr(predicate::str::contains("input ended"));
    assert!(!dir.path().join("submissions").exists());
}
