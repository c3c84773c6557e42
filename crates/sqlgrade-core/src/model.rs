//! Core data model types for sqlgrade.
//!
//! A question bank is loaded once and then shared immutably with every
//! assessment session that draws from it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single assessment question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier within the bank.
    pub id: u32,
    /// Short question text shown to the candidate.
    pub title: String,
    /// Longer explanation of what the query should do.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Schema hints for the tables involved.
    #[serde(default)]
    pub tables: Vec<TableInfo>,
    /// How the involved tables relate, if more than one.
    #[serde(default)]
    pub relationship: Option<String>,
    /// What kind of answer is expected.
    pub kind: QuestionKind,
}

impl Question {
    /// Display label, e.g. `Q7`.
    pub fn label(&self) -> String {
        format!("Q{}", self.id)
    }

    /// The reference answer as text: the SQL solution, or the text of the
    /// correct choice.
    pub fn reference_text(&self) -> &str {
        match &self.kind {
            QuestionKind::Sql { solution } => solution,
            QuestionKind::MultipleChoice { choices, answer } => {
                choices.get(*answer).map(String::as_str).unwrap_or_default()
            }
        }
    }
}

/// Schema hint for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub table: String,
    /// Column descriptions, e.g. `"shipperid (INT, PK)"`.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Example row or transformation.
    #[serde(default)]
    pub sample: Option<String>,
}

/// The expected answer of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    /// Free-text SQL graded against a reference solution.
    Sql { solution: String },
    /// Pick one of `choices`; `answer` is the zero-based index of the
    /// correct one.
    MultipleChoice { choices: Vec<String>, answer: usize },
}

impl QuestionKind {
    pub fn is_sql(&self) -> bool {
        matches!(self, QuestionKind::Sql { .. })
    }
}

/// Question difficulty, ordered from easiest to hardest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Beginner, Difficulty::Medium, Difficulty::Hard];
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Beginner => write!(f, "beginner"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" | "easy" => Ok(Difficulty::Beginner),
            "medium" | "intermediate" => Ok(Difficulty::Medium),
            "hard" | "advanced" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// A collection of questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionBank {
    /// Unique identifier for this bank.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl QuestionBank {
    /// Look up a question by id.
    pub fn get(&self, id: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
