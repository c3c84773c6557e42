//! Assessment session: question selection, grading, and progress.
//!
//! A session borrows an immutable [`QuestionBank`], picks the questions to
//! ask according to a [`SessionPlan`], and walks the candidate through them
//! one at a time. Each answer is graded as soon as it is submitted. When
//! every question has an answer the session turns into a [`Submission`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use xxhash_rust::xxh3::xxh3_64;

use crate::compare::compare;
use crate::error::SessionError;
use crate::model::{Difficulty, Question, QuestionBank, QuestionKind};
use crate::report::Submission;

/// The person taking the assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub email: String,
}

impl Candidate {
    /// Create a candidate. Both fields are trimmed and must be non-blank.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Result<Self, SessionError> {
        let name = name.into().trim().to_string();
        let email = email.into().trim().to_string();
        if name.is_empty() {
            return Err(SessionError::InvalidCandidate("name is required".into()));
        }
        if email.is_empty() {
            return Err(SessionError::InvalidCandidate("email is required".into()));
        }
        Ok(Self { name, email })
    }

    /// Stable seed for this candidate's question order. Only the email
    /// takes part, case-folded, so re-entering the same address reproduces
    /// the same order.
    pub fn seed(&self) -> u64 {
        xxh3_64(self.email.to_lowercase().as_bytes())
    }
}

/// Which questions a session asks, and in what order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPlan {
    /// Shuffle with the candidate's seed. Off means bank order.
    pub shuffle: bool,
    /// Maximum number of questions per difficulty. Empty means every
    /// question in the bank.
    #[serde(default)]
    pub per_difficulty: BTreeMap<Difficulty, usize>,
}

impl Default for SessionPlan {
    fn default() -> Self {
        Self {
            shuffle: true,
            per_difficulty: BTreeMap::new(),
        }
    }
}

impl SessionPlan {
    /// Pick questions from `bank`. With a per-difficulty quota the result
    /// is grouped by ascending difficulty; without one it covers the whole
    /// bank.
    pub fn select<'b>(&self, bank: &'b QuestionBank, seed: u64) -> Vec<&'b Question> {
        let mut rng = StdRng::seed_from_u64(seed);

        if self.per_difficulty.is_empty() {
            let mut all: Vec<&Question> = bank.questions.iter().collect();
            if self.shuffle {
                all.shuffle(&mut rng);
            }
            return all;
        }

        let mut selected = Vec::new();
        for (&difficulty, &count) in &self.per_difficulty {
            let mut pool: Vec<&Question> = bank
                .questions
                .iter()
                .filter(|q| q.difficulty == difficulty)
                .collect();
            if self.shuffle {
                pool.shuffle(&mut rng);
            }
            if pool.len() < count {
                tracing::warn!(
                    %difficulty,
                    requested = count,
                    available = pool.len(),
                    "not enough questions for difficulty"
                );
            }
            selected.extend(pool.into_iter().take(count));
        }
        selected
    }
}

/// A candidate's answer to one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Free-text SQL.
    Sql(String),
    /// Zero-based index into the question's choices.
    Choice(usize),
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Sql(sql) => f.write_str(sql),
            Answer::Choice(i) => write!(f, "choice {}", i + 1),
        }
    }
}

/// A graded answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: u32,
    pub title: String,
    /// What the candidate answered: the SQL text, or the chosen option.
    pub answer: String,
    /// The reference solution, or the correct option.
    pub reference: String,
    pub is_correct: bool,
    /// Normalized form of a SQL answer.
    #[serde(default)]
    pub normalized: Option<String>,
    pub answered_at: DateTime<Utc>,
}

/// Grade `answer` against `question`.
pub fn grade(question: &Question, answer: &Answer) -> Result<AnswerRecord, SessionError> {
    let (answer_text, is_correct, normalized) = match (&question.kind, answer) {
        (QuestionKind::Sql { solution }, Answer::Sql(sql)) => {
            if sql.trim().is_empty() {
                return Err(SessionError::EmptyAnswer);
            }
            let verdict = compare(sql, solution);
            (
                sql.trim().to_string(),
                verdict.is_match,
                Some(verdict.candidate.into_string()),
            )
        }
        (QuestionKind::MultipleChoice { choices, answer }, Answer::Choice(choice)) => {
            let text = choices
                .get(*choice)
                .ok_or(SessionError::ChoiceOutOfRange {
                    choice: choice + 1,
                    available: choices.len(),
                })?;
            (text.clone(), choice == answer, None)
        }
        (QuestionKind::Sql { .. }, Answer::Choice(_)) => {
            return Err(SessionError::KindMismatch {
                question_id: question.id,
                expected: "a SQL",
            })
        }
        (QuestionKind::MultipleChoice { .. }, Answer::Sql(_)) => {
            return Err(SessionError::KindMismatch {
                question_id: question.id,
                expected: "a multiple-choice",
            })
        }
    };

    tracing::debug!(question = question.id, is_correct, "graded answer");

    Ok(AnswerRecord {
        question_id: question.id,
        title: question.title.clone(),
        answer: answer_text,
        reference: question.reference_text().to_string(),
        is_correct,
        normalized,
        answered_at: Utc::now(),
    })
}

/// One candidate's pass through a set of questions.
#[derive(Debug)]
pub struct AssessmentSession<'a> {
    id: Uuid,
    bank: &'a QuestionBank,
    candidate: Candidate,
    questions: Vec<&'a Question>,
    records: Vec<Option<AnswerRecord>>,
    position: usize,
}

impl<'a> AssessmentSession<'a> {
    /// Start a session. Fails if the plan selects no questions.
    pub fn new(
        bank: &'a QuestionBank,
        candidate: Candidate,
        plan: &SessionPlan,
    ) -> Result<Self, SessionError> {
        let questions = plan.select(bank, candidate.seed());
        if questions.is_empty() {
            return Err(SessionError::NoQuestions(bank.id.clone()));
        }

        let id = Uuid::new_v4();
        tracing::info!(
            session = %id,
            bank = %bank.id,
            questions = questions.len(),
            "started assessment session"
        );

        Ok(Self {
            id,
            bank,
            candidate,
            records: vec![None; questions.len()],
            questions,
            position: 0,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    /// Questions in the order they are asked.
    pub fn questions(&self) -> &[&'a Question] {
        &self.questions
    }

    /// The question waiting for an answer, or `None` once the session has
    /// moved past the last one.
    pub fn current(&self) -> Option<&'a Question> {
        self.questions.get(self.position).copied()
    }

    /// Zero-based index of the current question.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total number of questions in this session.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn answered(&self) -> usize {
        self.records.iter().filter(|r| r.is_some()).count()
    }

    /// Fraction of questions answered, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        self.answered() as f64 / self.questions.len() as f64
    }

    /// Record from the current question, if already answered.
    pub fn current_record(&self) -> Option<&AnswerRecord> {
        self.records.get(self.position).and_then(Option::as_ref)
    }

    /// Grade `answer` for the current question. Answering again replaces
    /// the previous record.
    pub fn submit(&mut self, answer: Answer) -> Result<&AnswerRecord, SessionError> {
        let question = self.current().ok_or(SessionError::AlreadyComplete)?;
        let record = grade(question, &answer)?;
        let slot = &mut self.records[self.position];
        Ok(&*slot.insert(record))
    }

    /// Move to the next question. The current one must be answered first.
    pub fn advance(&mut self) -> Result<Option<&'a Question>, SessionError> {
        let question = self.current().ok_or(SessionError::AlreadyComplete)?;
        if self.records[self.position].is_none() {
            return Err(SessionError::NotAnswered(question.id));
        }
        self.position += 1;
        Ok(self.current())
    }

    /// Every question has an answer.
    pub fn is_complete(&self) -> bool {
        self.records.iter().all(Option::is_some)
    }

    /// Close the session and produce its submission.
    pub fn finish(self) -> Result<Submission, SessionError> {
        if !self.is_complete() {
            return Err(SessionError::Incomplete {
                answered: self.answered(),
                total: self.questions.len(),
            });
        }
        let answers = self.records.into_iter().flatten().collect();
        Ok(Submission::new(
            self.id,
            &self.candidate,
            &self.bank.id,
            answers,
            Utc::now(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TableInfo;

    fn sql(id: u32, difficulty: Difficulty, solution: &str) -> Question {
        Question {
            id,
            title: format!("Question {id}"),
            description: String::new(),
            difficulty,
            tables: vec![TableInfo {
                table: "orders".into(),
                columns: vec![],
                sample: None,
            }],
            relationship: None,
            kind: QuestionKind::Sql {
                solution: solution.into(),
            },
        }
    }

    fn choice(id: u32) -> Question {
        Question {
            kind: QuestionKind::MultipleChoice {
                choices: vec!["WHERE".into(), "HAVING".into(), "LIMIT".into()],
                answer: 1,
            },
            ..sql(id, Difficulty::Medium, "")
        }
    }

    fn bank() -> QuestionBank {
        QuestionBank {
            id: "test".into(),
            name: "Test".into(),
            description: String::new(),
            questions: vec![
                sql(1, Difficulty::Beginner, "SELECT * FROM shippers"),
                sql(
                    2,
                    Difficulty::Beginner,
                    "SELECT categoryname, description FROM categories",
                ),
                sql(3, Difficulty::Medium, "SELECT COUNT(*) FROM orders"),
                choice(4),
                sql(5, Difficulty::Hard, "SELECT o.orderid FROM orders o"),
                sql(6, Difficulty::Beginner, "SELECT 1"),
                sql(7, Difficulty::Hard, "SELECT 2"),
                sql(8, Difficulty::Medium, "SELECT 3"),
            ],
        }
    }

    fn ordered_plan() -> SessionPlan {
        SessionPlan {
            shuffle: false,
            per_difficulty: BTreeMap::new(),
        }
    }

    fn ids(questions: &[&Question]) -> Vec<u32> {
        questions.iter().map(|q| q.id).collect()
    }

    fn candidate(email: &str) -> Candidate {
        Candidate::new("Test Candidate", email).unwrap()
    }

    #[test]
    fn candidate_validation() {
        assert!(matches!(
            Candidate::new("  ", "a@b.c"),
            Err(SessionError::InvalidCandidate(_))
        ));
        assert!(matches!(
            Candidate::new("Ann", ""),
            Err(SessionError::InvalidCandidate(_))
        ));
        let c = Candidate::new(" Ann ", " ann@example.com ").unwrap();
        assert_eq!(c.name, "Ann");
        assert_eq!(c.email, "ann@example.com");
    }

    #[test]
    fn seed_ignores_email_case() {
        assert_eq!(
            candidate("Ann@Example.com").seed(),
            candidate("ann@example.com").seed()
        );
        assert_ne!(
            candidate("ann@example.com").seed(),
            candidate("bob@example.com").seed()
        );
    }

    #[test]
    fn unshuffled_plan_keeps_bank_order() {
        let bank = bank();
        let selected = ordered_plan().select(&bank, 42);
        assert_eq!(ids(&selected), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn shuffle_is_deterministic_per_candidate() {
        let bank = bank();
        let plan = SessionPlan::default();
        let a = plan.select(&bank, candidate("ann@example.com").seed());
        let b = plan.select(&bank, candidate("ANN@example.com").seed());
        assert_eq!(ids(&a), ids(&b));

        let mut sorted = ids(&a);
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 2, 3, 4, 5, 6, 7, 8]);

        let orders: Vec<Vec<u32>> = ["a@x.io", "b@x.io", "c@x.io", "d@x.io", "e@x.io"]
            .iter()
            .map(|e| ids(&plan.select(&bank, candidate(e).seed())))
            .collect();
        assert!(orders.iter().any(|o| o != &orders[0]));
    }

    #[test]
    fn per_difficulty_quota() {
        let bank = bank();
        let plan = SessionPlan {
            shuffle: true,
            per_difficulty: BTreeMap::from([
                (Difficulty::Beginner, 2),
                (Difficulty::Medium, 2),
                (Difficulty::Hard, 1),
            ]),
        };
        let selected = plan.select(&bank, 7);
        assert_eq!(selected.len(), 5);
        let difficulties: Vec<Difficulty> = selected.iter().map(|q| q.difficulty).collect();
        let mut sorted = difficulties.clone();
        sorted.sort();
        assert_eq!(difficulties, sorted);
        assert_eq!(
            difficulties
                .iter()
                .filter(|d| **d == Difficulty::Beginner)
                .count(),
            2
        );
    }

    #[test]
    fn quota_larger_than_pool_takes_what_exists() {
        let bank = bank();
        let plan = SessionPlan {
            shuffle: false,
            per_difficulty: BTreeMap::from([(Difficulty::Hard, 10)]),
        };
        assert_eq!(ids(&plan.select(&bank, 0)), vec![5, 7]);
    }

    #[test]
    fn empty_selection_is_an_error() {
        let bank = QuestionBank {
            questions: vec![],
            ..bank()
        };
        let err = AssessmentSession::new(&bank, candidate("a@b.c"), &ordered_plan()).unwrap_err();
        assert_eq!(err, SessionError::NoQuestions("test".into()));
    }

    #[test]
    fn grading_sql_answers() {
        let q = sql(1, Difficulty::Beginner, "SELECT categoryname, description FROM categories");
        let record = grade(
            &q,
            &Answer::Sql("select Description,CategoryName from Categories;".into()),
        )
        .unwrap();
        assert!(record.is_correct);
        assert_eq!(
            record.normalized.as_deref(),
            Some("select categoryname, description from categories")
        );
        assert_eq!(record.reference, q.reference_text());

        let record = grade(&q, &Answer::Sql("SELECT * FROM categories".into())).unwrap();
        assert!(!record.is_correct);

        assert_eq!(
            grade(&q, &Answer::Sql("  \n".into())).unwrap_err(),
            SessionError::EmptyAnswer
        );
        assert!(matches!(
            grade(&q, &Answer::Choice(0)),
            Err(SessionError::KindMismatch { question_id: 1, .. })
        ));
    }

    #[test]
    fn grading_choice_answers() {
        let q = choice(4);
        let record = grade(&q, &Answer::Choice(1)).unwrap();
        assert!(record.is_correct);
        assert_eq!(record.answer, "HAVING");
        assert!(record.normalized.is_none());

        assert!(!grade(&q, &Answer::Choice(0)).unwrap().is_correct);
        assert_eq!(
            grade(&q, &Answer::Choice(3)).unwrap_err(),
            SessionError::ChoiceOutOfRange {
                choice: 4,
                available: 3
            }
        );
        assert!(grade(&q, &Answer::Sql("HAVING".into())).is_err());
    }

    #[test]
    fn full_session_flow() {
        let bank = bank();
        let plan = SessionPlan {
            shuffle: false,
            per_difficulty: BTreeMap::from([(Difficulty::Beginner, 2)]),
        };
        let mut session = AssessmentSession::new(&bank, candidate("ann@example.com"), &plan).unwrap();
        assert_eq!(session.len(), 2);
        assert_eq!(session.position(), 0);
        assert_eq!(session.current().unwrap().id, 1);

        assert_eq!(session.advance().unwrap_err(), SessionError::NotAnswered(1));

        session.submit(Answer::Sql("select 1".into())).unwrap();
        assert!(!session.current_record().unwrap().is_correct);
        // Re-answering replaces the previous attempt.
        session
            .submit(Answer::Sql("select * from Shippers;".into()))
            .unwrap();
        assert!(session.current_record().unwrap().is_correct);
        assert_eq!(session.progress(), 0.5);

        let next = session.advance().unwrap().unwrap();
        assert_eq!(next.id, 2);
        assert_eq!(session.position(), 1);

        session
            .submit(Answer::Sql("SELECT description FROM categories".into()))
            .unwrap();
        assert!(session.is_complete());
        assert!(session.advance().unwrap().is_none());
        assert_eq!(
            session.submit(Answer::Sql("select 1".into())).unwrap_err(),
            SessionError::AlreadyComplete
        );

        let id = session.id();
        let submission = session.finish().unwrap();
        assert_eq!(submission.session_id, id);
        assert_eq!(submission.bank_id, "test");
        assert_eq!(submission.email, "ann@example.com");
        assert_eq!(submission.total_questions, 2);
        assert_eq!(submission.correct_answers, 1);
        assert_eq!(submission.score_percent, 50.0);
        assert_eq!(submission.answers[0].question_id, 1);
    }

    #[test]
    fn finish_requires_every_answer() {
        let bank = bank();
        let mut session =
            AssessmentSession::new(&bank, candidate("ann@example.com"), &ordered_plan()).unwrap();
        session.submit(Answer::Sql("select * from shippers".into())).unwrap();
        session.advance().unwrap();
        assert_eq!(
            session.finish().unwrap_err(),
            SessionError::Incomplete {
                answered: 1,
                total: 8
            }
        );
    }
}
