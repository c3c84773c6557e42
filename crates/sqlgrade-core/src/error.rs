//! Session error types.
//!
//! These are the domain failures an assessment session can report back to
//! the caller. File and format problems are reported through `anyhow`
//! instead, with the offending path in the context.

use thiserror::Error;

/// Errors that can occur while driving an assessment session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Candidate details were missing or blank.
    #[error("invalid candidate: {0}")]
    InvalidCandidate(String),

    /// The bank (or the selected plan) left no questions to ask.
    #[error("no questions selected from bank '{0}'")]
    NoQuestions(String),

    /// A blank SQL answer was submitted.
    #[error("answer is empty")]
    EmptyAnswer,

    /// The answer type does not fit the question, e.g. a choice for a SQL
    /// question.
    #[error("question {question_id} expects {expected} answer")]
    KindMismatch {
        question_id: u32,
        expected: &'static str,
    },

    /// A multiple-choice answer outside the listed choices.
    #[error("choice {choice} is out of range (question has {available} choices)")]
    ChoiceOutOfRange { choice: usize, available: usize },

    /// Tried to advance past a question that has no answer yet.
    #[error("question {0} has not been answered")]
    NotAnswered(u32),

    /// Every question has already been answered.
    #[error("session is already complete")]
    AlreadyComplete,

    /// Tried to finish while questions remain.
    #[error("session is incomplete: {answered} of {total} questions answered")]
    Incomplete { answered: usize, total: usize },
}

impl SessionError {
    /// Returns `true` if the caller can retry the same question with a
    /// different answer.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SessionError::EmptyAnswer
                | SessionError::KindMismatch { .. }
                | SessionError::ChoiceOutOfRange { .. }
        )
    }
}
