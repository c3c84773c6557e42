//! sqlgrade-core: SQL answer normalization, grading, and assessment sessions.
//!
//! This crate defines the normalizer and comparator that decide whether a
//! candidate's SQL matches a reference solution, plus the question-bank
//! model, session tracking, and submission persistence built on top of them.

pub mod compare;
pub mod config;
pub mod error;
pub mod lexer;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod report;
pub mod session;
pub mod statistics;

pub use compare::{compare, is_equivalent, Verdict};
pub use normalize::{normalize, NormalizedSql};
