//! Candidate-versus-reference equivalence.

use serde::{Deserialize, Serialize};

use crate::normalize::{normalize, NormalizedSql};

/// Outcome of comparing a candidate answer with a reference solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether both normalize to the same text.
    pub is_match: bool,
    /// Normalized candidate, for display and debugging.
    pub candidate: NormalizedSql,
    /// Normalized reference solution.
    pub reference: NormalizedSql,
}

/// Returns `true` when `candidate` and `reference` normalize identically.
///
/// There is no partial credit and no semantic reasoning: `SELECT *` is never
/// considered equal to an explicit column list, for example.
pub fn is_equivalent(candidate: &str, reference: &str) -> bool {
    normalize(candidate) == normalize(reference)
}

/// Like [`is_equivalent`], but keeps both normalized forms.
pub fn compare(candidate: &str, reference: &str) -> Verdict {
    let candidate = normalize(candidate);
    let reference = normalize(reference);
    let is_match = candidate == reference;
    tracing::debug!(
        is_match,
        candidate = %candidate,
        reference = %reference,
        "compared SQL answer"
    );
    Verdict {
        is_match,
        candidate,
        reference,
    }
}
