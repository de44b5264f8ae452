// Pipeline error type.
//
// Local recovery is the rule: empty candidate pools skip slots, oracle
// lookup misses leave words unchanged, unavailable search hits fall back to
// the first candidate. Only two things are terminal: a selection
// distribution that does not sum to a positive value (continuing would make
// the genetic algorithm undefined) and archive IO failures.
//
// `code()` gives each kind a stable identifier for the single user-visible
// terminal error surface in the binary.

use thiserror::Error;
use verseforge_oracle::{OracleError, Pos};

#[derive(Debug, Error)]
pub enum GenError {
    /// No candidate token for a required POS, even after related-word
    /// augmentation.
    #[error("no tokens available for POS {pos}")]
    EmptyPool { pos: Pos },

    /// An oracle had no data for a word. Operators no-op on this instead of
    /// surfacing it; the variant exists for internal signaling.
    #[error("word '{word}' unknown to the oracle")]
    UnknownWord { word: String },

    /// Selection weights do not sum to a positive finite value (for example
    /// an all-zero-fitness population). Fatal for the generation.
    #[error("selection probabilities do not sum to a positive value")]
    InvalidDistribution,

    /// Archive or persistence IO failure.
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

impl GenError {
    /// Stable distinguishing code per error kind.
    pub fn code(&self) -> &'static str {
        match self {
            GenError::EmptyPool { .. } => "empty-pool",
            GenError::UnknownWord { .. } => "unknown-word",
            GenError::InvalidDistribution => "invalid-distribution",
            GenError::Oracle(_) => "oracle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            GenError::EmptyPool { pos: Pos::Noun },
            GenError::UnknownWord { word: "x".into() },
            GenError::InvalidDistribution,
        ];
        let codes: std::collections::BTreeSet<&str> = errors.iter().map(GenError::code).collect();
        assert_eq!(codes.len(), errors.len());
    }
}
