// Oracle-side error type.
//
// Oracles fail rarely and only at the edges: file IO for the archive sink
// and JSON decoding of lexicon data. Lookup misses are *not* errors: every
// read oracle returns an empty result or `None` for unknown words, and the
// consuming operators no-op on those.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("oracle unavailable: {0}")]
    Unavailable(String),
}
