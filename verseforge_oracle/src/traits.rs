// Oracle trait definitions.
//
// The generation pipeline consumes all external NLP capability through these
// traits: tagging, embeddings, lexical relations, phonetics, search-hit
// counts, corpus text, and the archive sink. Everything is blocking and
// object-safe; consumers hold `&dyn Trait` and the pipeline stays
// single-threaded and synchronous.
//
// Lookup-miss convention: unknown words yield empty sets / `None`, never an
// error. Only the archive sink returns `Result`, because it touches disk.
//
// The embedded lexicon (`lexicon.rs`) implements every read trait; tests in
// the poem crate substitute hand-rolled stubs.

use std::collections::BTreeSet;

use crate::error::OracleError;
use crate::types::TaggedToken;
use serde::{Deserialize, Serialize};

/// Tokenizer + part-of-speech tagger.
pub trait Tagger {
    /// Tokenize `text` and tag every token, in order.
    fn tag(&self, text: &str) -> Vec<TaggedToken>;
}

/// Text embedding oracle.
pub trait Embedder {
    /// Embed a text (a line, or the whole inspiring text) as a dense vector.
    /// All vectors from one embedder have the same dimension.
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Cosine similarity between two embedding vectors, in [-1, 1].
/// Returns 0.0 when either vector is zero or the dimensions differ.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a <= 0.0 || norm_b <= 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Lexical relation oracle: wordnet-style relations and embedding neighbors.
pub trait LexicalOracle {
    /// Synonyms, hypernyms, and hyponyms of `word`. Empty when unknown.
    fn related(&self, word: &str) -> BTreeSet<String>;

    /// Up to `k` embedding nearest neighbors of `word`, closest first.
    /// Empty when the word is unknown to the underlying model.
    fn neighbors(&self, word: &str, k: usize) -> Vec<String>;
}

/// Phonetic oracle: pronunciation, stress, and rhyme lookup.
pub trait PhoneticOracle {
    /// Phoneme sequence for `word` (CMU-style phones, stress digits on
    /// vowels, e.g. ["F", "AO1", "R", "AH0", "S", "T"]). `None` when the
    /// word has no known pronunciation.
    fn phonemes(&self, word: &str) -> Option<Vec<String>>;

    /// Stress pattern for `word` as a digit string (e.g. "10"). `None` when
    /// unknown.
    fn stress_pattern(&self, word: &str) -> Option<String>;

    /// Words that rhyme with `word` (shared rhyming part from the last
    /// stressed vowel onward). Empty when unknown.
    fn rhymes(&self, word: &str) -> BTreeSet<String>;

    /// Words whose pronunciation contains the phoneme sequence `phones`
    /// (stress digits ignored on match).
    fn words_with_phoneme(&self, phones: &str) -> BTreeSet<String>;

    /// Words with exactly the stress pattern `pattern`.
    fn words_with_stress(&self, pattern: &str) -> BTreeSet<String>;
}

/// Search-engine hit-count oracle, used only by title generation.
pub trait SearchHits {
    /// Approximate hit count for `query`, or `None` when unavailable.
    fn hit_count(&self, query: &str) -> Option<u64>;
}

/// Supplies training text (lines of poetry) for a query/topic.
pub trait CorpusProvider {
    /// Training lines for `query`. May be empty.
    fn poems_for(&self, query: &str) -> Vec<String>;
}

/// A finished poem as written to the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoemRecord {
    pub title: String,
    pub poem: Vec<String>,
    #[serde(rename = "inspiring-text")]
    pub inspiring_text: String,
}

/// Durable append-only store for finished poems.
pub trait ArchiveSink {
    fn append(&mut self, record: &PoemRecord) -> Result<(), OracleError>;
}
