// Oracle traits and an embedded-lexicon implementation for Verseforge.
//
// The poem crate consumes all external NLP capability through the traits in
// this crate: tagging, embeddings, lexical relations, phonetics, search-hit
// counts, training corpus text, and the poem archive. Everything is blocking
// and synchronous; lookup misses are empty results, not errors.
//
// Architecture:
// - `types.rs`: `Pos` tag enum (plus synthetic `START`) and `TaggedToken`
// - `traits.rs`: the oracle trait contracts and the `cosine` helper
// - `error.rs`: `OracleError` for the IO-touching surfaces
// - `lexicon.rs`: `Lexicon` — one embedded JSON vocabulary implementing all
//   read oracles, plus `EmbeddedCorpus` for offline training lines
// - `archive.rs`: `JsonArchive` — append-only JSON-array poem store
//
// The embedded lexicon makes the `generate` binary runnable offline and the
// oracles concrete for tests; swapping in a real NLP stack means
// implementing these traits over it, nothing more.

pub mod archive;
pub mod error;
pub mod lexicon;
pub mod traits;
pub mod types;

pub use archive::JsonArchive;
pub use error::OracleError;
pub use lexicon::{EmbeddedCorpus, LexEntry, Lexicon};
pub use traits::{
    ArchiveSink, CorpusProvider, Embedder, LexicalOracle, PhoneticOracle, PoemRecord, SearchHits,
    Tagger, cosine,
};
pub use types::{ParsePosError, Pos, TaggedToken};
