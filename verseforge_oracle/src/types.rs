// Core vocabulary types shared by every oracle and by the poem crate.
//
// - `Pos` — Universal-Dependencies-style part-of-speech tag, plus the
//   synthetic `Start` tag used as the row key for line openings in the
//   transition table.
// - `TaggedToken` — one token of tagger output: surface form, lemma, tag,
//   and the stopword/punctuation flags the fitness keyword metric needs.
//
// `Pos` serializes to the upper-case tag string ("NOUN", "START", ...) in
// both serde and `Display`/`FromStr`, because those strings are the row and
// column headers of the persisted transition matrix.
//
// Determinism constraint: these types end up as BTreeMap keys throughout the
// poem crate, so `Ord` order (declaration order here) must stay stable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Part-of-speech tag assigned to a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Pos {
    Noun,
    Verb,
    Adj,
    Adv,
    Pron,
    Det,
    Adp,
    Num,
    Cconj,
    Sconj,
    Part,
    Intj,
    Propn,
    Aux,
    Punct,
    Space,
    Sym,
    X,
    /// Synthetic tag marking the position before the first token of a line.
    Start,
}

impl Pos {
    /// The upper-case tag string used in the persisted transition matrix.
    pub fn as_str(self) -> &'static str {
        match self {
            Pos::Noun => "NOUN",
            Pos::Verb => "VERB",
            Pos::Adj => "ADJ",
            Pos::Adv => "ADV",
            Pos::Pron => "PRON",
            Pos::Det => "DET",
            Pos::Adp => "ADP",
            Pos::Num => "NUM",
            Pos::Cconj => "CCONJ",
            Pos::Sconj => "SCONJ",
            Pos::Part => "PART",
            Pos::Intj => "INTJ",
            Pos::Propn => "PROPN",
            Pos::Aux => "AUX",
            Pos::Punct => "PUNCT",
            Pos::Space => "SPACE",
            Pos::Sym => "SYM",
            Pos::X => "X",
            Pos::Start => "START",
        }
    }

    /// Tags that never open a line and never appear mid-line during
    /// generation (they are resampled away by the line generator).
    pub fn is_skippable(self) -> bool {
        matches!(self, Pos::Punct | Pos::Space)
    }

    /// The open-class tags eligible for grammar-mutation word swaps.
    pub fn swap_candidates() -> [Pos; 3] {
        [Pos::Noun, Pos::Verb, Pos::Adj]
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unparseable tag strings in a persisted table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePosError(pub String);

impl fmt::Display for ParsePosError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown POS tag '{}'", self.0)
    }
}

impl std::error::Error for ParsePosError {}

impl FromStr for Pos {
    type Err = ParsePosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = match s {
            "NOUN" => Pos::Noun,
            "VERB" => Pos::Verb,
            "ADJ" => Pos::Adj,
            "ADV" => Pos::Adv,
            "PRON" => Pos::Pron,
            "DET" => Pos::Det,
            "ADP" => Pos::Adp,
            "NUM" => Pos::Num,
            "CCONJ" => Pos::Cconj,
            "SCONJ" => Pos::Sconj,
            "PART" => Pos::Part,
            "INTJ" => Pos::Intj,
            "PROPN" => Pos::Propn,
            "AUX" => Pos::Aux,
            "PUNCT" => Pos::Punct,
            "SPACE" => Pos::Space,
            "SYM" => Pos::Sym,
            "X" => Pos::X,
            "START" => Pos::Start,
            other => return Err(ParsePosError(other.to_string())),
        };
        Ok(tag)
    }
}

/// One token of tagger output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedToken {
    /// Surface form as it appeared in the text.
    pub surface: String,
    /// Normalized lemma (lower-case dictionary form).
    pub lemma: String,
    /// Part-of-speech tag.
    pub pos: Pos,
    /// Whether the token is a function/stop word.
    pub is_stopword: bool,
    /// Whether the token is punctuation.
    pub is_punctuation: bool,
}

impl TaggedToken {
    /// True for tokens made of alphabetic characters only, the only tokens
    /// that enter transition-model token pools.
    pub fn is_alphabetic(&self) -> bool {
        !self.surface.is_empty() && self.surface.chars().all(|c| c.is_alphabetic())
    }
}
