// Embedded-lexicon oracle implementation.
//
// A single JSON vocabulary (`data/lexicon.json`) backs every read oracle:
// tagging, embeddings, lexical relations, phonetics, and the search-hit
// proxy. Each entry carries the word's lemma, POS tag, stopword flag,
// CMU-style phoneme list, wordnet-style related words, and embedding
// nearest neighbors. `default_lexicon()` embeds the file at compile time
// via `include_str!`, so the binary needs no data files on disk.
//
// Design notes:
// - Entry order in the JSON file is the embedding vocabulary index, so
//   embeddings are deterministic across runs.
// - Rhymes are derived, not stored: two words rhyme when their rhyming
//   parts (phonemes from the last primary/secondary-stressed vowel onward)
//   are equal.
// - The search-hit proxy scores a query by summed frequency rank of its
//   known words. It exists so title generation exercises its real
//   comparison path offline; it is not a real search engine.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;

use crate::error::OracleError;
use crate::traits::{CorpusProvider, Embedder, LexicalOracle, PhoneticOracle, SearchHits, Tagger};
use crate::types::{Pos, TaggedToken};

/// One lexicon entry as stored in the JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct LexEntry {
    pub word: String,
    pub lemma: String,
    pub pos: Pos,
    pub stopword: bool,
    /// CMU-style phones, stress digits on vowels. Empty = no pronunciation.
    #[serde(default)]
    pub phonemes: Vec<String>,
    /// Synonyms/hypernyms/hyponyms.
    #[serde(default)]
    pub related: Vec<String>,
    /// Embedding nearest neighbors, closest first.
    #[serde(default)]
    pub neighbors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LexiconFile {
    words: Vec<LexEntry>,
}

/// A loaded lexicon with lookup index.
///
/// Implements all five read oracles. Entry order from the JSON file is
/// preserved for deterministic embedding vectors and hit-count ranks.
#[derive(Debug, Clone)]
pub struct Lexicon {
    entries: Vec<LexEntry>,
    index: BTreeMap<String, usize>,
}

impl Lexicon {
    /// Parse a lexicon from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, OracleError> {
        let file: LexiconFile = serde_json::from_str(json)?;
        let mut index = BTreeMap::new();
        for (i, entry) in file.words.iter().enumerate() {
            index.insert(entry.word.to_lowercase(), i);
        }
        Ok(Lexicon {
            entries: file.words,
            index,
        })
    }

    /// The default lexicon embedded at compile time.
    pub fn default_lexicon() -> Self {
        Self::from_json(include_str!("../data/lexicon.json"))
            .unwrap_or_else(|e| panic!("embedded lexicon is invalid: {e}"))
    }

    /// All entries, in file order.
    pub fn all(&self) -> &[LexEntry] {
        &self.entries
    }

    /// Look up an entry case-insensitively.
    pub fn entry(&self, word: &str) -> Option<&LexEntry> {
        let key = word.to_lowercase();
        self.index.get(&key).map(|&i| &self.entries[i])
    }

    fn entry_index(&self, word: &str) -> Option<usize> {
        self.index.get(&word.to_lowercase()).copied()
    }

    /// Split raw text into word and punctuation tokens. Punctuation marks
    /// become their own single-character tokens; whitespace separates.
    fn split_tokens(text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut current = String::new();
        for c in text.chars() {
            if c.is_alphanumeric() || c == '\'' {
                current.push(c);
            } else {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                if !c.is_whitespace() {
                    tokens.push(c.to_string());
                }
            }
        }
        if !current.is_empty() {
            tokens.push(current);
        }
        tokens
    }

    /// Stress pattern of a phoneme sequence: the vowel stress digits in order.
    fn stress_of(phones: &[String]) -> String {
        phones
            .iter()
            .filter_map(|p| p.chars().find(|c| c.is_ascii_digit()))
            .collect()
    }

    /// Rhyming part: phones from the last 1/2-stressed vowel onward.
    fn rhyming_part(phones: &[String]) -> Option<&[String]> {
        let start = phones
            .iter()
            .rposition(|p| p.ends_with('1') || p.ends_with('2'))?;
        Some(&phones[start..])
    }

    fn strip_stress(phone: &str) -> &str {
        phone.trim_end_matches(|c: char| c.is_ascii_digit())
    }

    /// Whether `haystack` contains `needle` as a contiguous subsequence,
    /// ignoring stress digits.
    fn contains_phones(haystack: &[String], needle: &[String]) -> bool {
        if needle.is_empty() || needle.len() > haystack.len() {
            return false;
        }
        let stripped: Vec<&str> = haystack.iter().map(|p| Self::strip_stress(p)).collect();
        let target: Vec<&str> = needle.iter().map(|p| Self::strip_stress(p)).collect();
        stripped.windows(target.len()).any(|w| w == target.as_slice())
    }
}

impl Tagger for Lexicon {
    fn tag(&self, text: &str) -> Vec<TaggedToken> {
        let mut tagged = Vec::new();
        for raw in Self::split_tokens(text) {
            let first = raw.chars().next().unwrap_or(' ');
            let token = if !first.is_alphanumeric() {
                TaggedToken {
                    surface: raw.clone(),
                    lemma: raw,
                    pos: Pos::Punct,
                    is_stopword: false,
                    is_punctuation: true,
                }
            } else if raw.chars().all(|c| c.is_ascii_digit()) {
                TaggedToken {
                    surface: raw.clone(),
                    lemma: raw,
                    pos: Pos::Num,
                    is_stopword: false,
                    is_punctuation: false,
                }
            } else if let Some(entry) = self.entry(&raw) {
                TaggedToken {
                    surface: raw,
                    lemma: entry.lemma.clone(),
                    pos: entry.pos,
                    is_stopword: entry.stopword,
                    is_punctuation: false,
                }
            } else {
                // Unknown open-class word: default to NOUN, lemma = lowercase.
                TaggedToken {
                    lemma: raw.to_lowercase(),
                    surface: raw,
                    pos: Pos::Noun,
                    is_stopword: false,
                    is_punctuation: false,
                }
            };
            tagged.push(token);
        }
        tagged
    }
}

impl Embedder for Lexicon {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.entries.len()];
        for raw in Self::split_tokens(text) {
            let Some(i) = self.entry_index(&raw) else {
                continue;
            };
            vector[i] += 1.0;
            // Neighbor smoothing so related lines are not orthogonal.
            for neighbor in &self.entries[i].neighbors {
                if let Some(j) = self.entry_index(neighbor) {
                    vector[j] += 0.5;
                }
            }
        }
        vector
    }
}

impl LexicalOracle for Lexicon {
    fn related(&self, word: &str) -> BTreeSet<String> {
        self.entry(word)
            .map(|e| e.related.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn neighbors(&self, word: &str, k: usize) -> Vec<String> {
        self.entry(word)
            .map(|e| e.neighbors.iter().take(k).cloned().collect())
            .unwrap_or_default()
    }
}

impl PhoneticOracle for Lexicon {
    fn phonemes(&self, word: &str) -> Option<Vec<String>> {
        self.entry(word)
            .filter(|e| !e.phonemes.is_empty())
            .map(|e| e.phonemes.clone())
    }

    fn stress_pattern(&self, word: &str) -> Option<String> {
        self.entry(word)
            .filter(|e| !e.phonemes.is_empty())
            .map(|e| Self::stress_of(&e.phonemes))
    }

    fn rhymes(&self, word: &str) -> BTreeSet<String> {
        let Some(entry) = self.entry(word) else {
            return BTreeSet::new();
        };
        let Some(part) = Self::rhyming_part(&entry.phonemes) else {
            return BTreeSet::new();
        };
        self.entries
            .iter()
            .filter(|other| {
                !other.word.eq_ignore_ascii_case(&entry.word)
                    && Self::rhyming_part(&other.phonemes) == Some(part)
            })
            .map(|other| other.word.clone())
            .collect()
    }

    fn words_with_phoneme(&self, phones: &str) -> BTreeSet<String> {
        let needle: Vec<String> = phones.split_whitespace().map(str::to_string).collect();
        self.entries
            .iter()
            .filter(|e| Self::contains_phones(&e.phonemes, &needle))
            .map(|e| e.word.clone())
            .collect()
    }

    fn words_with_stress(&self, pattern: &str) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter(|e| !e.phonemes.is_empty() && Self::stress_of(&e.phonemes) == pattern)
            .map(|e| e.word.clone())
            .collect()
    }
}

impl SearchHits for Lexicon {
    /// Frequency-rank proxy: earlier lexicon entries count as "more common".
    /// Queries with no known words are unavailable.
    fn hit_count(&self, query: &str) -> Option<u64> {
        let n = self.entries.len() as u64;
        let mut total = 0u64;
        let mut known = false;
        for raw in Self::split_tokens(query) {
            if let Some(i) = self.entry_index(&raw) {
                known = true;
                total += (n - i as u64) * 37;
            }
        }
        known.then_some(total)
    }
}

/// Training-corpus provider over the embedded verse lines.
///
/// `poems_for` returns the lines sharing at least one non-stopword token
/// with the query; when nothing overlaps, all lines are returned so the
/// transition model always has something to train on.
#[derive(Debug, Clone)]
pub struct EmbeddedCorpus {
    lines: Vec<String>,
}

impl EmbeddedCorpus {
    pub fn new(lines: Vec<String>) -> Self {
        EmbeddedCorpus { lines }
    }

    /// The default corpus embedded at compile time.
    pub fn default_corpus() -> Self {
        let lines = include_str!("../data/corpus.txt")
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        EmbeddedCorpus { lines }
    }
}

impl CorpusProvider for EmbeddedCorpus {
    fn poems_for(&self, query: &str) -> Vec<String> {
        let keywords: BTreeSet<String> = query
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        let matching: Vec<String> = self
            .lines
            .iter()
            .filter(|line| {
                line.split_whitespace()
                    .any(|w| keywords.contains(&w.to_lowercase()))
            })
            .cloned()
            .collect();

        if matching.is_empty() {
            self.lines.clone()
        } else {
            matching
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lexicon_loads() {
        let lex = Lexicon::default_lexicon();
        assert!(lex.all().len() > 100);
        assert_eq!(lex.entry("Forest").unwrap().pos, Pos::Noun);
    }

    #[test]
    fn test_tagging() {
        let lex = Lexicon::default_lexicon();
        let tokens = lex.tag("The forest wakes, quietly?");
        let tags: Vec<Pos> = tokens.iter().map(|t| t.pos).collect();
        assert_eq!(
            tags,
            vec![Pos::Det, Pos::Noun, Pos::Verb, Pos::Punct, Pos::Adv, Pos::Punct]
        );
        assert!(tokens[0].is_stopword);
        assert_eq!(tokens[2].lemma, "wake");
    }

    #[test]
    fn test_unknown_word_defaults_to_noun() {
        let lex = Lexicon::default_lexicon();
        let tokens = lex.tag("zyzzyva");
        assert_eq!(tokens[0].pos, Pos::Noun);
        assert_eq!(tokens[0].lemma, "zyzzyva");
    }

    #[test]
    fn test_rhymes_derived_from_phonemes() {
        let lex = Lexicon::default_lexicon();
        let rhymes = lex.rhymes("grows");
        assert!(rhymes.contains("flows"));
        assert!(rhymes.contains("glows"));
        assert!(!rhymes.contains("grows"));
        assert!(lex.rhymes("xqzt").is_empty());
    }

    #[test]
    fn test_stress_and_phoneme_search() {
        let lex = Lexicon::default_lexicon();
        assert_eq!(lex.stress_pattern("forest").as_deref(), Some("10"));
        let f_words = lex.words_with_phoneme("F");
        assert!(f_words.contains("forest"));
        assert!(f_words.contains("flows"));
        assert!(!f_words.contains("dawn"));
        let trochees = lex.words_with_stress("10");
        assert!(trochees.contains("meadow"));
    }

    #[test]
    fn test_embedding_similarity_orders_sensibly() {
        let lex = Lexicon::default_lexicon();
        let dawn = lex.embed("the dawn");
        let morning = lex.embed("the morning");
        let stone = lex.embed("the stone");
        let close = crate::traits::cosine(&dawn, &morning);
        let far = crate::traits::cosine(&dawn, &stone);
        assert!(close > far, "dawn~morning ({close}) should beat dawn~stone ({far})");
    }

    #[test]
    fn test_hit_count_unavailable_for_unknown() {
        let lex = Lexicon::default_lexicon();
        assert!(lex.hit_count("qqq zzz").is_none());
        assert!(lex.hit_count("forest dawn").unwrap() > 0);
    }

    #[test]
    fn test_corpus_keyword_filter() {
        let corpus = EmbeddedCorpus::default_corpus();
        let lines = corpus.poems_for("the forest at dawn");
        assert!(!lines.is_empty());
        assert!(lines.iter().all(|l| {
            l.contains("forest") || l.contains("dawn") || l.contains("the") || l.contains("at")
        }));
        // No overlap at all: fall back to the whole corpus.
        let all = corpus.poems_for("qqqq");
        assert_eq!(all.len(), corpus.lines.len());
    }
}
