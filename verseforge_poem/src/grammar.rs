// Line synthesis and grammar-level mutation.
//
// Two ways to produce a candidate line, chosen per line with configurable
// probability:
// - Markov walk: tag sequence sampled from the transition model starting at
//   START, each slot filled from the union of the model's token pool and
//   the related-words index for that tag.
// - Template fill: a fixed POS sequence from `SENTENCE_TEMPLATES`, filled
//   from the same union, skipping slots with no candidates.
//
// Punctuation/space tags are resampled away: they never open a line and
// never appear mid-line. Markov lines end with an interim comma; templated
// interrogatives end with `?`. Poem assembly reformats afterward
// (capitalize "I"/proper nouns, comma every line, period on the last).
//
// The related-words index widens vocabulary beyond the training corpus:
// embedding neighbors of the inspiring text's words, bucketed by tag.
//
// Consumed by the evolution engine for initial population synthesis and
// grammar-level mutation proposals.

use std::collections::BTreeMap;

use rand::Rng;
use verseforge_oracle::{LexicalOracle, Pos, Tagger};

use crate::config::GenConfig;
use crate::error::GenError;
use crate::transition::TransitionModel;

/// Fixed syntactic templates: (name, tag sequence, terminator).
pub const SENTENCE_TEMPLATES: &[(&str, &[Pos], char)] = &[
    ("simple", &[Pos::Noun, Pos::Verb], ','),
    ("simple-with-adj", &[Pos::Adj, Pos::Noun, Pos::Verb], ','),
    ("compound", &[Pos::Noun, Pos::Verb, Pos::Noun], ','),
    ("interrogative", &[Pos::Adv, Pos::Verb, Pos::Noun, Pos::Verb], '?'),
    (
        "complex",
        &[Pos::Adv, Pos::Verb, Pos::Noun, Pos::Cconj, Pos::Adv, Pos::Verb],
        ',',
    ),
    ("exclamatory", &[Pos::Intj, Pos::Verb, Pos::Noun], ','),
    ("imperative", &[Pos::Verb, Pos::Noun], ','),
];

/// Bound on resampling loops over skippable tags, so a degenerate table
/// (e.g. START that only ever leads to PUNCT) cannot spin forever.
const MAX_RESAMPLES: usize = 16;

/// Words lexically related to the inspiring text, bucketed by tag.
#[derive(Debug, Clone, Default)]
pub struct RelatedWords {
    by_pos: BTreeMap<Pos, Vec<String>>,
}

impl RelatedWords {
    /// Build the index from the inspiring text: embedding neighbors of each
    /// word (the word itself when the model does not know it), tagged and
    /// bucketed by POS.
    pub fn build(
        tagger: &dyn Tagger,
        lexical: &dyn LexicalOracle,
        inspiring_text: &str,
        neighbors_per_word: usize,
    ) -> Self {
        let mut by_pos: BTreeMap<Pos, Vec<String>> = BTreeMap::new();
        for token in tagger.tag(inspiring_text) {
            if token.is_punctuation {
                continue;
            }
            let mut near = lexical.neighbors(&token.surface, neighbors_per_word);
            if near.is_empty() {
                near.push(token.surface.clone());
            }
            for word in near {
                for tagged in tagger.tag(&word) {
                    if tagged.is_punctuation {
                        continue;
                    }
                    by_pos.entry(tagged.pos).or_default().push(tagged.surface);
                }
            }
        }
        RelatedWords { by_pos }
    }

    pub fn for_pos(&self, pos: Pos) -> &[String] {
        self.by_pos.get(&pos).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All indexed words, across tags.
    pub fn all(&self) -> Vec<String> {
        self.by_pos.values().flatten().cloned().collect()
    }
}

/// Synthesizes candidate lines from the transition model and templates.
pub struct LineGenerator<'a> {
    model: &'a TransitionModel,
    related: &'a RelatedWords,
    tagger: &'a dyn Tagger,
    config: &'a GenConfig,
}

impl<'a> LineGenerator<'a> {
    pub fn new(
        model: &'a TransitionModel,
        related: &'a RelatedWords,
        tagger: &'a dyn Tagger,
        config: &'a GenConfig,
    ) -> Self {
        LineGenerator {
            model,
            related,
            tagger,
            config,
        }
    }

    /// Candidate words for a tag: token pool ∪ related-words entries.
    fn candidates(&self, pos: Pos) -> Vec<&str> {
        let mut words: Vec<&str> = self.model.tokens_for(pos).iter().map(String::as_str).collect();
        words.extend(self.related.for_pos(pos).iter().map(String::as_str));
        words
    }

    fn pick<'w>(&self, words: &[&'w str], rng: &mut impl Rng) -> &'w str {
        words[rng.random_range(0..words.len())]
    }

    /// Sample a line-opening tag from START, resampling away punctuation
    /// and whitespace. Falls back to NOUN when the table is degenerate.
    fn opening_tag(&self, rng: &mut impl Rng) -> Pos {
        for _ in 0..MAX_RESAMPLES {
            let tag = self.model.sample_next(Pos::Start, rng);
            if tag != Pos::Start && !tag.is_skippable() {
                return tag;
            }
        }
        Pos::Noun
    }

    /// Sample the next tag mid-line, resampling away punctuation and
    /// whitespace. Keeps the current tag when resampling keeps failing.
    fn next_tag(&self, current: Pos, rng: &mut impl Rng) -> Pos {
        for _ in 0..MAX_RESAMPLES {
            let tag = self.model.sample_next(current, rng);
            if !tag.is_skippable() {
                return tag;
            }
        }
        current
    }

    /// Markov line: random walk over the transition model.
    pub fn markov_line(&self, rng: &mut impl Rng) -> Result<String, GenError> {
        let jitter = self.config.line_length_jitter as i64;
        let target = (self.config.base_line_length as i64
            + rng.random_range(-jitter..=jitter))
        .max(1) as usize;

        let mut current = self.opening_tag(rng);
        let mut words = self.candidates(current);
        if words.is_empty() {
            // Retry with the dominant open class before giving up.
            current = Pos::Noun;
            words = self.candidates(current);
            if words.is_empty() {
                return Err(GenError::EmptyPool { pos: current });
            }
        }

        let mut line: Vec<String> = vec![self.pick(&words, rng).to_string()];
        while line.len() < target {
            current = self.next_tag(current, rng);
            let words = self.candidates(current);
            if words.is_empty() {
                // No vocabulary for this tag this session; end the line early.
                break;
            }
            line.push(self.pick(&words, rng).to_string());
        }

        let corrected = correct_articles(&line.join(" "));
        Ok(format!("{},", capitalize(&corrected)))
    }

    /// Templated line: fill a fixed tag sequence, skipping empty slots.
    pub fn template_line(&self, rng: &mut impl Rng) -> Result<String, GenError> {
        let (_, tags, terminator) =
            SENTENCE_TEMPLATES[rng.random_range(0..SENTENCE_TEMPLATES.len())];
        self.fill_template(tags, terminator, rng)
    }

    fn fill_template(
        &self,
        tags: &[Pos],
        terminator: char,
        rng: &mut impl Rng,
    ) -> Result<String, GenError> {
        let mut line: Vec<String> = Vec::new();
        for &pos in tags {
            let words = self.candidates(pos);
            if words.is_empty() {
                continue; // skip the slot
            }
            line.push(self.pick(&words, rng).to_string());
        }
        if line.is_empty() {
            return Err(GenError::EmptyPool { pos: tags[0] });
        }
        Ok(format!("{}{}", capitalize(&line.join(" ")), terminator))
    }

    /// Generate a full poem: per line, Markov walk or template with the
    /// configured probability, then reformat.
    pub fn generate_poem(
        &self,
        num_lines: usize,
        rng: &mut impl Rng,
    ) -> Result<Vec<String>, GenError> {
        let mut lines = Vec::with_capacity(num_lines);
        for _ in 0..num_lines {
            let line = if rng.random_bool(self.config.markov_line_probability) {
                self.markov_line(rng)?
            } else {
                self.template_line(rng)?
            };
            lines.push(line);
        }
        Ok(self.reformat(lines))
    }

    /// Poem-level reformatting: capitalize the pronoun "i" and proper-noun
    /// tokens wherever they recur verbatim, give every non-final line a
    /// comma terminator (questions keep `?`), and end the final line with a
    /// period.
    pub fn reformat(&self, lines: Vec<String>) -> Vec<String> {
        let count = lines.len();
        lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let line = self.recapitalize(&line);
                terminate_line(&line, i + 1 == count)
            })
            .collect()
    }

    fn recapitalize(&self, line: &str) -> String {
        let to_upper: Vec<String> = self
            .tagger
            .tag(line)
            .into_iter()
            .filter(|t| t.surface == "i" || t.pos == Pos::Propn)
            .map(|t| t.surface)
            .collect();
        if to_upper.is_empty() {
            return line.to_string();
        }
        line.split(' ')
            .map(|token| {
                let (word, punct) = split_trailing_punct(token);
                if to_upper.iter().any(|t| t == word) {
                    format!("{}{}", capitalize(word), punct)
                } else {
                    token.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Grammar-level mutation: per line with the configured probability,
    /// either regenerate from a random template or swap one noun/verb/adj
    /// occurrence for a related word of the same tag. Returns new owned
    /// lines; the caller recomputes fitness once afterward.
    pub fn mutate_grammar(
        &self,
        lines: &[String],
        rng: &mut impl Rng,
    ) -> Result<Vec<String>, GenError> {
        let mut mutated = Vec::with_capacity(lines.len());
        for line in lines {
            if !rng.random_bool(self.config.grammar_line_mutation_probability) {
                mutated.push(line.clone());
                continue;
            }
            if rng.random_bool(0.5) {
                // Rewrite the line wholesale from a template.
                match self.template_line(rng) {
                    Ok(fresh) => mutated.push(capitalize(&correct_articles(&fresh))),
                    Err(GenError::EmptyPool { .. }) => mutated.push(line.clone()),
                    Err(e) => return Err(e),
                }
            } else {
                let pos = Pos::swap_candidates()[rng.random_range(0..3)];
                mutated.push(self.swap_word_in_pos(line, pos, rng));
            }
        }
        Ok(mutated)
    }

    /// Replace one uniformly chosen occurrence of `pos` in the line with a
    /// random related word of the same tag. No occurrence or no related
    /// vocabulary: the line is returned unchanged.
    fn swap_word_in_pos(&self, line: &str, pos: Pos, rng: &mut impl Rng) -> String {
        let occurrences: Vec<String> = self
            .tagger
            .tag(line)
            .into_iter()
            .filter(|t| t.pos == pos && !t.is_punctuation)
            .map(|t| t.surface)
            .collect();
        let related = self.related.for_pos(pos);
        if occurrences.is_empty() || related.is_empty() {
            return line.to_string();
        }
        let target = &occurrences[rng.random_range(0..occurrences.len())];
        let replacement = &related[rng.random_range(0..related.len())];

        let mut replaced = false;
        line.split(' ')
            .map(|token| {
                let (word, punct) = split_trailing_punct(token);
                if !replaced && word == target {
                    replaced = true;
                    // Keep the slot's capitalization (line openings stay
                    // capitalized).
                    let word = if word.chars().next().is_some_and(char::is_uppercase) {
                        capitalize(replacement)
                    } else {
                        replacement.clone()
                    };
                    format!("{word}{punct}")
                } else {
                    token.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Article correction: one forward pass, applied one token behind. When the
/// previous token is "a"/"an", the current token's first letter decides the
/// article's form. Idempotent.
pub fn correct_articles(line: &str) -> String {
    let mut tokens: Vec<String> = line.split(' ').map(str::to_string).collect();
    for i in 1..tokens.len() {
        let starts_vowel = tokens[i]
            .chars()
            .next()
            .is_some_and(|c| "aeiouAEIOU".contains(c));
        let prev = tokens[i - 1].as_str();
        let fixed = match (prev, starts_vowel) {
            ("a", true) => Some("an"),
            ("A", true) => Some("An"),
            ("an", false) => Some("a"),
            ("An", false) => Some("A"),
            _ => None,
        };
        if let Some(article) = fixed {
            tokens[i - 1] = article.to_string();
        }
    }
    tokens.join(" ")
}

/// Capitalize the first character of a string.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => {
            let upper: String = c.to_uppercase().collect();
            format!("{}{}", upper, chars.as_str())
        }
    }
}

/// Split a token into its word part and trailing punctuation.
fn split_trailing_punct(token: &str) -> (&str, &str) {
    let end = token
        .char_indices()
        .rev()
        .take_while(|(_, c)| !c.is_alphanumeric())
        .map(|(i, _)| i)
        .last()
        .unwrap_or(token.len());
    token.split_at(end)
}

fn terminate_line(line: &str, is_last: bool) -> String {
    let trimmed = line.trim_end().to_string();
    if is_last {
        if let Some(stripped) = trimmed.strip_suffix(',') {
            return format!("{stripped}.");
        }
        if trimmed.ends_with('?') || trimmed.ends_with('.') {
            return trimmed;
        }
        return format!("{trimmed}.");
    }
    if trimmed.ends_with(',') || trimmed.ends_with('?') {
        trimmed
    } else {
        format!("{trimmed},")
    }
}
