// Fitness evaluation: weighted sum of three independent measurements.
//
// - closeness: mean embedding cosine similarity of each line to the
//   inspiring text. Per-line scores are sorted descending before averaging;
//   the sort is irrelevant to the mean but keeps the intermediate vector
//   deterministic and easy to inspect.
// - keyword density: mean per-line count of tokens belonging to the
//   inspiring text's keyword set, expanded by each keyword's lexical
//   relation closure.
// - diversity: mean pairwise dissimilarity (1 − cosine) across all
//   unordered line pairs; 0 when the poem has fewer than two lines.
//
// The weights are not commensurable across components (dissimilarity sits
// an order of magnitude above the others); they come from `FitnessWeights`
// in the config. Fitness is always recomputed in full when a poem's lines
// change — never incrementally.

use std::collections::BTreeSet;

use tracing::trace;
use verseforge_oracle::{Embedder, LexicalOracle, Tagger, cosine};

use crate::config::FitnessWeights;

pub struct FitnessEvaluator<'a> {
    embedder: &'a dyn Embedder,
    tagger: &'a dyn Tagger,
    lexical: &'a dyn LexicalOracle,
    weights: FitnessWeights,
}

impl<'a> FitnessEvaluator<'a> {
    pub fn new(
        embedder: &'a dyn Embedder,
        tagger: &'a dyn Tagger,
        lexical: &'a dyn LexicalOracle,
        weights: FitnessWeights,
    ) -> Self {
        FitnessEvaluator {
            embedder,
            tagger,
            lexical,
            weights,
        }
    }

    /// Non-stopword, non-punctuation keyword surfaces of a text, lowercase.
    pub fn keywords(&self, text: &str) -> Vec<String> {
        self.tagger
            .tag(text)
            .into_iter()
            .filter(|t| !t.is_stopword && !t.is_punctuation)
            .map(|t| t.surface.to_lowercase())
            .collect()
    }

    /// Keywords of the text unioned with each keyword's relation closure
    /// (synonyms, hypernyms, hyponyms; underscores become spaces).
    pub fn related_to_text(&self, text: &str) -> BTreeSet<String> {
        let mut words = BTreeSet::new();
        for keyword in self.keywords(text) {
            for related in self.lexical.related(&keyword) {
                words.insert(related.replace('_', " ").to_lowercase());
            }
            words.insert(keyword);
        }
        words
    }

    /// Mean embedding closeness of the lines to the inspiring text.
    pub fn closeness(&self, inspiring_text: &str, lines: &[String]) -> f64 {
        if lines.is_empty() {
            return 0.0;
        }
        let target = self.embedder.embed(inspiring_text);
        let mut scores: Vec<f64> = lines
            .iter()
            .map(|line| f64::from(cosine(&target, &self.embedder.embed(line))))
            .collect();
        scores.sort_by(|a, b| b.total_cmp(a));
        scores.iter().sum::<f64>() / scores.len() as f64
    }

    /// Mean per-line count of keyword-set members.
    pub fn keyword_density(&self, inspiring_text: &str, lines: &[String]) -> f64 {
        if lines.is_empty() {
            return 0.0;
        }
        let keywords = self.related_to_text(inspiring_text);
        let total: usize = lines
            .iter()
            .map(|line| {
                self.tagger
                    .tag(line)
                    .iter()
                    .filter(|t| keywords.contains(&t.surface.to_lowercase()))
                    .count()
            })
            .sum();
        total as f64 / lines.len() as f64
    }

    /// Mean pairwise dissimilarity across unordered line pairs.
    pub fn diversity(&self, lines: &[String]) -> f64 {
        if lines.len() < 2 {
            return 0.0;
        }
        let embeddings: Vec<Vec<f32>> = lines
            .iter()
            .map(|line| self.embedder.embed(&line.to_lowercase()))
            .collect();
        let mut total = 0.0;
        let mut pairs = 0usize;
        for i in 0..embeddings.len() {
            for j in (i + 1)..embeddings.len() {
                total += 1.0 - f64::from(cosine(&embeddings[i], &embeddings[j]));
                pairs += 1;
            }
        }
        total / pairs as f64
    }

    /// Weighted combination of the three components. 0.0 for an empty poem.
    pub fn fitness(&self, inspiring_text: &str, lines: &[String]) -> f64 {
        if lines.is_empty() {
            return 0.0;
        }
        let meaning = self.closeness(inspiring_text, lines) * self.weights.meaning;
        let keyword = self.keyword_density(inspiring_text, lines) * self.weights.keyword;
        let dissimilarity = self.diversity(lines) * self.weights.dissimilarity;
        trace!(meaning, keyword, dissimilarity, "fitness components");
        meaning + keyword + dissimilarity
    }

    /// Sort lines by closeness to the inspiring text (descending, stable)
    /// and keep the closer half, rounded down. Crossover's line selector.
    pub fn rank_half_closest(&self, inspiring_text: &str, lines: &[String]) -> Vec<String> {
        let target = self.embedder.embed(inspiring_text);
        let mut scored: Vec<(f64, usize)> = lines
            .iter()
            .enumerate()
            .map(|(i, line)| (f64::from(cosine(&target, &self.embedder.embed(line))), i))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        scored
            .into_iter()
            .take(lines.len() / 2)
            .map(|(_, i)| lines[i].clone())
            .collect()
    }
}
