// A candidate poem: the individual of the evolving population.
//
// A `Poem` owns its line sequence outright: crossover and mutation always
// construct new `Poem`s from new `Vec<String>`s, never aliasing lines
// across individuals. The cached fitness is computed eagerly at
// construction (0.0 for an empty line sequence) and is only ever refreshed
// by building a new `Poem`, so a stored fitness always matches the stored
// lines.
//
// The title is produced lazily, only when the best individual is finalized:
// grown 1-3 words from the inspiring text's related-word set, each step
// keeping whichever of two candidate words wins the search-hit comparison.
// Ties and unavailable hit counts default to the first candidate, so title
// generation never fails.

use std::fmt;

use rand::Rng;
use tracing::warn;
use verseforge_oracle::{PoemRecord, SearchHits};

use crate::grammar::capitalize;
use crate::scoring::FitnessEvaluator;

/// One candidate poem in the population.
#[derive(Debug, Clone)]
pub struct Poem {
    lines: Vec<String>,
    inspiring_text: String,
    fitness: f64,
    title: Option<String>,
}

impl Poem {
    /// Build a poem and compute its fitness.
    pub fn new(evaluator: &FitnessEvaluator<'_>, inspiring_text: &str, lines: Vec<String>) -> Self {
        let fitness = evaluator.fitness(inspiring_text, &lines);
        Poem {
            lines,
            inspiring_text: inspiring_text.to_string(),
            fitness,
            title: None,
        }
    }

    /// A new poem with different lines (fitness recomputed). The original
    /// is untouched; no line sequence is ever shared between poems.
    pub fn with_lines(&self, evaluator: &FitnessEvaluator<'_>, lines: Vec<String>) -> Self {
        Poem::new(evaluator, &self.inspiring_text, lines)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn inspiring_text(&self) -> &str {
        &self.inspiring_text
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Display form: the final line's interim comma becomes a period.
    pub fn final_lines(&self) -> Vec<String> {
        let mut lines = self.lines.clone();
        if let Some(last) = lines.last_mut() {
            if let Some(stripped) = last.strip_suffix(',') {
                *last = format!("{stripped}.");
            }
        }
        lines
    }

    /// Grow a title from the inspiring text's related-word set.
    ///
    /// Seed word uniform; then, until the target length (1-3 words) is
    /// reached, propose two uniform candidates and keep whichever scores
    /// more search hits appended to the growing title. First candidate
    /// wins ties and double-failures.
    pub fn write_title(
        &mut self,
        evaluator: &FitnessEvaluator<'_>,
        search: &dyn SearchHits,
        rng: &mut impl Rng,
    ) {
        let pool: Vec<String> = evaluator
            .related_to_text(&self.inspiring_text)
            .into_iter()
            .map(|w| w.replace('_', " "))
            .collect();
        if pool.is_empty() {
            self.title = Some(title_case(&self.inspiring_text));
            return;
        }

        let target_len = rng.random_range(1..=3usize);
        let mut title = vec![pool[rng.random_range(0..pool.len())].clone()];
        while title.len() < target_len {
            let first = &pool[rng.random_range(0..pool.len())];
            let second = &pool[rng.random_range(0..pool.len())];
            title.push(next_title_word(&title.join(" "), first, second, search).to_string());
        }
        self.title = Some(title_case(&title.join(" ")));
    }

    /// The archive record for this poem.
    pub fn record(&self) -> PoemRecord {
        PoemRecord {
            title: self.title.clone().unwrap_or_default(),
            poem: self.final_lines(),
            inspiring_text: self.inspiring_text.clone(),
        }
    }
}

impl fmt::Display for Poem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--{}--", self.title.as_deref().unwrap_or("Untitled"))?;
        for line in self.final_lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Choose between two candidate next words by comparing the search hits of
/// the title-so-far concatenated with each. The first candidate wins ties
/// and wins outright when both hit counts are unavailable.
fn next_title_word<'w>(
    root: &str,
    first: &'w str,
    second: &'w str,
    search: &dyn SearchHits,
) -> &'w str {
    let hits_first = search.hit_count(&format!("{root} {first}"));
    let hits_second = search.hit_count(&format!("{root} {second}"));
    match (hits_first, hits_second) {
        (Some(a), Some(b)) => {
            if a >= b {
                first
            } else {
                second
            }
        }
        (Some(_), None) => first,
        (None, Some(_)) => second,
        (None, None) => {
            warn!(root, "search hits unavailable for both candidates, defaulting");
            first
        }
    }
}

/// Capitalize every whitespace-separated word.
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}
