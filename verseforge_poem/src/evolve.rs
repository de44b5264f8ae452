// The evolution engine: owns the population and runs generations.
//
// Lifecycle: `populate` builds the transition model (warm-loaded from the
// persisted table when one exists, then freshly ingested from the session
// corpus) and synthesizes the initial population; `evolve_generation` runs
// one selection/crossover/mutation/replacement round; `finish` sorts the
// final population, titles the best individual, and appends it to the
// archive. The transition model is finalized before the first generation
// and read-only from then on.
//
// Selection is fitness-proportional: two distinct parents per offspring,
// weighted without replacement within the pair. An all-zero or non-finite
// weight vector is `InvalidDistribution`; the engine refuses to continue
// rather than run an undefined selection.
//
// Replacement pins the population size exactly: the fittest ceil(n/2) of
// the old population plus the fittest floor(n/2) of the offspring, so `n`
// individuals enter and `n` leave every generation.

use std::path::PathBuf;

use rand::Rng;
use tracing::{debug, info};
use verseforge_oracle::{
    ArchiveSink, CorpusProvider, Embedder, LexicalOracle, PhoneticOracle, SearchHits, Tagger,
};

use crate::config::GenConfig;
use crate::error::GenError;
use crate::grammar::{LineGenerator, RelatedWords};
use crate::phonetics::StyleMutator;
use crate::poem::Poem;
use crate::scoring::FitnessEvaluator;
use crate::transition::TransitionModel;

/// The oracle bundle the engine generates against. All dependency-injected
/// so tests can swap in stubs.
#[derive(Clone, Copy)]
pub struct Oracles<'a> {
    pub tagger: &'a dyn Tagger,
    pub embedder: &'a dyn Embedder,
    pub lexical: &'a dyn LexicalOracle,
    pub phonetic: &'a dyn PhoneticOracle,
    pub search: &'a dyn SearchHits,
    pub corpus: &'a dyn CorpusProvider,
}

/// Runs the genetic algorithm over a population of candidate poems.
pub struct PoetryGenerator<'a> {
    oracles: Oracles<'a>,
    config: GenConfig,
    /// When set, the transition table is warm-loaded from and saved back
    /// to this path (frequencies persist; token pools never do).
    table_path: Option<PathBuf>,
    model: TransitionModel,
    related: RelatedWords,
    poems: Vec<Poem>,
    inspiring_text: String,
}

impl<'a> PoetryGenerator<'a> {
    pub fn new(oracles: Oracles<'a>, config: GenConfig, table_path: Option<PathBuf>) -> Self {
        PoetryGenerator {
            oracles,
            config,
            table_path,
            model: TransitionModel::new(),
            related: RelatedWords::default(),
            poems: Vec::new(),
            inspiring_text: String::new(),
        }
    }

    pub fn population(&self) -> &[Poem] {
        &self.poems
    }

    pub fn config(&self) -> &GenConfig {
        &self.config
    }

    fn evaluator(&self) -> FitnessEvaluator<'a> {
        FitnessEvaluator::new(
            self.oracles.embedder,
            self.oracles.tagger,
            self.oracles.lexical,
            self.config.weights,
        )
    }

    /// Build the transition model and related-words index for the
    /// inspiring text, then synthesize the initial population.
    pub fn populate(&mut self, inspiring_text: &str, rng: &mut impl Rng) -> Result<(), GenError> {
        self.inspiring_text = inspiring_text.to_string();

        self.model = match &self.table_path {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "warm-loading transition table");
                TransitionModel::load(path)?
            }
            _ => TransitionModel::new(),
        };

        let corpus = self.oracles.corpus.poems_for(inspiring_text);
        self.model.ingest(self.oracles.tagger, &corpus);
        if let Some(path) = &self.table_path {
            self.model.save(path)?;
        }

        self.related = RelatedWords::build(
            self.oracles.tagger,
            self.oracles.lexical,
            inspiring_text,
            20,
        );

        let evaluator = self.evaluator();
        let generator =
            LineGenerator::new(&self.model, &self.related, self.oracles.tagger, &self.config);
        let mut poems = Vec::with_capacity(self.config.population_size);
        for _ in 0..self.config.population_size {
            let lines = generator.generate_poem(self.config.num_lines, rng)?;
            poems.push(Poem::new(&evaluator, inspiring_text, lines));
        }
        self.poems = poems;
        info!(
            population = self.poems.len(),
            corpus_lines = corpus.len(),
            "population initialized"
        );
        Ok(())
    }

    /// Fitness-proportional draw of two distinct parent indices.
    fn select_parents(&self, rng: &mut impl Rng) -> Result<(usize, usize), GenError> {
        let weights: Vec<f64> = self.poems.iter().map(Poem::fitness).collect();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(GenError::InvalidDistribution);
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 || self.poems.len() < 2 {
            return Err(GenError::InvalidDistribution);
        }

        let first = weighted_index(&weights, total, rng);
        // Without replacement within the pair: zero out the first pick.
        let mut rest = weights;
        rest[first] = 0.0;
        let rest_total: f64 = rest.iter().sum();
        let second = if rest_total > 0.0 {
            weighted_index(&rest, rest_total, rng)
        } else {
            // Every other weight is zero; fall back to a uniform distinct pick.
            let offset = rng.random_range(1..self.poems.len());
            (first + offset) % self.poems.len()
        };
        debug_assert_ne!(first, second);
        Ok((first, second))
    }

    /// Crossover: pool both parents' lines and keep the half closest to the
    /// inspiring text (rounded down) as the offspring's lines.
    fn crossover(&self, p1: &Poem, p2: &Poem) -> Poem {
        let evaluator = self.evaluator();
        let mut pooled: Vec<String> = p1.lines().to_vec();
        pooled.extend(p2.lines().iter().cloned());
        let lines = evaluator.rank_half_closest(&self.inspiring_text, &pooled);
        Poem::new(&evaluator, &self.inspiring_text, lines)
    }

    /// Offspring mutation: with the configured probability, grammar-level
    /// or poeticness-level, weighted 40/60. Fitness is recomputed once,
    /// when the mutated poem is rebuilt.
    fn mutate(&self, poem: Poem, rng: &mut impl Rng) -> Result<Poem, GenError> {
        if !rng.random_bool(self.config.mutation_probability) {
            return Ok(poem);
        }
        let evaluator = self.evaluator();
        if rng.random_bool(self.config.grammar_mutation_weight) {
            let generator =
                LineGenerator::new(&self.model, &self.related, self.oracles.tagger, &self.config);
            let lines = generator.mutate_grammar(poem.lines(), rng)?;
            Ok(poem.with_lines(&evaluator, lines))
        } else {
            let mutator =
                StyleMutator::new(self.oracles.phonetic, self.oracles.lexical, &self.config);
            let lines = mutator.mutate_poeticness(poem.lines(), rng);
            Ok(poem.with_lines(&evaluator, lines))
        }
    }

    /// One generation: selection, crossover, mutation, replacement.
    pub fn evolve_generation(&mut self, rng: &mut impl Rng) -> Result<(), GenError> {
        let mut offspring = Vec::with_capacity(self.poems.len());
        for _ in 0..self.poems.len() {
            let (i, j) = self.select_parents(rng)?;
            let child = self.crossover(&self.poems[i], &self.poems[j]);
            offspring.push(self.mutate(child, rng)?);
        }

        // Fittest ceil(n/2) of the old population + fittest floor(n/2) of
        // the offspring: exactly n survivors.
        let n = self.poems.len();
        let old = std::mem::take(&mut self.poems);
        let mut survivors = fittest(old, n.div_ceil(2));
        survivors.extend(fittest(offspring, n / 2));
        self.poems = survivors;
        debug_assert_eq!(self.poems.len(), n);
        Ok(())
    }

    /// Populate and run the configured number of generations.
    pub fn run(&mut self, inspiring_text: &str, rng: &mut impl Rng) -> Result<(), GenError> {
        self.populate(inspiring_text, rng)?;
        for generation in 1..=self.config.generations {
            self.evolve_generation(rng)?;
            let best = self.best_fitness();
            let mean = self.mean_fitness();
            info!(generation, best, mean, "generation complete");
        }
        Ok(())
    }

    /// Finalize: sort by fitness, title the best poem, archive it, and
    /// return it.
    pub fn finish(
        &mut self,
        archive: &mut dyn ArchiveSink,
        rng: &mut impl Rng,
    ) -> Result<Poem, GenError> {
        self.poems
            .sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
        let Some(best) = self.poems.first() else {
            return Err(GenError::InvalidDistribution);
        };
        let mut best = best.clone();
        best.write_title(&self.evaluator(), self.oracles.search, rng);
        archive.append(&best.record())?;
        info!(
            title = best.title().unwrap_or_default(),
            fitness = best.fitness(),
            "run finished"
        );
        Ok(best)
    }

    pub fn best_fitness(&self) -> f64 {
        self.poems.iter().map(Poem::fitness).fold(0.0, f64::max)
    }

    pub fn mean_fitness(&self) -> f64 {
        if self.poems.is_empty() {
            return 0.0;
        }
        self.poems.iter().map(Poem::fitness).sum::<f64>() / self.poems.len() as f64
    }
}

/// Draw an index proportional to `weights` (cumulative scan).
fn weighted_index(weights: &[f64], total: f64, rng: &mut impl Rng) -> usize {
    let target = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > target {
            return i;
        }
    }
    weights.len() - 1
}

/// The `count` fittest poems, fitness descending.
fn fittest(mut poems: Vec<Poem>, count: usize) -> Vec<Poem> {
    poems.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
    poems.truncate(count);
    poems
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use verseforge_oracle::{EmbeddedCorpus, Lexicon};

    fn oracles<'a>(lex: &'a Lexicon, corpus: &'a EmbeddedCorpus) -> Oracles<'a> {
        Oracles {
            tagger: lex,
            embedder: lex,
            lexical: lex,
            phonetic: lex,
            search: lex,
            corpus,
        }
    }

    #[test]
    fn test_populate_builds_full_population() {
        let lex = Lexicon::default_lexicon();
        let corpus = EmbeddedCorpus::default_corpus();
        let config = GenConfig {
            population_size: 4,
            num_lines: 3,
            ..GenConfig::default()
        };
        let mut engine = PoetryGenerator::new(oracles(&lex, &corpus), config, None);
        let mut rng = StdRng::seed_from_u64(17);
        engine.populate("the quiet forest at dawn", &mut rng).unwrap();
        assert_eq!(engine.population().len(), 4);
        for poem in engine.population() {
            assert_eq!(poem.lines().len(), 3);
            assert!(poem.fitness() > 0.0);
        }
    }

    #[test]
    fn test_population_size_constant_across_generations() {
        let lex = Lexicon::default_lexicon();
        let corpus = EmbeddedCorpus::default_corpus();
        let config = GenConfig {
            population_size: 5, // odd, exercises the ceil/floor split
            num_lines: 3,
            ..GenConfig::default()
        };
        let mut engine = PoetryGenerator::new(oracles(&lex, &corpus), config, None);
        let mut rng = StdRng::seed_from_u64(19);
        engine.populate("the quiet forest at dawn", &mut rng).unwrap();
        for _ in 0..3 {
            engine.evolve_generation(&mut rng).unwrap();
            assert_eq!(engine.population().len(), 5);
        }
    }

    #[test]
    fn test_select_parents_distinct() {
        let lex = Lexicon::default_lexicon();
        let corpus = EmbeddedCorpus::default_corpus();
        let config = GenConfig {
            population_size: 6,
            num_lines: 2,
            ..GenConfig::default()
        };
        let mut engine = PoetryGenerator::new(oracles(&lex, &corpus), config, None);
        let mut rng = StdRng::seed_from_u64(23);
        engine.populate("the forest", &mut rng).unwrap();
        for _ in 0..200 {
            let (i, j) = engine.select_parents(&mut rng).unwrap();
            assert_ne!(i, j);
        }
    }

    #[test]
    fn test_empty_population_is_invalid_distribution() {
        let lex = Lexicon::default_lexicon();
        let corpus = EmbeddedCorpus::default_corpus();
        let engine =
            PoetryGenerator::new(oracles(&lex, &corpus), GenConfig::default(), None);
        let mut rng = StdRng::seed_from_u64(29);
        let err = engine.select_parents(&mut rng).unwrap_err();
        assert_eq!(err.code(), "invalid-distribution");
    }

    #[test]
    fn test_all_zero_fitness_is_invalid_distribution() {
        let lex = Lexicon::default_lexicon();
        let corpus = EmbeddedCorpus::default_corpus();
        let config = GenConfig {
            population_size: 3,
            num_lines: 2,
            ..GenConfig::default()
        };
        let mut engine = PoetryGenerator::new(oracles(&lex, &corpus), config, None);
        let mut rng = StdRng::seed_from_u64(37);
        engine.populate("the forest", &mut rng).unwrap();

        // Force every individual to zero fitness.
        let evaluator = engine.evaluator();
        engine.poems = engine
            .poems
            .iter()
            .map(|p| p.with_lines(&evaluator, Vec::new()))
            .collect();

        let err = engine.evolve_generation(&mut rng).unwrap_err();
        assert_eq!(err.code(), "invalid-distribution");
    }

    #[test]
    fn test_crossover_properties() {
        let lex = Lexicon::default_lexicon();
        let corpus = EmbeddedCorpus::default_corpus();
        let config = GenConfig {
            population_size: 2,
            num_lines: 4,
            ..GenConfig::default()
        };
        let mut engine = PoetryGenerator::new(oracles(&lex, &corpus), config, None);
        let mut rng = StdRng::seed_from_u64(31);
        engine.populate("the quiet forest at dawn", &mut rng).unwrap();

        let p1 = engine.population()[0].clone();
        let p2 = engine.population()[1].clone();
        let child = engine.crossover(&p1, &p2);

        assert_eq!(
            child.lines().len(),
            (p1.lines().len() + p2.lines().len()) / 2
        );
        let pool: Vec<&String> = p1.lines().iter().chain(p2.lines().iter()).collect();
        for line in child.lines() {
            assert!(pool.contains(&line), "line {line:?} not drawn from parents");
        }
    }
}
