// Integration test for the full generation pipeline.
//
// Runs the engine end-to-end against the embedded lexicon oracles:
// corpus ingestion, transition-table persistence, population seeding,
// several generations of evolution, titling, and archive output. All
// runs are seeded, so every assertion here is deterministic.

use std::path::PathBuf;

use rand::SeedableRng;
use rand::rngs::StdRng;
use verseforge_oracle::{EmbeddedCorpus, JsonArchive, Lexicon, Pos, SearchHits, TaggedToken};
use verseforge_poem::config::GenConfig;
use verseforge_poem::evolve::{Oracles, PoetryGenerator};
use verseforge_poem::grammar::{LineGenerator, RelatedWords};
use verseforge_poem::transition::TransitionModel;

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

fn small_config() -> GenConfig {
    GenConfig {
        population_size: 6,
        num_lines: 4,
        generations: 3,
        base_line_length: 6,
        line_length_jitter: 1,
        ..GenConfig::default()
    }
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("verseforge-it-{}-{}", std::process::id(), name))
}

#[test]
fn full_run_produces_titled_archived_poem() {
    let lex = Lexicon::default_lexicon();
    let corpus = EmbeddedCorpus::default_corpus();
    let archive_path = temp_path("archive.json");
    let _ = std::fs::remove_file(&archive_path);

    let mut engine = PoetryGenerator::new(oracles(&lex, &corpus), small_config(), None);
    let mut rng = StdRng::seed_from_u64(42);
    engine.run("the quiet forest at dawn", &mut rng).unwrap();

    let mut archive = JsonArchive::new(&archive_path);
    let best = engine.finish(&mut archive, &mut rng).unwrap();

    // The winner is a complete poem.
    assert_eq!(best.lines().len(), 4);
    assert!(best.fitness() > 0.0);
    let title = best.title().expect("winner must be titled");
    assert!(!title.is_empty());
    let word_count = title.split_whitespace().count();
    assert!((1..=3).contains(&word_count), "title was {title:?}");

    // Every finalized line is capitalized and terminated.
    for line in best.final_lines() {
        let first = line.chars().next().unwrap();
        assert!(first.is_uppercase(), "line not capitalized: {line:?}");
        let last = line.chars().last().unwrap();
        assert!(
            matches!(last, '.' | '!' | '?'),
            "line not terminated: {line:?}"
        );
    }

    // The archive round-trips the record.
    let records = archive.records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, title);
    assert_eq!(records[0].poem, best.final_lines());
    assert_eq!(records[0].inspiring_text, "the quiet forest at dawn");

    let _ = std::fs::remove_file(&archive_path);
}

#[test]
fn evolution_keeps_population_size_and_never_regresses_best() {
    let lex = Lexicon::default_lexicon();
    let corpus = EmbeddedCorpus::default_corpus();
    let mut config = small_config();
    config.population_size = 7; // odd, exercises the survivor split

    let mut engine = PoetryGenerator::new(oracles(&lex, &corpus), config, None);
    let mut rng = StdRng::seed_from_u64(7);
    engine.populate("dawn over the silver river", &mut rng).unwrap();

    let mut last_best = engine.best_fitness();
    for _ in 0..4 {
        engine.evolve_generation(&mut rng).unwrap();
        assert_eq!(engine.population().len(), 7);
        // Elitism: the fittest half of the old population survives, so
        // the best fitness is monotonically non-decreasing.
        assert!(engine.best_fitness() >= last_best);
        assert!(engine.best_fitness() >= engine.mean_fitness());
        last_best = engine.best_fitness();
    }
}

#[test]
fn transition_table_persists_across_runs() {
    let lex = Lexicon::default_lexicon();
    let corpus = EmbeddedCorpus::default_corpus();
    let table_path = temp_path("table.csv");
    let _ = std::fs::remove_file(&table_path);

    let mut engine = PoetryGenerator::new(
        oracles(&lex, &corpus),
        small_config(),
        Some(table_path.clone()),
    );
    let mut rng = StdRng::seed_from_u64(3);
    engine.populate("the forest wakes", &mut rng).unwrap();
    assert!(table_path.exists(), "populate must save the table");

    let first = TransitionModel::load(&table_path).unwrap();

    // A second run warm-loads the saved counts and adds its own on top,
    // so every persisted count is at least the first run's.
    let mut engine =
        PoetryGenerator::new(oracles(&lex, &corpus), small_config(), Some(table_path.clone()));
    engine.populate("the forest wakes", &mut rng).unwrap();
    let second = TransitionModel::load(&table_path).unwrap();

    assert!(!first.observed_tags().is_empty());
    for from in first.observed_tags() {
        for to in first.observed_tags() {
            let before = first.count(from, to);
            if before > 0 {
                assert_eq!(
                    second.count(from, to),
                    2 * before,
                    "count for {from}->{to} did not accumulate"
                );
            }
        }
    }

    let _ = std::fs::remove_file(&table_path);
}

#[test]
fn minimal_seeded_table_yields_alternating_noun_verb_lines() {
    let lex = Lexicon::default_lexicon();

    // Hand-seeded table: START->NOUN, NOUN->VERB, VERB->NOUN, with pools
    // NOUN [forest, dawn] and VERB [wakes, grows]. Every row has a single
    // next tag, so the walk must alternate.
    let token = |surface: &str, pos| TaggedToken {
        surface: surface.to_string(),
        lemma: surface.to_string(),
        pos,
        is_stopword: false,
        is_punctuation: false,
    };
    let mut model = TransitionModel::new();
    model.observe(&[
        token("forest", Pos::Noun),
        token("wakes", Pos::Verb),
        token("dawn", Pos::Noun),
        token("grows", Pos::Verb),
    ]);

    let related = RelatedWords::default();
    let config = GenConfig {
        num_lines: 4,
        base_line_length: 4,
        line_length_jitter: 0,
        markov_line_probability: 1.0,
        ..GenConfig::default()
    };
    let generator = LineGenerator::new(&model, &related, &lex, &config);
    let mut rng = StdRng::seed_from_u64(42);
    let lines = generator.generate_poem(4, &mut rng).unwrap();

    assert_eq!(lines.len(), 4);
    let nouns = ["forest", "dawn"];
    let verbs = ["wakes", "grows"];
    for (i, line) in lines.iter().enumerate() {
        let last = line.chars().last().unwrap();
        if i + 1 == lines.len() {
            assert_eq!(last, '.', "final line: {line:?}");
        } else {
            assert_eq!(last, ',', "interim line: {line:?}");
        }

        let words: Vec<String> = line
            .trim_end_matches(['.', ','])
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        assert_eq!(words.len(), 4, "line {line:?}");
        for (slot, word) in words.iter().enumerate() {
            let pool: &[&str] = if slot % 2 == 0 { &nouns } else { &verbs };
            assert!(
                pool.contains(&word.as_str()),
                "slot {slot} of {line:?} not drawn from the seeded pool"
            );
        }
    }
}

#[test]
fn default_config_run_terminates() {
    let lex = Lexicon::default_lexicon();
    let corpus = EmbeddedCorpus::default_corpus();

    // Default tunables: population 10, 10 lines, 5 generations.
    let mut engine =
        PoetryGenerator::new(oracles(&lex, &corpus), GenConfig::default(), None);
    let mut rng = StdRng::seed_from_u64(5);
    engine.run("the quiet forest at dawn", &mut rng).unwrap();

    assert_eq!(engine.population().len(), 10);
    assert!(engine.best_fitness() >= engine.mean_fitness());
    for poem in engine.population() {
        assert_eq!(poem.lines().len(), 10);
    }
}

/// A search oracle that never answers; title writing must still succeed.
struct NoHits;

impl SearchHits for NoHits {
    fn hit_count(&self, _phrase: &str) -> Option<u64> {
        None
    }
}

#[test]
fn titling_survives_a_dead_search_oracle() {
    let lex = Lexicon::default_lexicon();
    let corpus = EmbeddedCorpus::default_corpus();
    let mut rng = StdRng::seed_from_u64(11);
    let no_hits = NoHits;
    let oracle_set = Oracles {
        search: &no_hits,
        ..oracles(&lex, &corpus)
    };
    let mut engine = PoetryGenerator::new(oracle_set, small_config(), None);
    engine.run("moonlight on the meadow", &mut rng).unwrap();

    let archive_path = temp_path("nohits.json");
    let _ = std::fs::remove_file(&archive_path);
    let mut archive = JsonArchive::new(&archive_path);
    let best = engine.finish(&mut archive, &mut rng).unwrap();
    assert!(best.title().is_some_and(|t| !t.is_empty()));
    let _ = std::fs::remove_file(&archive_path);
}

#[test]
fn seeded_runs_are_reproducible() {
    let lex = Lexicon::default_lexicon();
    let corpus = EmbeddedCorpus::default_corpus();

    let run = || {
        let mut engine =
            PoetryGenerator::new(oracles(&lex, &corpus), small_config(), None);
        let mut rng = StdRng::seed_from_u64(99);
        engine.run("stone and starlight", &mut rng).unwrap();
        engine
            .population()
            .iter()
            .map(|p| p.lines().to_vec())
            .collect::<Vec<_>>()
    };

    assert_eq!(run(), run());
}
