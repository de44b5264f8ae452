// Verseforge — CLI entry point.
//
// Evolves a short poem from an inspiring text. The pipeline: corpus
// ingestion → transition-model training → initial population → genetic
// refinement → title + archive output.
//
// Usage:
//   cargo run -p verseforge_poem -- "inspiring text" [--lines N]
//     [--generations N] [--population N] [--seed N] [--config FILE]
//     [--table FILE] [--archive FILE]

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;
use verseforge_oracle::{EmbeddedCorpus, JsonArchive, Lexicon};
use verseforge_poem::config::GenConfig;
use verseforge_poem::evolve::{Oracles, PoetryGenerator};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Parse arguments
    let inspiring_text = args
        .get(1)
        .filter(|s| !s.starts_with("--"))
        .map(|s| s.as_str())
        .unwrap_or("the quiet forest at dawn")
        .to_string();
    let seed: Option<u64> = parse_flag(&args, "--seed");
    let config_path: Option<String> = parse_flag(&args, "--config");
    let table_path: Option<String> = parse_flag(&args, "--table");
    let archive_path: String =
        parse_flag(&args, "--archive").unwrap_or_else(|| "poems.json".to_string());

    let mut config = match &config_path {
        Some(path) => match GenConfig::load(Path::new(path)) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load config '{}': {}", path, e);
                std::process::exit(1);
            }
        },
        None => GenConfig::default(),
    };
    if let Some(n) = parse_flag(&args, "--lines") {
        config.num_lines = n;
    }
    if let Some(n) = parse_flag(&args, "--generations") {
        config.generations = n;
    }
    if let Some(n) = parse_flag(&args, "--population") {
        config.population_size = n;
    }

    println!("=== Verseforge Poetry Generator ===");
    println!("Inspiring text: {}", inspiring_text);
    println!("Population: {}", config.population_size);
    println!("Lines per poem: {}", config.num_lines);
    println!("Generations: {}", config.generations);
    if let Some(s) = seed {
        println!("Seed: {}", s);
    }
    println!();

    // Initialize RNG
    let mut rng = if let Some(s) = seed {
        StdRng::seed_from_u64(s)
    } else {
        StdRng::from_os_rng()
    };

    // Load oracles
    println!("[1/4] Loading lexicon and corpus...");
    let lexicon = Lexicon::default_lexicon();
    let corpus = EmbeddedCorpus::default_corpus();
    let oracles = Oracles {
        tagger: &lexicon,
        embedder: &lexicon,
        lexical: &lexicon,
        phonetic: &lexicon,
        search: &lexicon,
        corpus: &corpus,
    };

    let mut engine = PoetryGenerator::new(oracles, config, table_path.map(PathBuf::from));

    // Train + initial population
    println!("[2/4] Training transition model and seeding population...");
    if let Err(e) = engine.populate(&inspiring_text, &mut rng) {
        eprintln!("  Failed to build population ({}): {}", e.code(), e);
        std::process::exit(1);
    }
    println!(
        "  {} candidates, initial best fitness {:.3}",
        engine.population().len(),
        engine.best_fitness()
    );

    // Evolve
    println!("[3/4] Evolving...");
    for generation in 1..=engine.config().generations {
        if let Err(e) = engine.evolve_generation(&mut rng) {
            eprintln!("  Generation {} failed ({}): {}", generation, e.code(), e);
            std::process::exit(1);
        }
        println!(
            "  Generation {}: best {:.3}, mean {:.3}",
            generation,
            engine.best_fitness(),
            engine.mean_fitness()
        );
    }

    // Title + archive
    println!("[4/4] Writing the winner to {}...", archive_path);
    let mut archive = JsonArchive::new(&archive_path);
    match engine.finish(&mut archive, &mut rng) {
        Ok(poem) => {
            println!();
            println!("{}", poem);
            println!();
            println!("Fitness: {:.3}", poem.fitness());
        }
        Err(e) => {
            eprintln!("  Error finishing run ({}): {}", e.code(), e);
            std::process::exit(1);
        }
    }
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}
