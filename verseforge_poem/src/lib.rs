// Verseforge Poetry Generator
//
// An evolutionary poem generator. A Markov model over part-of-speech
// transitions (trained on corpus text related to an inspiring phrase)
// drives candidate line synthesis, a multi-objective fitness function
// scores whole poems against the inspiring phrase, and a genetic
// algorithm with grammatical and phonetic mutation operators refines a
// population of candidates across generations.
//
// Architecture:
// - config.rs: `GenConfig` tunables and fitness weights (JSON-loadable)
// - error.rs: `GenError` pipeline error kinds with stable codes
// - transition.rs: POS transition model, token pools, CSV table persistence
// - grammar.rs: line synthesis (Markov walk + sentence templates), article
//   correction, reformatting, grammar-level mutation
// - phonetics.rs: poeticness mutation (alliteration, meter alignment, rhyme)
// - scoring.rs: fitness components (meaning closeness, keyword density,
//   line diversity) and line ranking for crossover
// - poem.rs: the `Poem` individual with cached fitness and title writing
// - evolve.rs: `PoetryGenerator` — population lifecycle and the genetic loop
//
// The generator is deterministic given a seed and an oracle set,
// supporting reproducible output.

pub mod config;
pub mod error;
pub mod evolve;
pub mod grammar;
pub mod phonetics;
pub mod poem;
pub mod scoring;
pub mod transition;

pub use config::{FitnessWeights, GenConfig};
pub use error::GenError;
pub use evolve::{Oracles, PoetryGenerator};
pub use poem::Poem;
pub use transition::TransitionModel;
