// Data-driven generation configuration.
//
// All tunable pipeline parameters live in `GenConfig`, loadable from JSON.
// The engine reads from the config rather than using magic numbers, so
// probability and weight tuning never requires touching the generation
// code. Defaults reproduce the reference behavior: population 10, base
// line length 10 ± 2, 50/50 markov/template lines, 60% mutation split
// 40/60 grammar/poeticness, fitness weights (1, 1, 10).

use serde::{Deserialize, Serialize};
use std::path::Path;
use verseforge_oracle::OracleError;

/// Weights combining the three fitness components. The scales are not
/// commensurable — dissimilarity sits an order of magnitude above the
/// others — so treat these as tunable configuration, not constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FitnessWeights {
    /// Weight on mean embedding closeness to the inspiring text.
    pub meaning: f64,
    /// Weight on keyword density.
    pub keyword: f64,
    /// Weight on pairwise line dissimilarity.
    pub dissimilarity: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        FitnessWeights {
            meaning: 1.0,
            keyword: 1.0,
            dissimilarity: 10.0,
        }
    }
}

/// Tunable parameters for the whole generation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    /// Individuals per generation. Constant across generations.
    pub population_size: usize,
    /// Lines per poem.
    pub num_lines: usize,
    /// Generations to run.
    pub generations: usize,
    /// Target Markov line length before jitter.
    pub base_line_length: usize,
    /// Markov line length jitter: length is base ± jitter.
    pub line_length_jitter: usize,
    /// Probability a line is generated by Markov walk instead of a template.
    pub markov_line_probability: f64,
    /// Probability an offspring is mutated at all.
    pub mutation_probability: f64,
    /// Given mutation, probability it is grammar-level (else poeticness).
    pub grammar_mutation_weight: f64,
    /// Per-line probability within a grammar mutation.
    pub grammar_line_mutation_probability: f64,
    /// Probability a poeticness mutation actually fires.
    pub poeticness_mutation_probability: f64,
    /// How many embedding neighbors to consider per word.
    pub neighbor_count: usize,
    /// Fitness component weights.
    pub weights: FitnessWeights,
}

impl Default for GenConfig {
    fn default() -> Self {
        GenConfig {
            population_size: 10,
            num_lines: 10,
            generations: 5,
            base_line_length: 10,
            line_length_jitter: 2,
            markov_line_probability: 0.5,
            mutation_probability: 0.6,
            grammar_mutation_weight: 0.4,
            grammar_line_mutation_probability: 0.6,
            poeticness_mutation_probability: 0.7,
            neighbor_count: 10,
            weights: FitnessWeights::default(),
        }
    }
}

impl GenConfig {
    /// Parse a config from a JSON string. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, OracleError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file.
    pub fn load(path: &Path) -> Result<Self, OracleError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GenConfig::default();
        assert_eq!(config.population_size, 10);
        assert_eq!(config.base_line_length, 10);
        assert!((config.weights.dissimilarity - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = GenConfig::from_json(r#"{"population_size": 6}"#).unwrap();
        assert_eq!(config.population_size, 6);
        assert_eq!(config.num_lines, 10);
    }
}
