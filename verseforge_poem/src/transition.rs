// POS transition model: Markov-chain table of tag-to-tag frequencies plus
// per-tag token pools.
//
// Built by observing tagged training lines. Each line contributes one
// (START, first_tag) transition and one (tag, next_tag) transition per
// alphabetic token with a successor; each alphabetic token's lemma is
// appended to the pool for its tag, duplicates kept so pool draws are
// implicitly frequency-weighted.
//
// Persistence is deliberately asymmetric: the transition frequencies
// serialize to a rectangular matrix (rows/columns keyed by tag string) and
// survive across sessions; token pools are ephemeral and are rebuilt from
// whatever corpus the current session ingests. A warm table biases tag
// sequences from history while vocabulary stays session-local.
//
// The table is write-only during ingestion and read-only once generation
// starts. Frequencies are unnormalized counts; normalization happens at
// sampling time.

use std::collections::BTreeMap;
use std::path::Path;

use rand::Rng;
use tracing::debug;
use verseforge_oracle::{OracleError, Pos, TaggedToken, Tagger};

use crate::error::GenError;

/// Frequency distribution over next tags. BTreeMap for deterministic
/// iteration order during sampling and persistence.
type FrequencyRow = BTreeMap<Pos, u64>;

/// POS→POS transition frequencies and per-POS token pools.
#[derive(Debug, Clone, Default)]
pub struct TransitionModel {
    transitions: BTreeMap<Pos, FrequencyRow>,
    pools: BTreeMap<Pos, Vec<String>>,
}

impl TransitionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one tagged line: the START transition, the per-token
    /// transitions, and the token-pool entries.
    pub fn observe(&mut self, tokens: &[TaggedToken]) {
        let Some(first) = tokens.first() else {
            return;
        };
        *self
            .transitions
            .entry(Pos::Start)
            .or_default()
            .entry(first.pos)
            .or_insert(0) += 1;

        for (i, token) in tokens.iter().enumerate() {
            if !token.is_alphabetic() {
                continue;
            }
            self.pools
                .entry(token.pos)
                .or_default()
                .push(token.lemma.to_lowercase());
            if let Some(next) = tokens.get(i + 1) {
                *self
                    .transitions
                    .entry(token.pos)
                    .or_default()
                    .entry(next.pos)
                    .or_insert(0) += 1;
            }
        }
    }

    /// Tag and observe a batch of training lines.
    pub fn ingest(&mut self, tagger: &dyn Tagger, lines: &[String]) {
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let tokens = tagger.tag(line);
            self.observe(&tokens);
        }
        debug!(
            lines = lines.len(),
            rows = self.transitions.len(),
            pool_tags = self.pools.len(),
            "ingested training lines"
        );
    }

    /// Draw a next tag proportionally to recorded frequencies. An unseen
    /// tag (or an all-zero row) falls back to returning `pos` unchanged;
    /// the caller decides what that means.
    pub fn sample_next(&self, pos: Pos, rng: &mut impl Rng) -> Pos {
        let Some(row) = self.transitions.get(&pos) else {
            return pos;
        };
        sample_from_row(row, rng.random::<f64>()).unwrap_or(pos)
    }

    /// The token pool observed for a tag. Empty slice when the tag has no
    /// pool this session.
    pub fn tokens_for(&self, pos: Pos) -> &[String] {
        self.pools.get(&pos).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Draw one pool token uniformly (frequency-weighted via duplicates).
    pub fn random_token_for(&self, pos: Pos, rng: &mut impl Rng) -> Result<&str, GenError> {
        let pool = self.tokens_for(pos);
        if pool.is_empty() {
            return Err(GenError::EmptyPool { pos });
        }
        Ok(&pool[rng.random_range(0..pool.len())])
    }

    /// Tags that have a transition row.
    pub fn observed_tags(&self) -> Vec<Pos> {
        self.transitions.keys().copied().collect()
    }

    /// Raw observation count for one transition.
    pub fn count(&self, from: Pos, to: Pos) -> u64 {
        self.transitions
            .get(&from)
            .and_then(|row| row.get(&to))
            .copied()
            .unwrap_or(0)
    }

    /// Normalized probability distribution for a row (test/debug helper).
    pub fn distribution(&self, pos: Pos) -> BTreeMap<Pos, f64> {
        let Some(row) = self.transitions.get(&pos) else {
            return BTreeMap::new();
        };
        let total: u64 = row.values().sum();
        if total == 0 {
            return BTreeMap::new();
        }
        row.iter()
            .map(|(&tag, &count)| (tag, count as f64 / total as f64))
            .collect()
    }

    // -----------------------------------------------------------------
    // Persistence: rectangular frequency matrix.
    //
    // First line: ,TAG1,TAG2,...   (column headers)
    // Then one line per row tag:  TAG,c1,c2,...
    //
    // Columns are the union of row tags and every tag appearing in any
    // distribution, so loading reproduces the distributions exactly.
    // -----------------------------------------------------------------

    /// Serialize the transition frequencies (not the pools) to `path`.
    pub fn save(&self, path: &Path) -> Result<(), OracleError> {
        let mut columns: Vec<Pos> = self.transitions.keys().copied().collect();
        for row in self.transitions.values() {
            for &tag in row.keys() {
                if !columns.contains(&tag) {
                    columns.push(tag);
                }
            }
        }
        columns.sort();

        let mut out = String::new();
        for col in &columns {
            out.push(',');
            out.push_str(col.as_str());
        }
        out.push('\n');
        for (tag, row) in &self.transitions {
            out.push_str(tag.as_str());
            for col in &columns {
                out.push(',');
                out.push_str(&row.get(col).copied().unwrap_or(0).to_string());
            }
            out.push('\n');
        }
        std::fs::write(path, out)?;
        Ok(())
    }

    /// Load transition frequencies from `path` into a fresh model with
    /// empty token pools.
    pub fn load(path: &Path) -> Result<Self, OracleError> {
        let data = std::fs::read_to_string(path)?;
        let mut lines = data.lines();
        let header = lines.next().unwrap_or("");
        let columns: Vec<Pos> = header
            .split(',')
            .skip(1)
            .map(|tag| tag.parse::<Pos>().map_err(invalid_table))
            .collect::<Result<_, _>>()?;

        let mut model = TransitionModel::new();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split(',');
            let tag: Pos = fields
                .next()
                .ok_or_else(|| invalid_table("missing row tag"))?
                .parse()
                .map_err(invalid_table)?;
            let row = model.transitions.entry(tag).or_default();
            for (col, field) in columns.iter().zip(fields) {
                let count: u64 = field.parse().map_err(invalid_table)?;
                if count > 0 {
                    row.insert(*col, count);
                }
            }
        }
        Ok(model)
    }
}

fn invalid_table(err: impl ToString) -> OracleError {
    OracleError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("malformed transition table: {}", err.to_string()),
    ))
}

/// Draw a tag from a frequency row using a uniform value in [0, 1).
fn sample_from_row(row: &FrequencyRow, rng_val: f64) -> Option<Pos> {
    let total: u64 = row.values().sum();
    if total == 0 {
        return None;
    }
    let target = rng_val * total as f64;
    let mut cumulative = 0.0;
    for (&tag, &count) in row {
        cumulative += count as f64;
        if cumulative > target {
            return Some(tag);
        }
    }
    row.keys().next_back().copied()
}
