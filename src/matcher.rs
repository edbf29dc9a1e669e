//! Row pairing between the source and target datasets
//!
//! Two strategies:
//! - keyed: rows sharing the same composite key are paired in occurrence
//!   order, surplus rows on either side become orphans
//! - sequential: row `i` pairs with row `i`, the longer side's tail becomes
//!   orphans

use crate::dataset::Dataset;
use crate::mapping::ColumnPair;
use crate::value::{NormalizedValue, Normalizer};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Composite identity of a row
pub type MatchKey = Vec<NormalizedValue>;

/// How rows were paired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    KeyBased,
    Sequential,
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMode::KeyBased => write!(f, "Key-Based"),
            MatchMode::Sequential => write!(f, "Sequential"),
        }
    }
}

/// Indices of one source row and one target row sharing identity/position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedPair {
    pub source: usize,
    pub target: usize,
}

/// Pairs plus the rows left over on each side
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    pub matched_pairs: Vec<MatchedPair>,
    pub only_source: Vec<usize>,
    pub only_target: Vec<usize>,
}

/// Pairs rows of two datasets
pub struct RowMatcher<'a> {
    normalizer: &'a Normalizer,
}

impl<'a> RowMatcher<'a> {
    pub fn new(normalizer: &'a Normalizer) -> Self {
        Self { normalizer }
    }

    /// Pair rows by key when `keys` is non-empty, by position otherwise
    ///
    /// `keys` are resolved plan pairs: the source side of each pair is read
    /// from `source`, the target side from `target`.
    pub fn match_rows(&self, source: &Dataset, target: &Dataset, keys: &[ColumnPair]) -> MatchOutcome {
        if keys.is_empty() {
            Self::match_sequential(source.len(), target.len())
        } else {
            self.match_keyed(source, target, keys)
        }
    }

    pub fn mode(keys: &[ColumnPair]) -> MatchMode {
        if keys.is_empty() {
            MatchMode::Sequential
        } else {
            MatchMode::KeyBased
        }
    }

    fn match_sequential(source_len: usize, target_len: usize) -> MatchOutcome {
        let common = source_len.min(target_len);
        MatchOutcome {
            matched_pairs: (0..common)
                .map(|i| MatchedPair { source: i, target: i })
                .collect(),
            only_source: (common..source_len).collect(),
            only_target: (common..target_len).collect(),
        }
    }

    fn match_keyed(&self, source: &Dataset, target: &Dataset, keys: &[ColumnPair]) -> MatchOutcome {
        let source_cols: Vec<&str> = keys.iter().map(|k| k.source.as_str()).collect();
        let target_cols: Vec<&str> = keys.iter().map(|k| k.target.as_str()).collect();

        let (source_index, target_index) = rayon::join(
            || self.build_index(source, &source_cols),
            || self.build_index(target, &target_cols),
        );

        log::debug!(
            "Key index: {} distinct source keys, {} distinct target keys",
            source_index.len(),
            target_index.len()
        );

        let mut outcome = MatchOutcome::default();

        // Source index iterates in first-occurrence order, which fixes the
        // order of matched pairs.
        for (key, source_rows) in &source_index {
            match target_index.get(key) {
                Some(target_rows) => {
                    let paired = source_rows.len().min(target_rows.len());
                    outcome.matched_pairs.extend(
                        source_rows
                            .iter()
                            .zip(target_rows.iter())
                            .map(|(&s, &t)| MatchedPair { source: s, target: t }),
                    );
                    outcome.only_source.extend_from_slice(&source_rows[paired..]);
                    outcome.only_target.extend_from_slice(&target_rows[paired..]);
                }
                None => outcome.only_source.extend_from_slice(source_rows),
            }
        }

        for (key, target_rows) in &target_index {
            if !source_index.contains_key(key) {
                outcome.only_target.extend_from_slice(target_rows);
            }
        }

        outcome.only_source.sort_unstable();
        outcome.only_target.sort_unstable();
        outcome
    }

    fn build_index(&self, dataset: &Dataset, columns: &[&str]) -> IndexMap<MatchKey, Vec<usize>> {
        let mut index: IndexMap<MatchKey, Vec<usize>> = IndexMap::new();
        for row in 0..dataset.len() {
            let key: MatchKey = columns
                .iter()
                .map(|col| self.normalizer.normalize(dataset.value(row, col)))
                .collect();
            index.entry(key).or_default().push(row);
        }
        index
    }
}
