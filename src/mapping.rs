//! Column mapping resolution
//!
//! Turns the operator's (source column → target column) pairs into a
//! validated, ordered comparison [`Plan`]. Unmapped columns on either side
//! take no part in the comparison and never appear in the output.

use crate::error::{ColumnSide, MappingError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// One declared (source → target) column pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnPair {
    pub source: String,
    pub target: String,
}

impl ColumnPair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for ColumnPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.source, self.target)
    }
}

/// Parses `SRC=TGT`, or a bare `COL` meaning the same name on both sides
impl FromStr for ColumnPair {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (source, target) = match s.split_once('=') {
            Some((src, tgt)) => (src.trim(), tgt.trim()),
            None => (s.trim(), s.trim()),
        };
        if source.is_empty() || target.is_empty() {
            return Err(format!("Invalid column mapping: '{}'. Use SRC=TGT", s));
        }
        Ok(ColumnPair::new(source, target))
    }
}

/// Ordered column pairs as declared by the caller
pub type ColumnMapping = Vec<ColumnPair>;

/// Validated, ordered, deduplicated comparison plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pairs: Vec<ColumnPair>,
}

impl Plan {
    pub fn pairs(&self) -> &[ColumnPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn target_columns(&self) -> Vec<String> {
        self.pairs.iter().map(|p| p.target.clone()).collect()
    }

    pub fn source_columns(&self) -> Vec<String> {
        self.pairs.iter().map(|p| p.source.clone()).collect()
    }

    /// Target column mapped from a source column
    pub fn target_for(&self, source: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|p| p.source == source)
            .map(|p| p.target.as_str())
    }

    /// Resolve a key set against the plan
    ///
    /// Keys must be mapped source columns; repeated keys collapse to their
    /// first occurrence.
    pub fn resolve_keys(&self, keys: &[String]) -> Result<Vec<ColumnPair>, MappingError> {
        let mut resolved: Vec<ColumnPair> = Vec::with_capacity(keys.len());
        for key in keys {
            let pair = self
                .pairs
                .iter()
                .find(|p| &p.source == key)
                .ok_or_else(|| MappingError::UnmappedKey {
                    column: key.clone(),
                })?;
            if !resolved.contains(pair) {
                resolved.push(pair.clone());
            }
        }
        Ok(resolved)
    }
}

/// Validate a mapping against both datasets' columns
pub fn build_plan(
    source_columns: &[String],
    target_columns: &[String],
    mapping: &[ColumnPair],
) -> Result<Plan, MappingError> {
    let mut pairs: Vec<ColumnPair> = Vec::with_capacity(mapping.len());
    let mut seen_sources = HashSet::new();
    let mut seen_targets = HashSet::new();

    for pair in mapping {
        if !source_columns.contains(&pair.source) {
            return Err(MappingError::UnknownColumn {
                column: pair.source.clone(),
                side: ColumnSide::Source,
            });
        }
        if !target_columns.contains(&pair.target) {
            return Err(MappingError::UnknownColumn {
                column: pair.target.clone(),
                side: ColumnSide::Target,
            });
        }

        if pairs.contains(pair) {
            log::debug!("Ignoring repeated mapping {}", pair);
            continue;
        }
        if !seen_targets.insert(pair.target.as_str()) {
            return Err(MappingError::DuplicateTarget {
                target: pair.target.clone(),
            });
        }
        if !seen_sources.insert(pair.source.as_str()) {
            return Err(MappingError::DuplicateSource {
                column: pair.source.clone(),
            });
        }
        pairs.push(pair.clone());
    }

    if pairs.is_empty() {
        return Err(MappingError::EmptyMapping);
    }

    Ok(Plan { pairs })
}

/// Map columns whose names match ignoring case, in source column order
pub fn auto_map(source_columns: &[String], target_columns: &[String]) -> ColumnMapping {
    let mut used = vec![false; target_columns.len()];
    let mut mapping = Vec::new();

    for source in source_columns {
        let found = target_columns
            .iter()
            .enumerate()
            .find(|(i, t)| !used[*i] && t.to_lowercase() == source.to_lowercase());
        if let Some((i, target)) = found {
            used[i] = true;
            mapping.push(ColumnPair::new(source.clone(), target.clone()));
        }
    }

    log::debug!(
        "Auto-mapped {} / {} columns by name match",
        mapping.len(),
        source_columns.len()
    );
    mapping
}
