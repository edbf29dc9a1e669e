//! Cell-level comparison of matched pairs and assembly of output rows

use crate::dataset::Dataset;
use crate::mapping::Plan;
use crate::matcher::{MatchOutcome, MatchedPair};
use crate::result::{OutputRow, PrePost, RowStatus};
use crate::value::Normalizer;
use indexmap::IndexMap;
use rayon::prelude::*;

/// Ordered output rows plus the counts derived while producing them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub rows: Vec<OutputRow>,
    pub mismatches: usize,
    pub matched_rows: usize,
    pub only_on_sql: usize,
    pub only_on_file: usize,
}

/// Compares matched pairs column by column along a plan
pub struct DiffEvaluator<'a> {
    normalizer: &'a Normalizer,
    plan: &'a Plan,
}

impl<'a> DiffEvaluator<'a> {
    pub fn new(normalizer: &'a Normalizer, plan: &'a Plan) -> Self {
        Self { normalizer, plan }
    }

    /// Build the ordered result rows
    ///
    /// Mismatch pre/post groups come first in matched-pair order, then
    /// source orphans, then target orphans.
    pub fn evaluate(&self, source: &Dataset, target: &Dataset, outcome: &MatchOutcome) -> Evaluation {
        let groups: Vec<Option<(OutputRow, OutputRow)>> = outcome
            .matched_pairs
            .par_iter()
            .map(|pair| self.compare_pair(source, target, pair))
            .collect();

        let mismatches = groups.iter().filter(|g| g.is_some()).count();
        let mut rows = Vec::with_capacity(
            mismatches * 2 + outcome.only_source.len() + outcome.only_target.len(),
        );

        for (pre, post) in groups.into_iter().flatten() {
            rows.push(pre);
            rows.push(post);
        }

        rows.extend(
            outcome
                .only_source
                .iter()
                .map(|&idx| self.orphan_row(source, idx, RowStatus::OnlyInSql)),
        );
        rows.extend(
            outcome
                .only_target
                .iter()
                .map(|&idx| self.orphan_row(target, idx, RowStatus::OnlyInFile)),
        );

        Evaluation {
            rows,
            mismatches,
            matched_rows: outcome.matched_pairs.len() - mismatches,
            only_on_sql: outcome.only_source.len(),
            only_on_file: outcome.only_target.len(),
        }
    }

    /// Target columns whose values differ for one pair, in plan order
    pub fn mismatch_columns(&self, source: &Dataset, target: &Dataset, pair: &MatchedPair) -> Vec<String> {
        self.plan
            .pairs()
            .iter()
            .filter(|col| {
                !self.normalizer.equals(
                    source.value(pair.source, &col.source),
                    target.value(pair.target, &col.target),
                )
            })
            .map(|col| col.target.clone())
            .collect()
    }

    fn compare_pair(
        &self,
        source: &Dataset,
        target: &Dataset,
        pair: &MatchedPair,
    ) -> Option<(OutputRow, OutputRow)> {
        let mismatch_columns = self.mismatch_columns(source, target, pair);
        if mismatch_columns.is_empty() {
            return None;
        }

        let pre = OutputRow {
            status: RowStatus::Mismatch,
            pre_post: PrePost::Pre,
            values: self.source_values(source, pair.source),
            mismatch_columns: mismatch_columns.clone(),
        };
        let post = OutputRow {
            status: RowStatus::Mismatch,
            pre_post: PrePost::Post,
            values: self.target_values(target, pair.target),
            mismatch_columns,
        };
        Some((pre, post))
    }

    fn orphan_row(&self, dataset: &Dataset, row: usize, status: RowStatus) -> OutputRow {
        let values = match status {
            RowStatus::OnlyInSql => self.source_values(dataset, row),
            _ => self.target_values(dataset, row),
        };
        OutputRow {
            status,
            pre_post: PrePost::Absent,
            values,
            mismatch_columns: Vec::new(),
        }
    }

    fn source_values(&self, source: &Dataset, row: usize) -> IndexMap<String, String> {
        self.plan
            .pairs()
            .iter()
            .map(|col| (col.target.clone(), source.value(row, &col.source).display()))
            .collect()
    }

    fn target_values(&self, target: &Dataset, row: usize) -> IndexMap<String, String> {
        self.plan
            .pairs()
            .iter()
            .map(|col| (col.target.clone(), target.value(row, &col.target).display()))
            .collect()
    }
}
