//! Comparison runs and access to their stored results

use crate::dataset::Dataset;
use crate::error::Result;
use crate::evaluator::DiffEvaluator;
use crate::export::{self, ExportOptions};
use crate::mapping::{build_plan, ColumnPair};
use crate::matcher::RowMatcher;
use crate::result::{ComparisonResult, OutputRow, Summary};
use crate::store::{EvictionPolicy, Page, ResultHandle, ResultStore};
use crate::value::{Normalizer, NormalizerConfig};
use serde::{Deserialize, Serialize};
use std::io::{Seek, Write};
use std::sync::Arc;
use std::time::Instant;

/// Handle and summary of a finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReceipt {
    pub handle: ResultHandle,
    pub summary: Summary,
}

/// Reconciliation engine: runs comparisons and serves their results
pub struct ReconEngine {
    normalizer: Normalizer,
    store: ResultStore,
}

impl Default for ReconEngine {
    fn default() -> Self {
        Self::new(NormalizerConfig::default(), EvictionPolicy::default())
    }
}

impl ReconEngine {
    pub fn new(config: NormalizerConfig, policy: EvictionPolicy) -> Self {
        Self {
            normalizer: Normalizer::new(config),
            store: ResultStore::new(policy),
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Compute the difference set and publish it
    ///
    /// An empty `keys` slice selects sequential matching. Nothing is stored
    /// when the mapping or the keys are rejected.
    pub fn run_comparison(
        &self,
        source: &Dataset,
        target: &Dataset,
        mapping: &[ColumnPair],
        keys: &[String],
    ) -> Result<RunReceipt> {
        let result = self.compare(source, target, mapping, keys)?;
        let summary = result.summary.clone();
        let handle = self.store.put(result);

        log::info!(
            "Comparison {} finished: {} mismatches, {} only in SQL, {} only in file",
            handle.short(),
            summary.mismatches,
            summary.only_on_sql,
            summary.only_on_file
        );
        Ok(RunReceipt { handle, summary })
    }

    /// Run a comparison without publishing it
    pub fn compare(
        &self,
        source: &Dataset,
        target: &Dataset,
        mapping: &[ColumnPair],
        keys: &[String],
    ) -> Result<ComparisonResult> {
        let start = Instant::now();
        log::info!(
            "Comparing {} source rows against {} target rows",
            source.len(),
            target.len()
        );

        let plan = build_plan(source.columns(), target.columns(), mapping)?;
        let key_pairs = plan.resolve_keys(keys)?;
        let mode = RowMatcher::mode(&key_pairs);
        log::debug!("Plan: {} columns, {} mode", plan.len(), mode);

        let phase = Instant::now();
        let outcome = RowMatcher::new(&self.normalizer).match_rows(source, target, &key_pairs);
        log::debug!(
            "Matched {} pairs in {:?}",
            outcome.matched_pairs.len(),
            phase.elapsed()
        );

        let phase = Instant::now();
        let evaluation = DiffEvaluator::new(&self.normalizer, &plan).evaluate(source, target, &outcome);
        log::debug!("Evaluated pairs in {:?}", phase.elapsed());

        let summary = Summary {
            total_sql_rows: source.len(),
            total_file_rows: target.len(),
            mismatches: evaluation.mismatches,
            only_on_sql: evaluation.only_on_sql,
            only_on_file: evaluation.only_on_file,
            matched_rows: evaluation.matched_rows,
            total_discrepancies: evaluation.rows.len(),
            comparison_mode: mode,
            key_columns: key_pairs.iter().map(|p| p.source.clone()).collect(),
            compared_columns: plan.target_columns(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        };

        Ok(ComparisonResult {
            columns: plan.target_columns(),
            rows: evaluation.rows,
            summary,
            created: chrono::Utc::now(),
        })
    }

    pub fn get_page(&self, handle: &ResultHandle, page: usize, size: usize) -> Result<Page> {
        self.store.page(handle, page, size)
    }

    pub fn stream(&self, handle: &ResultHandle) -> Result<Vec<OutputRow>> {
        self.store.stream(handle)
    }

    pub fn summary(&self, handle: &ResultHandle) -> Result<Summary> {
        self.store.summary(handle)
    }

    pub fn result(&self, handle: &ResultHandle) -> Result<Arc<ComparisonResult>> {
        self.store.get(handle)
    }

    pub fn evict(&self, handle: &ResultHandle) -> Result<bool> {
        Ok(self.store.evict(handle))
    }

    pub fn export_plain(&self, handle: &ResultHandle) -> Result<Vec<u8>> {
        let result = self.store.get(handle)?;
        export::export_plain(&result, &ExportOptions::default())
    }

    pub fn write_plain<W: Write>(&self, handle: &ResultHandle, writer: W) -> Result<()> {
        let result = self.store.get(handle)?;
        export::write_plain(&result, writer, &ExportOptions::default())
    }

    pub fn export_styled(&self, handle: &ResultHandle) -> Result<Vec<u8>> {
        let result = self.store.get(handle)?;
        export::export_styled(&result)
    }

    pub fn write_styled<W: Write + Seek>(&self, handle: &ResultHandle, writer: W) -> Result<()> {
        let result = self.store.get(handle)?;
        export::write_styled(&result, writer)
    }
}
