//! # tabrecon
//!
//! A reconciliation diff engine: compares a query's result set against a
//! tabular file, classifies row and cell discrepancies, and serves them
//! through paginated result handles and plain or styled exports.

pub mod cli;
pub mod commands;
pub mod config;
pub mod data;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod export;
pub mod mapping;
pub mod matcher;
pub mod output;
pub mod progress;
pub mod result;
pub mod sql;
pub mod store;
pub mod value;
pub mod workspace;
pub mod xlsx;

pub use dataset::Dataset;
pub use engine::{ReconEngine, RunReceipt};
pub use error::{MappingError, ReconError, Result};
pub use mapping::{ColumnMapping, ColumnPair};
pub use result::{ComparisonResult, OutputRow, PrePost, RowStatus, Summary};
pub use store::{EvictionPolicy, Page, ResultHandle, ResultStore};
pub use value::{Normalizer, NormalizerConfig, Value};
pub use workspace::ReconWorkspace;

/// Current format version for persisted results and config
pub const FORMAT_VERSION: &str = "1.0.0";

/// Default number of rows per page
pub const DEFAULT_PAGE_SIZE: usize = 100;
