//! Comparison output: rows, summary and the finished result

use crate::matcher::MatchMode;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discrepancy category of an output row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowStatus {
    #[serde(rename = "Mismatch")]
    Mismatch,
    #[serde(rename = "Only in SQL")]
    OnlyInSql,
    #[serde(rename = "Only in File")]
    OnlyInFile,
}

impl RowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowStatus::Mismatch => "Mismatch",
            RowStatus::OnlyInSql => "Only in SQL",
            RowStatus::OnlyInFile => "Only in File",
        }
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Mismatch" => Ok(RowStatus::Mismatch),
            "Only in SQL" => Ok(RowStatus::OnlyInSql),
            "Only in File" => Ok(RowStatus::OnlyInFile),
            other => Err(format!("Unknown row status: {}", other)),
        }
    }
}

/// Side of a mismatch pair a row shows; orphans are `Absent`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrePost {
    Pre,
    Post,
    Absent,
}

impl PrePost {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrePost::Pre => "pre",
            PrePost::Post => "post",
            PrePost::Absent => "",
        }
    }
}

impl fmt::Display for PrePost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrePost {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre" => Ok(PrePost::Pre),
            "post" => Ok(PrePost::Post),
            "" | "absent" => Ok(PrePost::Absent),
            other => Err(format!("Unknown pre/post marker: {}", other)),
        }
    }
}

/// One emitted discrepancy row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRow {
    pub status: RowStatus,
    pub pre_post: PrePost,
    /// Display values keyed by target-side column name, in plan order
    pub values: IndexMap<String, String>,
    /// Target-side columns whose normalized values differed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mismatch_columns: Vec<String>,
}

impl OutputRow {
    pub fn is_mismatch_cell(&self, column: &str) -> bool {
        self.mismatch_columns.iter().any(|c| c == column)
    }
}

/// Counts and run metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_sql_rows: usize,
    pub total_file_rows: usize,
    /// Mismatch pairs, not mismatch rows
    pub mismatches: usize,
    pub only_on_sql: usize,
    pub only_on_file: usize,
    /// Matched pairs whose mapped values were all equal
    pub matched_rows: usize,
    pub total_discrepancies: usize,
    pub comparison_mode: MatchMode,
    pub key_columns: Vec<String>,
    pub compared_columns: Vec<String>,
    pub elapsed_ms: u64,
}

impl Summary {
    pub fn has_discrepancies(&self) -> bool {
        self.mismatches > 0 || self.only_on_sql > 0 || self.only_on_file > 0
    }
}

/// Finished, immutable output of one comparison run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Output column order: the plan's target columns
    pub columns: Vec<String>,
    pub rows: Vec<OutputRow>,
    pub summary: Summary,
    pub created: DateTime<Utc>,
}

impl ComparisonResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
