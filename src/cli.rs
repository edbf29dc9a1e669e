//! Command-line interface for tabrecon

use crate::mapping::ColumnPair;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tabrecon")]
#[command(about = "Reconcile a query result against a tabular file")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override workspace location
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize tabrecon workspace
    Init {
        /// Rewrite the config even if the workspace exists
        #[arg(long)]
        force: bool,
    },

    /// Compare a source (query file or data file) against a target file
    Run {
        /// Source data: a .sql query file, or a CSV/Parquet/JSON file
        #[arg(long)]
        source: PathBuf,

        /// Target data file
        #[arg(long)]
        target: PathBuf,

        /// Column mapping SRC=TGT (repeatable, in comparison order)
        #[arg(long = "map", value_name = "SRC=TGT")]
        map: Vec<ColumnPair>,

        /// Map columns whose names match ignoring case
        #[arg(long)]
        auto_map: bool,

        /// Source key column (repeatable); none selects sequential matching
        #[arg(long = "key", value_name = "COL")]
        keys: Vec<String>,

        /// Compare text ignoring case
        #[arg(long)]
        case_insensitive: bool,

        /// Rows shown from the first page
        #[arg(long, value_parser = validate_page_size)]
        page_size: Option<usize>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Show one page of a stored result
    Page {
        /// Result handle, unique handle prefix, or "latest"
        handle: String,

        /// Page number, starting at 1
        #[arg(long, default_value = "1", value_parser = validate_page_number)]
        page: usize,

        /// Rows per page (defaults to the workspace setting)
        #[arg(long, value_parser = validate_page_size)]
        size: Option<usize>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Show the summary of a stored result
    Show {
        /// Result handle, unique handle prefix, or "latest"
        handle: String,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Export a stored result to CSV or a styled XLSX workbook
    Export {
        /// Result handle, unique handle prefix, or "latest"
        handle: String,

        /// Output file path
        #[arg(long)]
        output: PathBuf,

        /// Export format: "csv", "xlsx" (inferred from the extension when omitted)
        #[arg(long)]
        format: Option<String>,

        /// Overwrite an existing output file
        #[arg(long)]
        force: bool,
    },

    /// List stored results
    List {
        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Remove stored results
    Evict {
        /// Result handle or unique handle prefix
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        handle: Option<String>,

        /// Remove every stored result
        #[arg(long)]
        all: bool,
    },
}

/// Parse output format string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'pretty' or 'json'", s)),
        }
    }
}

fn validate_page_size(s: &str) -> Result<usize, String> {
    let size: usize = s
        .parse()
        .map_err(|_| format!("Invalid page size: '{}'. Must be a positive integer.", s))?;

    if size == 0 {
        return Err("Page size must be greater than 0".to_string());
    }

    Ok(size)
}

fn validate_page_number(s: &str) -> Result<usize, String> {
    let page: usize = s
        .parse()
        .map_err(|_| format!("Invalid page: '{}'. Must be a positive integer.", s))?;

    if page == 0 {
        return Err("Pages start at 1".to_string());
    }

    Ok(page)
}
