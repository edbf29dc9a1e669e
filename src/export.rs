//! Serialization of stored results to downloadable artifacts
//!
//! Both exporters share one column layout: `status`, `pre_post`, then the
//! plan's target columns. The per-row mismatch column set is bookkeeping and
//! only shows up as cell highlighting in the styled export.

use crate::error::{ReconError, Result};
use crate::result::ComparisonResult;
use crate::xlsx::StyledWorkbook;
use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

pub const STATUS_HEADER: &str = "status";
pub const PRE_POST_HEADER: &str = "pre_post";

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Delimited text, every field quoted
    Csv,
    /// Tab-delimited text, every field quoted
    Tsv,
    /// Office Open XML workbook with highlighted discrepancies
    Xlsx,
}

impl ExportFormat {
    /// Determine format from file extension
    pub fn from_extension(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        match extension.as_deref() {
            Some("csv") | Some("txt") => Ok(ExportFormat::Csv),
            Some("tsv") => Ok(ExportFormat::Tsv),
            Some("xlsx") => Ok(ExportFormat::Xlsx),
            Some(ext) => Err(ReconError::invalid_input(format!(
                "Unsupported file extension: {}",
                ext
            ))),
            None => Err(ReconError::invalid_input("No file extension provided")),
        }
    }

    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            _ => Err(format!("Invalid export format: {}. Use 'csv', 'tsv' or 'xlsx'", s)),
        }
    }
}

/// Export options for customizing output
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Field delimiter (plain export only)
    pub delimiter: u8,
    /// Overwrite an existing output file
    pub force: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            force: false,
        }
    }
}

/// Header row shared by both exporters
pub fn header(result: &ComparisonResult) -> Vec<&str> {
    let mut header = Vec::with_capacity(result.columns.len() + 2);
    header.push(STATUS_HEADER);
    header.push(PRE_POST_HEADER);
    header.extend(result.columns.iter().map(String::as_str));
    header
}

/// Write the result as delimited text
pub fn write_plain<W: Write>(result: &ComparisonResult, writer: W, options: &ExportOptions) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(writer);

    wtr.write_record(header(result))?;

    for row in &result.rows {
        let mut record: Vec<&str> = Vec::with_capacity(result.columns.len() + 2);
        record.push(row.status.as_str());
        record.push(row.pre_post.as_str());
        record.extend(
            result
                .columns
                .iter()
                .map(|col| row.values.get(col).map(String::as_str).unwrap_or("")),
        );
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Plain export into memory
pub fn export_plain(result: &ComparisonResult, options: &ExportOptions) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_plain(result, &mut buf, options)?;
    Ok(buf)
}

/// Write the result as a styled workbook
pub fn write_styled<W: Write + Seek>(result: &ComparisonResult, writer: W) -> Result<()> {
    StyledWorkbook::new(result).write(writer)
}

/// Styled export into memory
pub fn export_styled(result: &ComparisonResult) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    write_styled(result, &mut cursor)?;
    Ok(cursor.into_inner())
}

/// Export to a file, format chosen explicitly or from the extension
pub fn export_to_path(
    result: &ComparisonResult,
    path: &Path,
    format: Option<ExportFormat>,
    options: &ExportOptions,
) -> Result<ExportFormat> {
    let format = match format {
        Some(format) => format,
        None => ExportFormat::from_extension(path)?,
    };

    if path.exists() && !options.force {
        return Err(ReconError::invalid_input(format!(
            "Output file already exists: {}. Use --force to overwrite.",
            path.display()
        )));
    }

    let file = File::create(path)?;
    match format {
        ExportFormat::Csv => write_plain(result, BufWriter::new(file), options)?,
        ExportFormat::Tsv => {
            let tabbed = ExportOptions {
                delimiter: b'\t',
                ..options.clone()
            };
            write_plain(result, BufWriter::new(file), &tabbed)?
        }
        ExportFormat::Xlsx => write_styled(result, BufWriter::new(file))?,
    }

    log::info!(
        "Exported {} rows to {}",
        result.rows.len(),
        path.display()
    );
    Ok(format)
}
