//! Output formatting utilities

use crate::engine::RunReceipt;
use crate::error::Result;
use crate::result::{OutputRow, Summary};
use crate::store::{Page, ResultHandle};
use crate::workspace::StoredResult;

/// Cell text longer than this is cut in tables
const MAX_CELL_WIDTH: usize = 30;

/// Pretty printer for tabrecon output
pub struct PrettyPrinter;

impl PrettyPrinter {
    pub fn print_summary(handle: &ResultHandle, summary: &Summary) {
        print!("{}", Self::render_summary(handle, summary));
    }

    pub fn render_summary(handle: &ResultHandle, summary: &Summary) -> String {
        let mut out = String::new();
        let status = if summary.has_discrepancies() {
            "❌ Discrepancies found"
        } else {
            "✅ Data matches"
        };

        out.push_str(&format!("🔍 Reconciliation {}\n", handle));
        out.push_str(&format!("├─ {}\n", status));
        out.push_str(&format!(
            "├─ Mode: {}{}\n",
            summary.comparison_mode,
            if summary.key_columns.is_empty() {
                String::new()
            } else {
                format!(" ({})", summary.key_columns.join(", "))
            }
        ));
        out.push_str(&format!(
            "├─ Rows: {} SQL, {} file\n",
            summary.total_sql_rows, summary.total_file_rows
        ));
        out.push_str(&format!("├─ Matched: {}\n", summary.matched_rows));
        out.push_str(&format!("├─ Mismatches: {}\n", summary.mismatches));
        out.push_str(&format!("├─ Only in SQL: {}\n", summary.only_on_sql));
        out.push_str(&format!("├─ Only in file: {}\n", summary.only_on_file));
        out.push_str(&format!(
            "├─ Compared columns: {}\n",
            summary.compared_columns.join(", ")
        ));
        out.push_str(&format!("└─ Elapsed: {} ms\n", summary.elapsed_ms));
        out
    }

    pub fn print_page(page: &Page, columns: &[String]) {
        print!("{}", Self::render_page(page, columns));
    }

    /// Fixed-width table of one page; mismatching cells are starred
    pub fn render_page(page: &Page, columns: &[String]) -> String {
        if page.total_rows == 0 {
            return "No discrepancies found - data matches perfectly!\n".to_string();
        }

        let mut header = vec!["status".to_string(), "pre_post".to_string()];
        header.extend(columns.iter().cloned());

        let body: Vec<Vec<String>> = page.rows.iter().map(|row| table_row(row, columns)).collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
        for row in &body {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        push_line(&mut out, &header, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(&mut out, &rule, &widths);
        for row in &body {
            push_line(&mut out, row, &widths);
        }

        out.push_str(&format!(
            "Page {} of {} ({} rows total{})\n",
            page.page,
            page.total_pages().max(1),
            page.total_rows,
            if page.has_more { ", more available" } else { "" }
        ));
        out
    }

    pub fn print_result_list(results: &[StoredResult]) {
        if results.is_empty() {
            println!("No stored results.");
            return;
        }

        println!("📋 Stored Results:");
        for (i, entry) in results.iter().enumerate() {
            let prefix = if i == results.len() - 1 { "└─" } else { "├─" };
            println!(
                "{} {}  {}  {} discrepancies  {}",
                prefix,
                entry.handle.short(),
                entry.created.format("%Y-%m-%d %H:%M:%S"),
                entry.summary.total_discrepancies,
                format_bytes(entry.size_bytes)
            );
        }
    }
}

fn table_row(row: &OutputRow, columns: &[String]) -> Vec<String> {
    let mut cells = vec![row.status.to_string(), row.pre_post.to_string()];
    for column in columns {
        let value = row.values.get(column).map(String::as_str).unwrap_or("");
        let mut cell = truncate(value);
        if row.is_mismatch_cell(column) {
            cell.push('*');
        }
        cells.push(cell);
    }
    cells
}

fn truncate(value: &str) -> String {
    if value.chars().count() <= MAX_CELL_WIDTH {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(MAX_CELL_WIDTH - 1).collect();
    cut.push('…');
    cut
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format any serializable data as JSON
    pub fn format<T: serde::Serialize + ?Sized>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    /// Receipt of a run plus its first page
    pub fn format_run(receipt: &RunReceipt, page: &Page) -> Result<String> {
        let json = serde_json::json!({
            "handle": receipt.handle,
            "summary": receipt.summary,
            "page": page,
        });
        Ok(serde_json::to_string_pretty(&json)?)
    }
}

/// Format bytes in human-readable format
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
