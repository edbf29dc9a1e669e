//! In-memory tabular datasets

use crate::error::{ReconError, Result};
use crate::value::Value;
use indexmap::IndexMap;

/// One row: column name to cell value
pub type Row = IndexMap<String, Value>;

/// Ordered rows with a fixed ordered list of column names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    /// Build a dataset from already keyed rows
    ///
    /// Rows may omit columns (read as null) but may not introduce columns
    /// that are not declared.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        check_unique_columns(&columns)?;
        for (idx, row) in rows.iter().enumerate() {
            if let Some(extra) = row.keys().find(|k| !columns.contains(k)) {
                return Err(ReconError::invalid_input(format!(
                    "Row {} has undeclared column '{}'",
                    idx, extra
                )));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build a dataset from positional records
    pub fn from_records<C, R>(columns: &[C], records: Vec<R>) -> Result<Self>
    where
        C: AsRef<str>,
        R: IntoIterator<Item = Value>,
    {
        let columns: Vec<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();
        check_unique_columns(&columns)?;

        let mut rows = Vec::with_capacity(records.len());
        for (idx, record) in records.into_iter().enumerate() {
            let values: Vec<Value> = record.into_iter().collect();
            if values.len() != columns.len() {
                return Err(ReconError::invalid_input(format!(
                    "Row {} has {} values but {} columns are declared",
                    idx,
                    values.len(),
                    columns.len()
                )));
            }
            rows.push(columns.iter().cloned().zip(values).collect());
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Cell value, null when the row does not carry the column
    pub fn value(&self, row: usize, column: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&NULL)
    }
}

fn check_unique_columns(columns: &[String]) -> Result<()> {
    for (i, col) in columns.iter().enumerate() {
        if columns[..i].contains(col) {
            return Err(ReconError::invalid_input(format!(
                "Duplicate column name '{}'",
                col
            )));
        }
    }
    Ok(())
}
