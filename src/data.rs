//! Dataset loading through DuckDB

use crate::dataset::{Dataset, Row};
use crate::error::{ReconError, Result};
use crate::sql::{self, SqlFile};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveTime};
use duckdb::types::{TimeUnit, ValueRef};
use duckdb::Connection;
use std::path::{Path, PathBuf};

/// Column name and DuckDB type of a loaded view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

/// Information about loaded data
#[derive(Debug, Clone)]
pub struct DataInfo {
    pub source: PathBuf,
    pub row_count: u64,
    pub columns: Vec<ColumnInfo>,
}

impl DataInfo {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Loads one tabular source into an in-memory DuckDB view
pub struct DataProcessor {
    connection: Connection,
}

impl DataProcessor {
    pub fn new() -> Result<Self> {
        let connection = Connection::open_in_memory()?;
        connection.execute("SET enable_progress_bar=false", [])?;
        Ok(Self { connection })
    }

    /// Load a data file or a `.sql` query file
    pub fn load(&self, path: &Path) -> Result<DataInfo> {
        if sql::is_sql_file(path) {
            self.load_sql_file(path)
        } else {
            self.load_file(path)
        }
    }

    /// Load a CSV, TSV, Parquet or JSON file
    pub fn load_file(&self, file_path: &Path) -> Result<DataInfo> {
        if !file_path.exists() {
            return Err(ReconError::invalid_input(format!(
                "File not found: {}",
                file_path.display()
            )));
        }
        if !file_path.is_file() {
            return Err(ReconError::invalid_input(format!(
                "Not a file: {}",
                file_path.display()
            )));
        }

        let path_str = file_path.to_string_lossy().replace('\'', "''");
        let create_view_sql = format!(
            "CREATE OR REPLACE VIEW data_view AS SELECT * FROM '{}'",
            path_str
        );
        self.connection
            .execute(&create_view_sql, [])
            .map_err(|e| self.convert_duckdb_error(e, file_path))?;

        self.describe(file_path)
    }

    /// Load the result of a read-only query file
    pub fn load_sql_file(&self, file_path: &Path) -> Result<DataInfo> {
        sql::load_env_file()?;
        let sql_file = sql::parse_sql_file(file_path)?;
        self.load_query(&sql_file)
    }

    pub fn load_query(&self, sql_file: &SqlFile) -> Result<DataInfo> {
        sql::ensure_read_only(&sql_file.query)?;

        let connection_string = sql::substitute_env_vars(&sql_file.connection_string)?;
        if !connection_string.is_empty() {
            let attach = sql::read_only_attach(&connection_string)?;
            self.connection.execute(&attach, []).map_err(|e| {
                ReconError::data_processing(format!("Failed to attach database: {}", e))
            })?;
        }

        for statement in &sql_file.setup {
            sql::ensure_read_only(statement)?;
            self.connection.execute(statement, []).map_err(|e| {
                ReconError::data_processing(format!(
                    "Failed to run setup statement '{}': {}",
                    statement, e
                ))
            })?;
        }

        let create_view_sql = format!("CREATE OR REPLACE VIEW data_view AS {}", sql_file.query);
        self.connection
            .execute(&create_view_sql, [])
            .map_err(|e| ReconError::data_processing(format!("Query failed: {}", e)))?;

        self.describe(&sql_file.source_path)
    }

    fn describe(&self, source: &Path) -> Result<DataInfo> {
        let row_count: u64 = self
            .connection
            .prepare("SELECT COUNT(*) FROM data_view")?
            .query_row([], |row| row.get(0))
            .map_err(|e| ReconError::data_processing(format!("Failed to get row count: {}", e)))?;

        Ok(DataInfo {
            source: source.to_path_buf(),
            row_count,
            columns: self.get_column_info()?,
        })
    }

    fn convert_duckdb_error(&self, error: duckdb::Error, file_path: &Path) -> ReconError {
        let error_msg = error.to_string();

        if error_msg.contains("CSV Error")
            || error_msg.contains("Could not convert")
            || error_msg.contains("Invalid CSV")
            || error_msg.contains("Unterminated quoted field")
        {
            ReconError::invalid_input(format!(
                "Malformed CSV file '{}': {}",
                file_path.display(),
                error_msg
            ))
        } else if error_msg.contains("JSON") {
            ReconError::invalid_input(format!(
                "Malformed JSON file '{}': {}",
                file_path.display(),
                error_msg
            ))
        } else if error_msg.contains("No files found") || error_msg.contains("does not exist") {
            ReconError::invalid_input(format!("File not found: {}", file_path.display()))
        } else if error_msg.contains("UTF-8") || error_msg.contains("encoding") {
            ReconError::invalid_input(format!(
                "File encoding error '{}': {}",
                file_path.display(),
                error_msg
            ))
        } else {
            ReconError::DuckDb(error)
        }
    }

    fn get_column_info(&self) -> Result<Vec<ColumnInfo>> {
        let mut stmt = self.connection.prepare("DESCRIBE data_view")?;
        let rows = stmt.query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get::<_, String>(0)?,
                data_type: row.get::<_, String>(1)?,
            })
        })?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }
        Ok(columns)
    }

    /// Materialize the loaded view, rows in source order
    pub fn to_dataset(&self) -> Result<Dataset> {
        let columns: Vec<String> = self
            .get_column_info()?
            .into_iter()
            .map(|c| c.name)
            .collect();
        if columns.is_empty() {
            return Dataset::new(columns, Vec::new());
        }

        let mut stmt = self.connection.prepare("SELECT * FROM data_view")?;
        let mut rows = stmt.query([])?;
        let mut data = Vec::new();

        while let Some(row) = rows.next()? {
            let mut record = Row::with_capacity(columns.len());
            for (i, name) in columns.iter().enumerate() {
                record.insert(name.clone(), value_from_ref(row.get_ref(i)?));
            }
            data.push(record);
        }

        log::debug!("Materialized {} rows x {} columns", data.len(), columns.len());
        Dataset::new(columns, data)
    }

    pub fn is_supported_format(file_path: &Path) -> bool {
        match file_path.extension().and_then(|s| s.to_str()) {
            Some(extension) => matches!(
                extension.to_lowercase().as_str(),
                "csv" | "tsv" | "parquet" | "json" | "jsonl" | "sql"
            ),
            None => false,
        }
    }
}

/// Load a file or query file straight into a dataset
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let processor = DataProcessor::new()?;
    let info = processor.load(path)?;
    log::info!(
        "Loaded {} ({} rows, {} columns)",
        path.display(),
        info.row_count,
        info.column_count()
    );
    processor.to_dataset()
}

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

/// Map a DuckDB cell onto the engine's scalar model
fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Boolean(b),
        ValueRef::TinyInt(i) => Value::from(i128::from(i)),
        ValueRef::SmallInt(i) => Value::from(i128::from(i)),
        ValueRef::Int(i) => Value::from(i128::from(i)),
        ValueRef::BigInt(i) => Value::from(i128::from(i)),
        ValueRef::HugeInt(i) => Value::Integer(i),
        ValueRef::UTinyInt(i) => Value::from(i128::from(i)),
        ValueRef::USmallInt(i) => Value::from(i128::from(i)),
        ValueRef::UInt(i) => Value::from(i128::from(i)),
        ValueRef::UBigInt(i) => Value::from(i128::from(i)),
        // through the shortest f32 spelling so 0.1f32 stays 0.1
        ValueRef::Float(f) => Value::Number(f.to_string().parse().unwrap_or(f64::from(f))),
        ValueRef::Double(f) => Value::Number(f),
        ValueRef::Decimal(d) => Value::Decimal(d.to_string()),
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => Value::String(format!("<blob:{} bytes>", b.len())),
        ValueRef::Date32(days) => NaiveDate::from_num_days_from_ce_opt(days + 719_163)
            .map(Value::from)
            .unwrap_or(Value::Null),
        ValueRef::Timestamp(unit, v) => DateTime::from_timestamp_micros(to_micros(unit, v))
            .map(|dt| Value::DateTime(dt.naive_utc()))
            .unwrap_or(Value::Null),
        ValueRef::Time64(unit, v) => {
            let micros = to_micros(unit, v);
            let secs = (micros / 1_000_000) as u32;
            let nanos = ((micros % 1_000_000) * 1_000) as u32;
            NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
                .map(|t| Value::String(t.to_string()))
                .unwrap_or(Value::Null)
        }
        other => Value::String(format!("{:?}", other)),
    }
}
