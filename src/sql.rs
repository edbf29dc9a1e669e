//! SQL query files: connection comment, setup statements and the read-only guard

use crate::error::{ReconError, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Statements a reconciliation query may never contain
pub const FORBIDDEN_KEYWORDS: [&str; 11] = [
    "DROP", "DELETE", "UPDATE", "INSERT", "TRUNCATE", "ALTER", "GRANT", "REVOKE", "EXEC",
    "CREATE", "MERGE",
];

/// Commands rejected when they open a statement
///
/// These double as ordinary column names (`load`, `copy`), so they only count
/// in leading position.
pub const FORBIDDEN_COMMANDS: [&str; 8] = [
    "COPY", "EXPORT", "IMPORT", "INSTALL", "LOAD", "ATTACH", "DETACH", "CHECKPOINT",
];

/// Parsed SQL file
#[derive(Debug, Clone)]
pub struct SqlFile {
    /// `ATTACH ...` statement from a leading comment, empty when absent
    pub connection_string: String,
    /// Statements run before the query, e.g. `USE mydb`
    pub setup: Vec<String>,
    pub query: String,
    pub source_path: PathBuf,
}

/// Parse a SQL file into connection, setup statements and query
///
/// The last statement starting with `SELECT` or `WITH` is the query.
pub fn parse_sql_file(file_path: &Path) -> Result<SqlFile> {
    let content = fs::read_to_string(file_path).map_err(|e| {
        ReconError::invalid_input(format!(
            "Failed to read SQL file '{}': {}",
            file_path.display(),
            e
        ))
    })?;

    let mut sql = parse_sql(&content).map_err(|e| match e {
        ReconError::InvalidInput { message } => ReconError::invalid_input(format!(
            "{} in file '{}'",
            message,
            file_path.display()
        )),
        other => other,
    })?;
    sql.source_path = file_path.to_path_buf();
    Ok(sql)
}

/// Parse SQL text; see [`parse_sql_file`]
pub fn parse_sql(content: &str) -> Result<SqlFile> {
    let mut connection_string = String::new();
    let mut body = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        let comment = trimmed
            .strip_prefix("--")
            .or_else(|| trimmed.strip_prefix("//"));

        match comment {
            Some(comment) => {
                let comment = comment.trim();
                if comment.to_uppercase().starts_with("ATTACH") {
                    connection_string = comment.trim_end_matches(';').to_string();
                }
            }
            None => body.push(line),
        }
    }

    let mut setup = Vec::new();
    let mut query = None;

    for statement in body.join("\n").split(';') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        let upper = statement.to_uppercase();
        if upper.starts_with("SELECT") || upper.starts_with("WITH") {
            if let Some(previous) = query.replace(statement.to_string()) {
                setup.push(previous);
            }
        } else {
            setup.push(statement.to_string());
        }
    }

    let query = query.ok_or_else(|| ReconError::invalid_input("No SELECT query found"))?;

    for statement in setup.iter().chain(std::iter::once(&query)) {
        ensure_read_only(statement)?;
    }

    Ok(SqlFile {
        connection_string,
        setup,
        query,
        source_path: PathBuf::new(),
    })
}

/// Reject statements that could modify the database
///
/// Keywords match whole words only, so `created_at` or `updated_by` pass.
pub fn ensure_read_only(sql: &str) -> Result<()> {
    let words = |text: &str| {
        text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .filter(|word| !word.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>()
    };

    let keyword = words(sql).into_iter().find(|word| {
        FORBIDDEN_KEYWORDS
            .iter()
            .any(|keyword| word.eq_ignore_ascii_case(keyword))
    });
    let command = sql
        .split(';')
        .filter_map(|statement| words(statement).into_iter().next())
        .find(|word| {
            FORBIDDEN_COMMANDS
                .iter()
                .any(|command| word.eq_ignore_ascii_case(command))
        });

    match keyword.or(command) {
        Some(word) => Err(ReconError::invalid_input(format!(
            "Only read-only queries are allowed; found '{}'",
            word.to_uppercase()
        ))),
        None => Ok(()),
    }
}

/// Force an `ATTACH` statement to open its database read-only
///
/// `READ_ONLY` joins an existing trailing option list or starts a new one.
pub fn read_only_attach(statement: &str) -> Result<String> {
    let statement = statement.trim().trim_end_matches(';').trim_end();

    if !statement
        .get(..6)
        .map(|head| head.eq_ignore_ascii_case("ATTACH"))
        .unwrap_or(false)
    {
        return Err(ReconError::invalid_input(format!(
            "Connection comment must be an ATTACH statement: {}",
            statement
        )));
    }
    if statement.contains(';') {
        return Err(ReconError::invalid_input(
            "Connection comment must hold a single ATTACH statement",
        ));
    }

    let options = statement
        .strip_suffix(')')
        .and_then(|inner| inner.rfind('(').map(|open| (open, &inner[open + 1..])))
        .filter(|(_, list)| !list.contains('\''));

    Ok(match options {
        Some((_, list)) if list.to_uppercase().contains("READ_ONLY") => statement.to_string(),
        Some((open, list)) if list.trim().is_empty() => {
            format!("{}(READ_ONLY)", &statement[..open])
        }
        Some((open, list)) => format!("{}({}, READ_ONLY)", &statement[..open], list.trim()),
        None => format!("{} (READ_ONLY)", statement),
    })
}

/// Substitute `{VAR}` placeholders with environment variables
pub fn substitute_env_vars(connection_string: &str) -> Result<String> {
    let mut result = connection_string.to_string();

    let mut start = 0;
    while let Some(open_pos) = result[start..].find('{') {
        let open_pos = start + open_pos;
        if let Some(close_pos) = result[open_pos..].find('}') {
            let close_pos = open_pos + close_pos;
            let var_name = &result[open_pos + 1..close_pos];

            let var_value = env::var(var_name).map_err(|_| {
                ReconError::config(format!(
                    "Environment variable '{}' not found. Set it in your .env file or environment.",
                    var_name
                ))
            })?;

            result.replace_range(open_pos..=close_pos, &var_value);
            start = open_pos + var_value.len();
        } else {
            start = open_pos + 1;
        }
    }

    Ok(result)
}

/// Load `.env` from the current directory if present
pub fn load_env_file() -> Result<()> {
    if Path::new(".env").exists() {
        dotenv::dotenv()
            .map_err(|e| ReconError::config(format!("Failed to load .env file: {}", e)))?;
    }
    Ok(())
}

pub fn is_sql_file(file_path: &Path) -> bool {
    file_path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("sql"))
        .unwrap_or(false)
}
