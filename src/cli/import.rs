use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;
use tracing::debug;

use crate::error::DbError;
use crate::model::{Record, Value};

/// Error type for the command-line front end.
#[derive(Error, Debug)]
pub enum CliError {
    /// Generic error message.
    #[error("{0}")]
    Message(String),
    /// IO error from file operations.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// CSV parsing error.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// JSON rendering error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Error raised by the store, facade or graph.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<&str> for CliError {
    fn from(value: &str) -> Self {
        CliError::Message(value.to_string())
    }
}

impl From<String> for CliError {
    fn from(value: String) -> Self {
        CliError::Message(value)
    }
}

/// Types one CSV cell. Blank cells and `null` become the `Null` sentinel;
/// integers, floats and booleans are recognized before falling back to text.
pub fn parse_cell(raw: &str) -> Value {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(int_val) = raw.parse::<i64>() {
        return Value::Int(int_val);
    }
    if let Ok(float_val) = raw.parse::<f64>() {
        if float_val.is_finite() {
            return Value::Float(float_val);
        }
    }
    Value::Str(raw.to_string())
}

/// Reads every row of a headed CSV file as a record keyed by column name.
/// Each column in `required` must appear in the header.
pub fn read_records(path: &Path, required: &[&str]) -> Result<Vec<Record>, CliError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    for name in required {
        find_column(&headers, name).map_err(|_| {
            CliError::Message(format!("column '{}' not found in {}", name, path.display()))
        })?;
    }
    let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record: Record = columns
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), row.get(idx).map(parse_cell).unwrap_or(Value::Null)))
            .collect();
        records.push(record);
    }
    debug!(path = %path.display(), rows = records.len(), "csv loaded");
    Ok(records)
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize, CliError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| CliError::Message(format!("column '{}' not found", name)))
}
