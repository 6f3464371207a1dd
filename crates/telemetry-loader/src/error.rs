//! Loader Error Types

use thiserror::Error;

/// Errors that abort loading of a telemetry source
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Source file or directory does not exist
    #[error("Telemetry source not found: {0}")]
    SourceNotFound(String),

    /// Vehicle/lap filter matched no rows
    #[error("No telemetry for vehicle {vehicle_id} lap {lap} in {source_name}")]
    NoMatchingData {
        vehicle_id: String,
        lap: i64,
        source_name: String,
    },

    /// Header row is present but lacks a required column
    #[error("Header of {source_name} has no '{column}' column")]
    MissingColumn {
        column: &'static str,
        source_name: String,
    },

    /// Underlying read failure
    #[error("I/O error on {source_name}: {message}")]
    Io {
        source_name: String,
        message: String,
    },
}

/// A single unusable row. Recovered by skipping, never returned as an `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRow {
    /// Row is too short to hold the columns we need
    #[error("line {line}: expected at least {expected} fields, found {found}")]
    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// A field could not be parsed
    #[error("line {line}: unparseable {field} {value:?}")]
    BadField {
        line: u64,
        field: &'static str,
        value: String,
    },

    /// The CSV layer rejected the row (bad quoting, invalid UTF-8)
    #[error("line {line}: {message}")]
    Unreadable { line: u64, message: String },
}

impl MalformedRow {
    /// Line number the row started on
    pub fn line(&self) -> u64 {
        match self {
            MalformedRow::FieldCount { line, .. }
            | MalformedRow::BadField { line, .. }
            | MalformedRow::Unreadable { line, .. } => *line,
        }
    }
}
