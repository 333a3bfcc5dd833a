//! Error types for the mapping engine and its collaborators.
//!
//! - [`MappingError`] - errors raised while applying a mapping definition
//! - [`PathError`] - tree-document path navigation errors
//! - [`LookupError`] - lookup table errors
//! - [`DataError`] - reading and writing CSV/JSON record data
//! - [`ConfigError`] - invalid declarative mapping configuration
//! - [`RunError`] - top-level errors of the record runner
//!
//! Conversions are provided via `From` so `?` works across layers.

use serde_json::Value;
use thiserror::Error;

/// Boxed error returned by caller-supplied functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Mapping Errors
// =============================================================================

/// Errors raised by sources, pipeline stages and targets.
#[derive(Debug, Error)]
pub enum MappingError {
    /// Neither a position nor a header/name pair identifies the field.
    #[error(
        "either a column position must be specified in the range 1 to {record_len} or a header and column name provided"
    )]
    MissingFieldIdentifier { record_len: usize },

    /// The column name does not appear in the header.
    #[error("column name '{name}' does not exist in header [{}]", .header.join(", "))]
    UnknownFieldName { name: String, header: Vec<String> },

    /// The resolved position lies beyond the end of the record.
    #[error("invalid column {position}, record only contains {record_len} columns")]
    FieldOutOfRange { position: usize, record_len: usize },

    /// A value of the wrong runtime type reached a consumer.
    #[error("invalid type {found} for {context}, expected {expected}")]
    TypeMismatch {
        context: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A tree-document read failed and no error handler recovered it.
    #[error("failed to read '{path}': {source}")]
    SourceReadFailure {
        path: String,
        #[source]
        source: PathError,
    },

    /// A tree-document write failed and no error handler recovered it.
    #[error("failed to set '{path}': {source}")]
    TargetWriteFailure {
        path: String,
        #[source]
        source: PathError,
    },

    /// A lookup table query failed.
    #[error("lookup failed: {0}")]
    Lookup(#[from] LookupError),

    /// Error returned by a caller-supplied function.
    #[error("{0}")]
    Custom(BoxError),
}

impl MappingError {
    /// Wrap an arbitrary error or message.
    pub fn custom(err: impl Into<BoxError>) -> Self {
        MappingError::Custom(err.into())
    }

    /// Build a [`MappingError::TypeMismatch`] for `found`.
    pub fn type_mismatch(context: impl Into<String>, expected: &'static str, found: &Value) -> Self {
        MappingError::TypeMismatch {
            context: context.into(),
            expected,
            found: type_name(found),
        }
    }
}

/// Short name of a value's runtime type, used in error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Path Errors
// =============================================================================

/// Errors navigating or mutating a tree document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Nothing exists at the path.
    #[error("path '{0}' does not exist")]
    NotExist(String),

    /// The path expression itself is malformed.
    #[error("invalid path '{path}': {reason}")]
    Invalid { path: String, reason: String },

    /// A segment tried to descend into a scalar.
    #[error("cannot descend into {found} at '{segment}'")]
    NotAContainer { segment: String, found: &'static str },

    /// An array index is past the end of the array.
    #[error("index {index} out of bounds at '{segment}' (length {len})")]
    IndexOutOfBounds {
        segment: String,
        index: usize,
        len: usize,
    },
}

impl PathError {
    /// Whether this is the distinguished "path does not exist" error.
    pub fn is_not_exist(&self) -> bool {
        matches!(self, PathError::NotExist(_))
    }
}

// =============================================================================
// Lookup Errors
// =============================================================================

/// Errors from lookup tables.
#[derive(Debug, Error)]
pub enum LookupError {
    /// No table is registered under the identifier.
    #[error("'{0}' is not a valid lookup table")]
    UnknownTable(String),

    /// The table has no header row.
    #[error("lookup table is empty")]
    EmptyTable,

    /// The requested column does not exist in the matching row.
    #[error("column {column} out of range, row only contains {len} columns")]
    ColumnOutOfRange { column: usize, len: usize },

    /// The matching cell is not an integer.
    #[error("cannot parse '{value}' as an integer: {source}")]
    InvalidInteger {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// CSV error while loading the table.
    #[error("failed to read lookup table: {0}")]
    Csv(#[from] csv::Error),

    /// IO error while loading the table.
    #[error("failed to read lookup table: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Data Errors
// =============================================================================

/// Errors reading or writing record data.
#[derive(Debug, Error)]
pub enum DataError {
    /// Failed to read or write a file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode the input bytes.
    #[error("failed to decode input: {0}")]
    Encoding(String),

    /// Invalid delimited text.
    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The record array could not be located in a JSON input.
    #[error("records not found: {0}")]
    Records(#[from] PathError),

    /// The JSON input is neither an object nor an array of objects.
    #[error("expected a JSON object or array of objects, found {0}")]
    NotRecords(&'static str),

    /// Delimiters must be a single ASCII character.
    #[error("invalid delimiter '{0}', expected an ASCII character")]
    InvalidDelimiter(char),

    /// Empty input.
    #[error("input is empty")]
    EmptyFile,
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors loading or validating a mapping configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration is not valid JSON for the schema.
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to read the configuration or a referenced file.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// A structural problem with the configuration.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// A mapping does not fit the configured input or output format.
    #[error("mapping {mapping}: {message}")]
    Incompatible { mapping: usize, message: String },

    /// A `replace` operation carries a bad regex.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A referenced lookup table failed to load.
    #[error("lookup table error: {0}")]
    Lookup(#[from] LookupError),
}

// =============================================================================
// Run Errors (top-level)
// =============================================================================

/// Top-level errors of [`crate::transform::Plan::run`] and the CLI.
#[derive(Debug, Error)]
pub enum RunError {
    /// Reading or writing data failed.
    #[error("data error: {0}")]
    Data(#[from] DataError),

    /// The configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Mapping a record failed; earlier records were already produced.
    #[error("failed to apply mappings at row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: MappingError,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for mapping operations.
pub type MappingResult<T> = Result<T, MappingError>;

/// Result type for path operations.
pub type PathResult<T> = Result<T, PathError>;

/// Result type for lookup operations.
pub type LookupResult<T> = Result<T, LookupError>;

/// Result type for data I/O.
pub type DataResult<T> = Result<T, DataError>;

/// Result type for configuration handling.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for runs.
pub type RunResult<T> = Result<T, RunError>;
