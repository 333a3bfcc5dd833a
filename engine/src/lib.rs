//! # mapjitsu - field mapping between CSV records and JSON documents
//!
//! mapjitsu copies values from a source record to a target record, optionally
//! transforming them on the way. Records are either delimited rows (fields
//! addressed by 1-based position or by header name) or JSON documents (fields
//! addressed by dotted path).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Source    │────▶│  Pipeline   │────▶│   Target    │     │ Definition  │
//! │ column/path │     │   stages    │     │ column/path │     │ (ordered)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mapjitsu::{Plan, MappingConfig};
//! use std::path::Path;
//!
//! let plan = Plan::compile(MappingConfig::from_path("mapping.json")?, Path::new("."))?;
//! let output = plan.run_bytes(&std::fs::read("customers.csv")?)?;
//! println!("{}", output.render(plan.output_delimiter())?);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per layer
//! - [`mapping`] - Sources, targets, pipelines and definitions
//! - [`document`] - JSON documents addressed by path
//! - [`lookup`] - CSV lookup tables
//! - [`parser`] - CSV/JSON reading with auto-detection
//! - [`transform`] - Declarative configuration and the record runner
//! - [`logging`] - `tracing` subscriber setup for the CLI

// Core modules
pub mod error;
pub mod mapping;

// Collaborators
pub mod document;
pub mod lookup;
pub mod parser;

// Declarative transformation
pub mod transform;

pub mod logging;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, DataError, LookupError, MappingError, MappingResult, PathError, RunError, RunResult,
};

// =============================================================================
// Re-exports - Mapping engine
// =============================================================================

pub use mapping::{
    ColumnSource, ColumnTarget, Computed, Definition, FieldRef, Header, Mapping, PathSource, PathTarget,
    Pipeline, Record, Source, Target,
};

// =============================================================================
// Re-exports - Documents and lookups
// =============================================================================

pub use document::Document;
pub use lookup::{LookupTable, LookupTables};

// =============================================================================
// Re-exports - CSV/JSON I/O
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, read_csv, read_csv_bytes_auto, read_csv_file_auto,
    read_json_records, write_csv, CsvInput,
};

// =============================================================================
// Re-exports - Declarative transformation
// =============================================================================

pub use transform::{
    example_config, operations_description, Input, MappingConfig, Operation, Output, Plan,
};
