//! Declarative transformations.
//!
//! This module drives the mapping engine from configuration:
//! - `config`: JSON mapping configuration and its validation
//! - `operations`: transform operations compiled into pipeline stages
//! - `executor`: compiled plans run over CSV or JSON records

pub mod config;
pub mod executor;
pub mod operations;

pub use config::{example_config, InputSpec, MappingConfig, MappingSpec, OutputSpec, SourceSpec, TargetSpec};
pub use executor::{Input, Output, Plan};
pub use operations::{compile_pipeline, operations_description, Operation};
