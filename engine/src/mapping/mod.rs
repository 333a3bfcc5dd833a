//! Mapping engine.
//!
//! This module holds the core of the crate:
//! - `field`: positional/named field references and their resolution
//! - `record`: shared delimited records and headers
//! - `source`: the [`Source`] trait and its accessors
//! - `target`: the [`Target`] trait and its accessors
//! - `pipeline`: transform pipelines and reference stages
//! - `definition`: [`Mapping`] and [`Definition`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use mapjitsu::mapping::*;
//!
//! let input = Record::new(["tim", "Test"]);
//! let output = Record::blank(2);
//!
//! Definition::default()
//!     .mapping(
//!         Mapping::new(ColumnSource::at(input.clone(), 1), ColumnTarget::at(output.clone(), 2))
//!             .with_transform(Pipeline::new().then(to_upper)),
//!     )
//!     .apply()?;
//!
//! assert_eq!(output.to_vec(), vec!["", "TIM"]);
//! ```

pub mod definition;
pub mod field;
pub mod pipeline;
pub mod record;
pub mod source;
pub mod target;

pub use definition::{Definition, Mapping};
pub use field::FieldRef;
pub use pipeline::{display, stringify, to_lower, to_upper, Pipeline, Stage};
pub use record::{Header, Record};
pub use source::{
    join_non_empty, on_not_exist_return_default, ColumnSource, Computed, PathSource, ReadErrorHandler, Source,
    SourceFn,
};
pub use target::{ColumnTarget, PathTarget, Target, TargetFn, WriteErrorHandler};
