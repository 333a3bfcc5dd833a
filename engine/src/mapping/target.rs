//! Value targets.
//!
//! A target stores the final pipeline value somewhere; storing is its only
//! side effect and repeating it with the same value is harmless.

use serde_json::Value;
use std::fmt;

use crate::document::Document;
use crate::error::{MappingError, MappingResult, PathError};

use super::field::FieldRef;
use super::record::{Header, Record};

/// Consumes and stores one value.
pub trait Target {
    fn set_value(&self, value: Value) -> MappingResult<()>;
}

impl<T: Target + ?Sized> Target for Box<T> {
    fn set_value(&self, value: Value) -> MappingResult<()> {
        (**self).set_value(value)
    }
}

/// Error handler for path writes: `(path, value, error)`. `Ok(())`
/// suppresses the failure.
pub type WriteErrorHandler = Box<dyn Fn(&str, &Value, PathError) -> MappingResult<()>>;

// =============================================================================
// Column target
// =============================================================================

/// Overwrites one cell of a delimited record. Only strings are accepted.
#[derive(Debug, Clone)]
pub struct ColumnTarget {
    pub record: Record,
    pub field: FieldRef,
}

impl ColumnTarget {
    pub fn new(record: Record, field: FieldRef) -> Self {
        Self { record, field }
    }

    /// Write the cell at a 1-based position.
    pub fn at(record: Record, position: usize) -> Self {
        Self::new(record, FieldRef::at(position))
    }

    /// Write the cell named `name` in `header`.
    pub fn named(record: Record, name: impl Into<String>, header: Header) -> Self {
        Self::new(record, FieldRef::named(name, header))
    }
}

impl Target for ColumnTarget {
    fn set_value(&self, value: Value) -> MappingResult<()> {
        let record_len = self.record.len();
        let index = self.field.resolve_index(record_len)?;

        let text = match value {
            Value::String(text) => text,
            other => {
                return Err(MappingError::type_mismatch(
                    self.field.describe(),
                    "string",
                    &other,
                ))
            }
        };

        self.record
            .set(index, text)
            .map(|_| ())
            .ok_or(MappingError::FieldOutOfRange {
                position: index + 1,
                record_len,
            })
    }
}

// =============================================================================
// Path target
// =============================================================================

/// Stores a value at a path of a tree document.
pub struct PathTarget {
    pub document: Document,
    pub path: String,
    pub on_error: Option<WriteErrorHandler>,
}

impl PathTarget {
    pub fn new(document: Document, path: impl Into<String>) -> Self {
        Self {
            document,
            path: path.into(),
            on_error: None,
        }
    }

    /// Install an error handler.
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, &Value, PathError) -> MappingResult<()> + 'static,
    {
        self.on_error = Some(Box::new(handler));
        self
    }
}

impl Target for PathTarget {
    fn set_value(&self, value: Value) -> MappingResult<()> {
        let Some(handler) = &self.on_error else {
            return self
                .document
                .set_value_for_path(value, &self.path)
                .map_err(|source| MappingError::TargetWriteFailure {
                    path: self.path.clone(),
                    source,
                });
        };

        // The handler needs the value after a failed write.
        match self.document.set_value_for_path(value.clone(), &self.path) {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::debug!(path = %self.path, error = %err, "path write failed, calling handler");
                handler(&self.path, &value, err)
            }
        }
    }
}

impl fmt::Debug for PathTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathTarget")
            .field("path", &self.path)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

// =============================================================================
// Callable adapter
// =============================================================================

/// Adapts any `Fn(Value) -> MappingResult<()>` into a [`Target`].
pub struct TargetFn<F>(pub F);

impl<F> Target for TargetFn<F>
where
    F: Fn(Value) -> MappingResult<()>,
{
    fn set_value(&self, value: Value) -> MappingResult<()> {
        (self.0)(value)
    }
}
