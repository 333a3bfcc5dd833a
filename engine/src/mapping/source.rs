//! Value sources.
//!
//! Every source produces a single value on demand through [`Source::value`].

use serde_json::Value;
use std::fmt;

use crate::document::Document;
use crate::error::{MappingError, MappingResult, PathError};

use super::field::FieldRef;
use super::record::{Header, Record};

/// Produces one value.
pub trait Source {
    fn value(&self) -> MappingResult<Value>;
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn value(&self) -> MappingResult<Value> {
        (**self).value()
    }
}

/// Error handler for path reads: `(path, raw value, error)`.
pub type ReadErrorHandler = Box<dyn Fn(&str, Value, PathError) -> MappingResult<Value>>;

/// Handler that substitutes `default` for paths that do not exist and
/// reports every other error as a read failure.
pub fn on_not_exist_return_default(default: Value) -> ReadErrorHandler {
    Box::new(move |path: &str, _raw: Value, err: PathError| {
        if err.is_not_exist() {
            Ok(default.clone())
        } else {
            Err(MappingError::SourceReadFailure {
                path: path.to_string(),
                source: err,
            })
        }
    })
}

// =============================================================================
// Column source
// =============================================================================

/// Reads one cell of a delimited record.
#[derive(Debug, Clone)]
pub struct ColumnSource {
    pub record: Record,
    pub field: FieldRef,
}

impl ColumnSource {
    pub fn new(record: Record, field: FieldRef) -> Self {
        Self { record, field }
    }

    /// Read the cell at a 1-based position.
    pub fn at(record: Record, position: usize) -> Self {
        Self::new(record, FieldRef::at(position))
    }

    /// Read the cell named `name` in `header`.
    pub fn named(record: Record, name: impl Into<String>, header: Header) -> Self {
        Self::new(record, FieldRef::named(name, header))
    }
}

impl Source for ColumnSource {
    fn value(&self) -> MappingResult<Value> {
        let record_len = self.record.len();
        let index = self.field.resolve_index(record_len)?;
        self.record
            .get(index)
            .map(Value::String)
            .ok_or(MappingError::FieldOutOfRange {
                position: index + 1,
                record_len,
            })
    }
}

// =============================================================================
// Path source
// =============================================================================

/// Reads the value at a path of a tree document.
pub struct PathSource {
    pub document: Document,
    pub path: String,
    pub on_error: Option<ReadErrorHandler>,
}

impl PathSource {
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
        F: Fn(&str, Value, PathError) -> MappingResult<Value> + 'static,
    {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Return `default` when the path does not exist.
    pub fn or_default(mut self, default: Value) -> Self {
        self.on_error = Some(on_not_exist_return_default(default));
        self
    }
}

impl Source for PathSource {
    fn value(&self) -> MappingResult<Value> {
        match self.document.value_for_path(&self.path) {
            Ok(value) => Ok(value),
            Err(err) => match &self.on_error {
                Some(handler) => {
                    tracing::debug!(path = %self.path, error = %err, "path read failed, calling handler");
                    handler(&self.path, Value::Null, err)
                }
                None => Err(MappingError::SourceReadFailure {
                    path: self.path.clone(),
                    source: err,
                }),
            },
        }
    }
}

impl fmt::Debug for PathSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathSource")
            .field("path", &self.path)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

// =============================================================================
// Computed source
// =============================================================================

/// A value computed by a formula or fixed up front.
pub enum Computed {
    /// Invoked once per read.
    Formula(Box<dyn Fn() -> MappingResult<Value>>),
    /// Returned as is, nothing is invoked.
    Constant(Value),
}

impl Computed {
    pub fn formula<F>(formula: F) -> Self
    where
        F: Fn() -> MappingResult<Value> + 'static,
    {
        Computed::Formula(Box::new(formula))
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        Computed::Constant(value.into())
    }
}

impl Source for Computed {
    fn value(&self) -> MappingResult<Value> {
        match self {
            Computed::Formula(formula) => formula(),
            Computed::Constant(value) => Ok(value.clone()),
        }
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Computed::Formula(_) => f.write_str("Computed::Formula(..)"),
            Computed::Constant(value) => f.debug_tuple("Computed::Constant").field(value).finish(),
        }
    }
}

/// Join the non-empty parts with `separator`.
pub fn join_non_empty<I, S>(parts: I, separator: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for part in parts {
        let part = part.as_ref();
        if part.is_empty() {
            continue;
        }
        if !joined.is_empty() {
            joined.push_str(separator);
        }
        joined.push_str(part);
    }
    joined
}

// =============================================================================
// Callable adapter
// =============================================================================

/// Adapts any `Fn() -> MappingResult<Value>` into a [`Source`].
pub struct SourceFn<F>(pub F);

impl<F> Source for SourceFn<F>
where
    F: Fn() -> MappingResult<Value>,
{
    fn value(&self) -> MappingResult<Value> {
        (self.0)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_column_source_by_position_and_name() {
        let record = Record::new(["Tim", "Test", ""]);
        let header = Header::new(["first_name", "last_name", "dob"]);

        assert_eq!(ColumnSource::at(record.clone(), 1).value().unwrap(), "Tim");
        assert_eq!(
            ColumnSource::named(record.clone(), "last_name", header.clone())
                .value()
                .unwrap(),
            "Test"
        );
        assert_eq!(ColumnSource::named(record, "dob", header).value().unwrap(), "");
    }

    #[test]
    fn test_column_source_sees_in_place_updates() {
        let record = Record::new(["Tim"]);
        let source = ColumnSource::at(record.clone(), 1);

        record.replace(vec!["Tina".into()]);
        assert_eq!(source.value().unwrap(), "Tina");
    }

    #[test]
    fn test_column_source_errors() {
        let record = Record::new(["Tim", "Test"]);

        assert!(matches!(
            ColumnSource::at(record.clone(), 3).value(),
            Err(MappingError::FieldOutOfRange { position: 3, record_len: 2 })
        ));
        assert!(matches!(
            ColumnSource::new(record.clone(), FieldRef::default()).value(),
            Err(MappingError::MissingFieldIdentifier { record_len: 2 })
        ));
        assert!(matches!(
            ColumnSource::named(record, "email", Header::new(["a", "b"])).value(),
            Err(MappingError::UnknownFieldName { .. })
        ));
    }

    #[test]
    fn test_column_source_name_past_ragged_row() {
        let header = Header::new(["first_name", "last_name", "dob"]);
        let short = Record::new(["Tim", "Test"]);

        assert!(matches!(
            ColumnSource::named(short.clone(), "dob", header.clone()).value(),
            Err(MappingError::FieldOutOfRange { position: 3, record_len: 2 })
        ));
        assert_eq!(ColumnSource::named(short, "last_name", header).value().unwrap(), "Test");
    }

    #[test]
    fn test_path_source() {
        let doc = Document::new(json!({"user": {"first_name": "Tim", "dob": null}}));

        assert_eq!(PathSource::new(doc.clone(), "user.first_name").value().unwrap(), "Tim");
        assert_eq!(PathSource::new(doc.clone(), "user.dob").value().unwrap(), Value::Null);

        let err = PathSource::new(doc, "user.title").value().unwrap_err();
        match err {
            MappingError::SourceReadFailure { path, source } => {
                assert_eq!(path, "user.title");
                assert!(source.is_not_exist());
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_path_source_default_for_missing() {
        let doc = Document::new(json!({"user": {}}));
        let source = PathSource::new(doc, "user.title").or_default(json!(""));
        assert_eq!(source.value().unwrap(), "");
    }

    #[test]
    fn test_default_handler_passes_other_errors_through() {
        let doc = Document::new(json!({"user": {}}));
        let source = PathSource::new(doc, "user..title").or_default(json!(""));
        assert!(matches!(
            source.value(),
            Err(MappingError::SourceReadFailure { source: PathError::Invalid { .. }, .. })
        ));
    }

    #[test]
    fn test_path_source_handler_receives_context() {
        let doc = Document::new(json!({}));
        let source = PathSource::new(doc, "a.b").with_handler(|path, raw, err| {
            assert_eq!(raw, Value::Null);
            assert!(err.is_not_exist());
            Ok(json!(format!("missing {}", path)))
        });
        assert_eq!(source.value().unwrap(), "missing a.b");
    }

    #[test]
    fn test_formula_runs_once_per_read_and_constant_never_runs() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let formula = Computed::formula(move || {
            counter.set(counter.get() + 1);
            Ok(json!("Tim Test"))
        });

        assert_eq!(calls.get(), 0);
        assert_eq!(formula.value().unwrap(), "Tim Test");
        assert_eq!(calls.get(), 1);

        let constant = Computed::constant("fixed");
        assert_eq!(constant.value().unwrap(), "fixed");
    }

    #[test]
    fn test_formula_errors_surface() {
        let formula = Computed::formula(|| Err(MappingError::custom("no name")));
        assert_eq!(formula.value().unwrap_err().to_string(), "no name");
    }

    #[test]
    fn test_source_fn_adapter() {
        let source = SourceFn(|| -> MappingResult<Value> { Ok(json!(3)) });
        assert_eq!(source.value().unwrap(), json!(3));

        let boxed: Box<dyn Source> = Box::new(source);
        assert_eq!(boxed.value().unwrap(), json!(3));
    }

    #[test]
    fn test_join_non_empty() {
        assert_eq!(join_non_empty(["Tim", "Test"], " "), "Tim Test");
        assert_eq!(join_non_empty(["", "Test"], " "), "Test");
        assert_eq!(join_non_empty(["Tim", ""], " "), "Tim");
        assert_eq!(join_non_empty(["", ""], " "), "");
    }
}
