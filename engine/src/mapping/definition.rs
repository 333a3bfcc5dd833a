//! Mappings and definitions.
//!
//! A [`Mapping`] wires one source through a pipeline into one target. A
//! [`Definition`] applies its mappings in declaration order and stops at
//! the first error. Writes made before the failure are kept.

use std::fmt;

use crate::error::MappingResult;

use super::pipeline::Pipeline;
use super::source::Source;
use super::target::Target;

/// One source → pipeline → target binding.
pub struct Mapping {
    source: Box<dyn Source>,
    transform: Pipeline,
    target: Box<dyn Target>,
}

impl Mapping {
    pub fn new<S, T>(source: S, target: T) -> Self
    where
        S: Source + 'static,
        T: Target + 'static,
    {
        Self::boxed(Box::new(source), Pipeline::new(), Box::new(target))
    }

    pub fn boxed(source: Box<dyn Source>, transform: Pipeline, target: Box<dyn Target>) -> Self {
        Self {
            source,
            transform,
            target,
        }
    }

    /// Replace the pipeline.
    pub fn with_transform(mut self, transform: Pipeline) -> Self {
        self.transform = transform;
        self
    }

    pub fn transform(&self) -> &Pipeline {
        &self.transform
    }

    /// Read, transform and write once.
    pub fn apply(&self) -> MappingResult<()> {
        let value = self.source.value()?;
        let value = self.transform.apply(value)?;
        self.target.set_value(value)
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapping")
            .field("transform", &self.transform)
            .finish_non_exhaustive()
    }
}

/// Ordered mappings applied as a unit.
#[derive(Debug, Default)]
pub struct Definition {
    mappings: Vec<Mapping>,
}

impl Definition {
    pub fn new(mappings: Vec<Mapping>) -> Self {
        Self { mappings }
    }

    /// Append a mapping.
    pub fn mapping(mut self, mapping: Mapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    pub fn push(&mut self, mapping: Mapping) {
        self.mappings.push(mapping);
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Apply every mapping in order, returning the first error unchanged.
    pub fn apply(&self) -> MappingResult<()> {
        for (index, mapping) in self.mappings.iter().enumerate() {
            tracing::trace!(mapping = index, "applying mapping");
            if let Err(err) = mapping.apply() {
                tracing::debug!(mapping = index, error = %err, "mapping failed, aborting definition");
                return Err(err);
            }
        }
        Ok(())
    }
}

impl FromIterator<Mapping> for Definition {
    fn from_iter<I: IntoIterator<Item = Mapping>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::error::MappingError;
    use crate::mapping::pipeline::{stringify, to_upper};
    use crate::mapping::record::{Header, Record};
    use crate::mapping::source::{join_non_empty, ColumnSource, Computed, PathSource, SourceFn};
    use crate::mapping::target::{ColumnTarget, PathTarget, TargetFn};
    use serde_json::{json, Value};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn input_header() -> Header {
        Header::new(["first_name", "last_name", "dob"])
    }

    fn output_header() -> Header {
        Header::new([
            "Customer DOB",
            "Customer FirstName",
            "Customer FullName",
            "Customer LastName",
            "Customer Title",
        ])
    }

    #[test]
    fn test_copy_column_by_position() {
        let input = Record::new(["Tim", "Test", ""]);
        let output = Record::blank(5);

        let definition = Definition::default().mapping(Mapping::new(
            ColumnSource::at(input, 1),
            ColumnTarget::at(output.clone(), 2),
        ));

        definition.apply().unwrap();
        assert_eq!(output.get(1).as_deref(), Some("Tim"));
    }

    #[test]
    fn test_full_name_from_computed_source() {
        let input = Record::new(["Tim", "Test", ""]);
        let output = Record::blank(5);

        let row = input.clone();
        let full_name = Computed::formula(move || {
            let first = row.get(0).unwrap_or_default();
            let last = row.get(1).unwrap_or_default();
            Ok(Value::String(join_non_empty([first, last], " ")))
        });

        let definition = Definition::new(vec![Mapping::new(
            full_name,
            ColumnTarget::named(output.clone(), "Customer FullName", output_header()),
        )]);

        definition.apply().unwrap();
        assert_eq!(output.get(2).as_deref(), Some("Tim Test"));
    }

    #[test]
    fn test_optional_path_falls_back_to_default() {
        let input = Document::new(json!({"user": {"first_name": "Tim"}}));
        let output = Document::object();

        let definition = Definition::default().mapping(Mapping::new(
            PathSource::new(input, "user.title").or_default(json!("")),
            PathTarget::new(output.clone(), "Customer.Title"),
        ));

        definition.apply().unwrap();
        assert_eq!(output.to_value(), json!({"Customer": {"Title": ""}}));
    }

    #[test]
    fn test_non_string_into_column_aborts() {
        let output = Record::blank(2);
        let reached = Rc::new(Cell::new(false));
        let flag = reached.clone();

        let definition = Definition::default()
            .mapping(
                Mapping::new(Computed::constant("12"), ColumnTarget::at(output.clone(), 1))
                    .with_transform(Pipeline::new().then(|v| {
                        let n: i64 = v.as_str().unwrap_or("0").parse().unwrap_or(0);
                        Ok(json!(n))
                    })),
            )
            .mapping(Mapping::new(
                Computed::constant("later"),
                TargetFn(move |_: Value| {
                    flag.set(true);
                    Ok(())
                }),
            ));

        let err = definition.apply().unwrap_err();
        assert!(matches!(
            err,
            MappingError::TypeMismatch { expected: "string", found: "number", .. }
        ));
        assert_eq!(output.to_vec(), vec!["", ""]);
        assert!(!reached.get());
    }

    #[test]
    fn test_short_circuit_on_source_failure() {
        let writes = Rc::new(RefCell::new(Vec::new()));
        let recorder = |name: &'static str| {
            let writes = writes.clone();
            TargetFn(move |_: Value| {
                writes.borrow_mut().push(name);
                Ok(())
            })
        };

        let definition = Definition::new(vec![
            Mapping::new(Computed::constant("one"), recorder("m1")),
            Mapping::new(
                SourceFn(|| -> MappingResult<Value> { Err(MappingError::custom("m2 source failed")) }),
                recorder("m2"),
            ),
            Mapping::new(Computed::constant("three"), recorder("m3")),
        ]);

        let err = definition.apply().unwrap_err();
        assert_eq!(err.to_string(), "m2 source failed");
        // No rollback of m1, m3 never attempted.
        assert_eq!(*writes.borrow(), vec!["m1"]);
    }

    #[test]
    fn test_pipeline_error_aborts_before_target() {
        let written = Rc::new(Cell::new(false));
        let flag = written.clone();

        let definition = Definition::default().mapping(
            Mapping::new(
                Computed::constant(5),
                TargetFn(move |_: Value| {
                    flag.set(true);
                    Ok(())
                }),
            )
            .with_transform(Pipeline::new().then(to_upper)),
        );

        assert!(matches!(
            definition.apply(),
            Err(MappingError::TypeMismatch { .. })
        ));
        assert!(!written.get());
    }

    #[test]
    fn test_empty_definition_succeeds() {
        assert!(Definition::default().apply().is_ok());
        assert!(Definition::default().is_empty());
    }

    #[test]
    fn test_csv_rows_end_to_end() {
        let rows = vec![
            vec!["Tim", "Test", ""],
            vec!["Tina", "Test", "01/01/2000"],
        ];
        let mut output = Vec::new();

        for row in rows {
            let input = Record::new(row);
            let out = Record::blank(output_header().len());

            let full = input.clone();
            let definition: Definition = vec![
                Mapping::new(ColumnSource::at(input.clone(), 1), ColumnTarget::at(out.clone(), 2)),
                Mapping::new(
                    ColumnSource::named(input.clone(), "last_name", input_header()),
                    ColumnTarget::named(out.clone(), "Customer LastName", output_header()),
                ),
                Mapping::new(
                    ColumnSource::named(input.clone(), "dob", input_header()),
                    ColumnTarget::named(out.clone(), "Customer DOB", output_header()),
                ),
                Mapping::new(
                    Computed::formula(move || {
                        let name = join_non_empty(full.to_vec().iter().take(2), " ");
                        if name.is_empty() {
                            return Err(MappingError::custom("missing first_name and last_name"));
                        }
                        Ok(Value::String(name))
                    }),
                    ColumnTarget::named(out.clone(), "Customer FullName", output_header()),
                ),
            ]
            .into_iter()
            .collect();

            definition.apply().unwrap();
            output.push(out.to_vec());
        }

        assert_eq!(
            output,
            vec![
                vec!["", "Tim", "Tim Test", "Test", ""],
                vec!["01/01/2000", "Tina", "Tina Test", "Test", ""],
            ]
        );
    }

    #[test]
    fn test_json_document_end_to_end() {
        let input = Document::from_json(
            r#"{"user": {"first_name": "Tim", "last_name": "Test", "dob": null}}"#,
        )
        .unwrap();
        let output = Document::object();

        let doc = input.clone();
        let definition = Definition::default()
            .mapping(Mapping::new(
                PathSource::new(input.clone(), "user.first_name"),
                PathTarget::new(output.clone(), "Customer.FirstName"),
            ))
            .mapping(Mapping::new(
                PathSource::new(input.clone(), "user.title").or_default(json!("")),
                PathTarget::new(output.clone(), "Customer.Title"),
            ))
            .mapping(
                Mapping::new(
                    PathSource::new(input.clone(), "user.dob"),
                    PathTarget::new(output.clone(), "Customer.DOB"),
                )
                .with_transform(Pipeline::new().then(stringify)),
            )
            .mapping(Mapping::new(
                SourceFn(move || {
                    Ok(Value::String(join_non_empty(
                        [
                            doc.value_or_empty_for_path_string("user.first_name"),
                            doc.value_or_empty_for_path_string("user.last_name"),
                        ],
                        " ",
                    )))
                }),
                PathTarget::new(output.clone(), "Customer.FullName"),
            ));

        definition.apply().unwrap();
        assert_eq!(
            output.to_value(),
            json!({
                "Customer": {
                    "DOB": "",
                    "FirstName": "Tim",
                    "FullName": "Tim Test",
                    "Title": ""
                }
            })
        );
    }
}
