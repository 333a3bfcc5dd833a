//! Record runner.
//!
//! A [`Plan`] is a validated configuration with its lookup tables loaded and
//! its pipelines compiled. Running it builds one [`Definition`] per input
//! record, wired to a fresh output record, and applies it.

use serde_json::Value;
use std::path::Path;
use std::rc::Rc;

use super::config::{InputSpec, MappingConfig, OutputSpec, SourceSpec, TargetSpec};
use super::operations::compile_pipeline;
use crate::document::Document;
use crate::error::{ConfigError, ConfigResult, DataResult, MappingError, MappingResult, RunError, RunResult};
use crate::lookup::{lookup_int, LookupTable, LookupTables};
use crate::mapping::{
    display, join_non_empty, ColumnSource, ColumnTarget, Computed, Definition, FieldRef, Header, Mapping,
    PathSource, PathTarget, Pipeline, Record, Source, Target,
};
use crate::parser::{decode_content, detect_encoding, read_csv_bytes_auto, read_json_records, write_csv, CsvInput};

/// Records to run a plan over
#[derive(Debug, Clone)]
pub enum Input {
    Csv(CsvInput),
    Json(Vec<Value>),
}

impl Input {
    pub fn len(&self) -> usize {
        match self {
            Input::Csv(csv) => csv.rows.len(),
            Input::Json(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Records produced by a run, one per input record
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Csv { header: Vec<String>, rows: Vec<Vec<String>> },
    Json(Vec<Value>),
}

impl Output {
    pub fn len(&self) -> usize {
        match self {
            Output::Csv { rows, .. } => rows.len(),
            Output::Json(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render as delimited text or a pretty JSON array.
    pub fn render(&self, delimiter: char) -> DataResult<String> {
        match self {
            Output::Csv { header, rows } => write_csv(header, rows, delimiter),
            Output::Json(records) => Ok(serde_json::to_string_pretty(records)?),
        }
    }
}

/// Where one input record is read from
enum RowInput {
    Record(Record, Option<Header>),
    Document(Document),
}

/// Where one output record is written to
enum RowOutput {
    Record(Record, Header),
    Document(Document),
}

/// A compiled mapping configuration
#[derive(Debug)]
pub struct Plan {
    config: MappingConfig,
    tables: Rc<LookupTables>,
    pipelines: Vec<Pipeline>,
}

impl Plan {
    /// Validate `config`, load its lookup tables relative to `base_dir` and
    /// compile every pipeline.
    pub fn compile(config: MappingConfig, base_dir: &Path) -> ConfigResult<Self> {
        config.validate()?;

        let mut tables = LookupTables::new();
        for (id, path) in &config.tables {
            let path = base_dir.join(path);
            let table = LookupTable::from_path(&path)?;
            tracing::debug!(table = %id, path = %path.display(), rows = table.len(), "loaded lookup table");
            tables.insert(id.clone(), table);
        }

        let pipelines = config
            .mappings
            .iter()
            .map(|mapping| compile_pipeline(&mapping.transforms))
            .collect::<ConfigResult<Vec<Pipeline>>>()?;

        tracing::debug!(mappings = pipelines.len(), tables = config.tables.len(), "compiled plan");

        Ok(Self {
            config,
            tables: Rc::new(tables),
            pipelines,
        })
    }

    /// Load and compile a configuration file. Lookup tables are resolved
    /// relative to the file's directory.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let config = MappingConfig::from_path(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::compile(config, base_dir)
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// Delimiter of CSV output (`,` for JSON output).
    pub fn output_delimiter(&self) -> char {
        match &self.config.output {
            OutputSpec::Csv { delimiter, .. } => *delimiter,
            OutputSpec::Json => ',',
        }
    }

    /// Read raw input bytes in the configured input format.
    pub fn read_input(&self, bytes: &[u8]) -> DataResult<Input> {
        match &self.config.input {
            InputSpec::Csv { delimiter, has_header } => {
                Ok(Input::Csv(read_csv_bytes_auto(bytes, *delimiter, *has_header)?))
            }
            InputSpec::Json { records } => {
                let content = decode_content(bytes, &detect_encoding(bytes));
                Ok(Input::Json(read_json_records(&content, records.as_deref())?))
            }
        }
    }

    /// Read and run raw input bytes.
    pub fn run_bytes(&self, bytes: &[u8]) -> RunResult<Output> {
        let input = self.read_input(bytes)?;
        self.run(&input)
    }

    /// Map every input record.
    ///
    /// The first failing record aborts the run with its 1-based row number.
    pub fn run(&self, input: &Input) -> RunResult<Output> {
        let mut output = match &self.config.output {
            OutputSpec::Csv { header, .. } => Output::Csv {
                header: header.clone(),
                rows: Vec::with_capacity(input.len()),
            },
            OutputSpec::Json => Output::Json(Vec::with_capacity(input.len())),
        };
        let output_header = match &self.config.output {
            OutputSpec::Csv { header, .. } => Header::from(header.clone()),
            OutputSpec::Json => Header::default(),
        };

        match (input, &self.config.input) {
            (Input::Csv(csv), InputSpec::Csv { .. }) => {
                let header = (!csv.header.is_empty()).then(|| Header::from(csv.header.clone()));
                for (index, cells) in csv.rows.iter().enumerate() {
                    let row = RowInput::Record(Record::from(cells.clone()), header.clone());
                    self.run_row(index + 1, row, &output_header, &mut output)?;
                }
            }
            (Input::Json(records), InputSpec::Json { .. }) => {
                for (index, record) in records.iter().enumerate() {
                    let row = RowInput::Document(Document::new(record.clone()));
                    self.run_row(index + 1, row, &output_header, &mut output)?;
                }
            }
            _ => {
                return Err(ConfigError::Invalid("input does not match the configured input format".to_string()).into())
            }
        }

        tracing::debug!(records = output.len(), "run complete");
        Ok(output)
    }

    fn run_row(&self, row: usize, input: RowInput, output_header: &Header, output: &mut Output) -> RunResult<()> {
        let sink = match output {
            Output::Csv { header, .. } => RowOutput::Record(Record::blank(header.len()), output_header.clone()),
            Output::Json(_) => RowOutput::Document(Document::object()),
        };

        self.definition(&input, &sink)
            .and_then(|definition| definition.apply())
            .map_err(|source| RunError::Row { row, source })?;
        tracing::trace!(row, "row mapped");

        match (sink, output) {
            (RowOutput::Record(record, _), Output::Csv { rows, .. }) => rows.push(record.to_vec()),
            (RowOutput::Document(document), Output::Json(records)) => records.push(document.to_value()),
            _ => {}
        }
        Ok(())
    }

    fn definition(&self, input: &RowInput, output: &RowOutput) -> MappingResult<Definition> {
        self.config
            .mappings
            .iter()
            .zip(&self.pipelines)
            .map(|(spec, pipeline)| -> MappingResult<Mapping> {
                Ok(Mapping::boxed(
                    self.source(&spec.source, input)?,
                    pipeline.clone(),
                    target(&spec.target, output)?,
                ))
            })
            .collect()
    }

    fn source(&self, spec: &SourceSpec, input: &RowInput) -> MappingResult<Box<dyn Source>> {
        match spec {
            SourceSpec::Column { position, name } => match input {
                RowInput::Record(record, header) => Ok(Box::new(ColumnSource::new(
                    record.clone(),
                    field_ref(*position, name, header.as_ref()),
                ))),
                RowInput::Document(_) => Err(MappingError::custom("column source needs a delimited input record")),
            },
            SourceSpec::Path { path, default } => match input {
                RowInput::Document(document) => {
                    let source = PathSource::new(document.clone(), path.clone());
                    Ok(Box::new(match default {
                        Some(default) => source.or_default(default.clone()),
                        None => source,
                    }))
                }
                RowInput::Record(..) => Err(MappingError::custom("path source needs a json input record")),
            },
            SourceSpec::Constant { value } => Ok(Box::new(Computed::constant(value.clone()))),
            SourceSpec::Concat {
                sources,
                separator,
                required,
            } => {
                let parts = sources
                    .iter()
                    .map(|source| self.source(source, input))
                    .collect::<MappingResult<Vec<Box<dyn Source>>>>()?;
                let separator = separator.clone();
                let required = *required;

                Ok(Box::new(Computed::formula(move || {
                    let texts = parts
                        .iter()
                        .map(|part| part.value().map(|value| display(&value).trim().to_string()))
                        .collect::<MappingResult<Vec<String>>>()?;
                    let joined = join_non_empty(&texts, &separator);
                    if required && joined.is_empty() {
                        return Err(MappingError::custom(format!(
                            "all {} concatenated values are empty",
                            texts.len()
                        )));
                    }
                    Ok(Value::String(joined))
                })))
            }
            SourceSpec::Lookup { table, key, column } => Ok(Box::new(lookup_int(
                self.tables.clone(),
                table.clone(),
                self.source(key, input)?,
                *column,
            ))),
        }
    }
}

fn target(spec: &TargetSpec, output: &RowOutput) -> MappingResult<Box<dyn Target>> {
    match (spec, output) {
        (TargetSpec::Column { position, name }, RowOutput::Record(record, header)) => Ok(Box::new(
            ColumnTarget::new(record.clone(), field_ref(*position, name, Some(header))),
        )),
        (TargetSpec::Path { path }, RowOutput::Document(document)) => {
            Ok(Box::new(PathTarget::new(document.clone(), path.clone())))
        }
        (TargetSpec::Column { .. }, _) => Err(MappingError::custom("column target needs a delimited output record")),
        (TargetSpec::Path { .. }, _) => Err(MappingError::custom("path target needs a json output record")),
    }
}

fn field_ref(position: Option<usize>, name: &Option<String>, header: Option<&Header>) -> FieldRef {
    FieldRef {
        position: position.unwrap_or(0),
        name: name.clone(),
        header: header.cloned(),
    }
}
