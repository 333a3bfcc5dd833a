//! Mapping configuration.
//!
//! A configuration describes a whole transformation: how to read the input,
//! what to produce, optional lookup tables and the ordered list of mappings.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::operations::Operation;
use crate::error::{ConfigError, ConfigResult};

/// A complete mapping configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Version of the configuration format
    #[serde(default = "default_version")]
    pub version: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// How input records are read
    #[serde(default)]
    pub input: InputSpec,

    /// What each input record is mapped into
    pub output: OutputSpec,

    /// Lookup tables: id -> CSV file, relative to the configuration file
    #[serde(default)]
    pub tables: BTreeMap<String, PathBuf>,

    /// Mappings applied to every record, in order
    pub mappings: Vec<MappingSpec>,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_true() -> bool {
    true
}

fn default_separator() -> String {
    " ".to_string()
}

fn default_delimiter() -> char {
    ','
}

/// Input format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum InputSpec {
    /// Delimited records
    Csv {
        /// Auto-detected when absent
        #[serde(default)]
        delimiter: Option<char>,
        #[serde(default = "default_true")]
        has_header: bool,
    },

    /// JSON object or array of objects
    Json {
        /// Path to the record array inside the document
        #[serde(default)]
        records: Option<String>,
    },
}

impl Default for InputSpec {
    fn default() -> Self {
        InputSpec::Csv {
            delimiter: None,
            has_header: true,
        }
    }
}

/// Output format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum OutputSpec {
    /// Delimited records with a fixed header
    Csv {
        header: Vec<String>,
        #[serde(default = "default_delimiter")]
        delimiter: char,
    },

    /// One JSON object per input record
    Json,
}

/// One source -> transforms -> target mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingSpec {
    pub source: SourceSpec,

    /// Ordered list of operations to apply
    #[serde(default)]
    pub transforms: Vec<Operation>,

    pub target: TargetSpec,
}

/// Where a mapping reads its value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceSpec {
    /// Cell of a delimited input record
    Column {
        #[serde(default)]
        position: Option<usize>,
        #[serde(default)]
        name: Option<String>,
    },

    /// Value at a path of a JSON input record
    Path {
        path: String,
        /// Returned when the path does not exist
        #[serde(default)]
        default: Option<Value>,
    },

    /// Constant value
    Constant { value: Value },

    /// Non-empty parts joined with a separator
    Concat {
        sources: Vec<SourceSpec>,
        #[serde(default = "default_separator")]
        separator: String,
        /// Fail the record when every part is empty
        #[serde(default)]
        required: bool,
    },

    /// Integer looked up in a table by key (null when not found)
    Lookup {
        table: String,
        key: Box<SourceSpec>,
        /// 1-based column of the table
        column: usize,
    },
}

/// Where a mapping stores its value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetSpec {
    /// Cell of the delimited output record
    Column {
        #[serde(default)]
        position: Option<usize>,
        #[serde(default)]
        name: Option<String>,
    },

    /// Path of the JSON output record
    Path { path: String },
}

impl MappingConfig {
    /// Create a configuration without mappings or tables
    pub fn new(input: InputSpec, output: OutputSpec) -> Self {
        Self {
            version: default_version(),
            description: String::new(),
            input,
            output,
            tables: BTreeMap::new(),
            mappings: Vec::new(),
        }
    }

    /// Append a mapping
    pub fn with_mapping(mut self, mapping: MappingSpec) -> Self {
        self.mappings.push(mapping);
        self
    }

    /// Register a lookup table file
    pub fn with_table(mut self, id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.tables.insert(id.into(), path.into());
        self
    }

    /// Parse a configuration from JSON string
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a configuration file
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every mapping fits the configured input and output formats.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.mappings.is_empty() {
            return Err(ConfigError::Invalid("no mappings defined".to_string()));
        }

        if let OutputSpec::Csv { header, .. } = &self.output {
            if header.is_empty() {
                return Err(ConfigError::Invalid("csv output requires a non-empty header".to_string()));
            }
        }

        for (index, mapping) in self.mappings.iter().enumerate() {
            let incompatible = |message: String| ConfigError::Incompatible {
                mapping: index + 1,
                message,
            };
            self.check_source(&mapping.source).map_err(incompatible)?;
            self.check_target(&mapping.target).map_err(incompatible)?;
        }

        Ok(())
    }

    fn check_source(&self, source: &SourceSpec) -> Result<(), String> {
        match (source, &self.input) {
            (SourceSpec::Column { .. }, InputSpec::Json { .. }) => {
                Err("column source requires csv input".to_string())
            }
            (
                SourceSpec::Column {
                    position: None | Some(0),
                    name: Some(name),
                },
                InputSpec::Csv { has_header: false, .. },
            ) => {
                Err(format!("column name '{}' requires an input header", name))
            }
            (SourceSpec::Path { path, .. }, InputSpec::Csv { .. }) => {
                Err(format!("path source '{}' requires json input", path))
            }
            (SourceSpec::Concat { sources, .. }, _) => {
                if sources.is_empty() {
                    return Err("concat source needs at least one source".to_string());
                }
                sources.iter().try_for_each(|s| self.check_source(s))
            }
            (SourceSpec::Lookup { table, key, .. }, _) => {
                if !self.tables.contains_key(table) {
                    return Err(format!("unknown lookup table '{}'", table));
                }
                self.check_source(key)
            }
            _ => Ok(()),
        }
    }

    fn check_target(&self, target: &TargetSpec) -> Result<(), String> {
        match (target, &self.output) {
            (TargetSpec::Column { .. }, OutputSpec::Json) => Err("column target requires csv output".to_string()),
            (TargetSpec::Path { path }, OutputSpec::Csv { .. }) => {
                Err(format!("path target '{}' requires json output", path))
            }
            _ => Ok(()),
        }
    }
}

impl MappingSpec {
    pub fn new(source: SourceSpec, target: TargetSpec) -> Self {
        Self {
            source,
            transforms: Vec::new(),
            target,
        }
    }

    /// Add an operation to the chain
    pub fn with_operation(mut self, op: Operation) -> Self {
        self.transforms.push(op);
        self
    }
}

impl SourceSpec {
    pub fn column_at(position: usize) -> Self {
        SourceSpec::Column {
            position: Some(position),
            name: None,
        }
    }

    pub fn column_named(name: &str) -> Self {
        SourceSpec::Column {
            position: None,
            name: Some(name.to_string()),
        }
    }

    pub fn path(path: &str) -> Self {
        SourceSpec::Path {
            path: path.to_string(),
            default: None,
        }
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        SourceSpec::Constant { value: value.into() }
    }
}

impl TargetSpec {
    pub fn column_named(name: &str) -> Self {
        TargetSpec::Column {
            position: None,
            name: Some(name.to_string()),
        }
    }

    pub fn path(path: &str) -> Self {
        TargetSpec::Path { path: path.to_string() }
    }
}

/// Generate an example configuration for documentation
pub fn example_config() -> MappingConfig {
    let output = OutputSpec::Csv {
        header: [
            "Customer DOB",
            "Customer FirstName",
            "Customer FullName",
            "Customer LastName",
            "Customer Title",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        delimiter: ',',
    };

    let mut config = MappingConfig::new(InputSpec::default(), output)
        .with_mapping(
            MappingSpec::new(SourceSpec::column_at(1), TargetSpec::column_named("Customer FirstName"))
                .with_operation(Operation::Trim),
        )
        .with_mapping(
            MappingSpec::new(
                SourceSpec::column_named("last_name"),
                TargetSpec::column_named("Customer LastName"),
            )
            .with_operation(Operation::Trim),
        )
        .with_mapping(MappingSpec::new(
            SourceSpec::column_named("dob"),
            TargetSpec::column_named("Customer DOB"),
        ))
        .with_mapping(
            MappingSpec::new(
                SourceSpec::Concat {
                    sources: vec![SourceSpec::column_named("first_name"), SourceSpec::column_named("last_name")],
                    separator: default_separator(),
                    required: true,
                },
                TargetSpec::column_named("Customer FullName"),
            )
            .with_operation(Operation::Trim),
        );

    config.description = "Customer export: first_name,last_name,dob -> CRM customer columns".to_string();
    config
}
