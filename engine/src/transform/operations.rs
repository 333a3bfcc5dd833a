//! Declarative transform operations.
//!
//! Each [`Operation`] compiles into a pipeline [`Stage`]. Operations that
//! work on text only accept strings and fail with a type mismatch on
//! anything else; put a `to_string` in front to convert first.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{ConfigError, ConfigResult, MappingError, MappingResult};
use crate::mapping::pipeline::{self, Pipeline, Stage};

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("valid year pattern"));

/// All available transformation operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Convert any value to its display string (null becomes "")
    #[serde(alias = "stringify")]
    ToString,

    /// Convert to uppercase
    Uppercase,

    /// Convert to lowercase
    Lowercase,

    /// Remove leading and trailing whitespace
    Trim,

    /// Replace using regex pattern
    Replace {
        pattern: String,
        #[serde(default)]
        value: String,
    },

    /// Pad string at start to reach target length
    PadStart {
        length: usize,
        #[serde(default = "default_pad_char")]
        char: String,
    },

    /// Pad string at end to reach target length
    PadEnd {
        length: usize,
        #[serde(default = "default_pad_char")]
        char: String,
    },

    /// Ensure string starts with given prefix
    EnsurePrefix { value: String },

    /// Ensure string ends with given suffix
    EnsureSuffix { value: String },

    /// Map values using a lookup table
    Map {
        mapping: HashMap<String, String>,
        #[serde(default)]
        case_insensitive: bool,
        /// Value to use when no mapping matches (none = empty string)
        #[serde(default)]
        default_unmapped: Option<String>,
    },

    /// Characters from `start`, optionally limited to `length`
    Substring {
        start: usize,
        #[serde(default)]
        length: Option<usize>,
    },

    /// Remove all non-alphanumeric characters
    Alphanumeric,

    /// Remove all non-digit characters
    DigitsOnly,

    /// Convert to an integer (null when there are no digits)
    ToNumber,

    /// Extract the first 4-digit year (null when absent)
    ExtractYear,

    /// Replace null or blank strings with a value
    Default { value: Value },
}

fn default_pad_char() -> String {
    "0".to_string()
}

impl Operation {
    /// Configuration name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ToString => "to_string",
            Operation::Uppercase => "uppercase",
            Operation::Lowercase => "lowercase",
            Operation::Trim => "trim",
            Operation::Replace { .. } => "replace",
            Operation::PadStart { .. } => "pad_start",
            Operation::PadEnd { .. } => "pad_end",
            Operation::EnsurePrefix { .. } => "ensure_prefix",
            Operation::EnsureSuffix { .. } => "ensure_suffix",
            Operation::Map { .. } => "map",
            Operation::Substring { .. } => "substring",
            Operation::Alphanumeric => "alphanumeric",
            Operation::DigitsOnly => "digits_only",
            Operation::ToNumber => "to_number",
            Operation::ExtractYear => "extract_year",
            Operation::Default { .. } => "default",
        }
    }

    /// Compile into a pipeline stage. Regex patterns are compiled here, once.
    pub fn stage(&self) -> ConfigResult<Stage> {
        let stage: Stage = match self {
            Operation::ToString => Rc::new(pipeline::stringify),
            Operation::Uppercase => Rc::new(pipeline::to_upper),
            Operation::Lowercase => Rc::new(pipeline::to_lower),
            Operation::Replace { pattern, value } => {
                let re = compile(pattern)?;
                let replacement = value.clone();
                Rc::new(move |v| {
                    let s = expect_string("replace", v)?;
                    Ok(Value::String(re.replace_all(&s, replacement.as_str()).into_owned()))
                })
            }
            other => {
                let op = other.clone();
                Rc::new(move |v| op.apply(v))
            }
        };
        Ok(stage)
    }

    /// Apply this operation to a single value.
    ///
    /// This is the one-off path: a `replace` compiles its pattern on every
    /// call. Pipelines use [`Operation::stage`], which compiles it once. An
    /// invalid pattern surfaces as [`MappingError::Custom`] wrapping the
    /// [`ConfigError`].
    pub fn apply(&self, value: Value) -> MappingResult<Value> {
        match self {
            Operation::ToString => pipeline::stringify(value),
            Operation::Uppercase => pipeline::to_upper(value),
            Operation::Lowercase => pipeline::to_lower(value),
            Operation::Trim => self.map_string(value, |s| s.trim().to_string()),
            Operation::Replace { .. } => {
                let stage = self.stage().map_err(MappingError::custom)?;
                stage(value)
            }
            Operation::PadStart { length, char } => {
                self.map_string(value, |s| pad(s, *length, char, true))
            }
            Operation::PadEnd { length, char } => {
                self.map_string(value, |s| pad(s, *length, char, false))
            }
            Operation::EnsurePrefix { value: prefix } => self.map_string(value, |s| {
                if s.starts_with(prefix.as_str()) {
                    s
                } else {
                    format!("{}{}", prefix, s)
                }
            }),
            Operation::EnsureSuffix { value: suffix } => self.map_string(value, |s| {
                if s.ends_with(suffix.as_str()) {
                    s
                } else {
                    format!("{}{}", s, suffix)
                }
            }),
            Operation::Map {
                mapping,
                case_insensitive,
                default_unmapped,
            } => self.map_string(value, |s| {
                let found = if *case_insensitive {
                    let key = s.to_lowercase();
                    mapping.iter().find(|(k, _)| k.to_lowercase() == key).map(|(_, v)| v)
                } else {
                    mapping.get(&s)
                };
                match found {
                    Some(mapped) => mapped.clone(),
                    None => default_unmapped.clone().unwrap_or_default(),
                }
            }),
            Operation::Substring { start, length } => self.map_string(value, |s| {
                let chars = s.chars().skip(*start);
                match length {
                    Some(length) => chars.take(*length).collect(),
                    None => chars.collect(),
                }
            }),
            Operation::Alphanumeric => {
                self.map_string(value, |s| s.chars().filter(|c| c.is_alphanumeric()).collect())
            }
            Operation::DigitsOnly => {
                self.map_string(value, |s| s.chars().filter(|c| c.is_ascii_digit()).collect())
            }
            Operation::ToNumber => match value {
                Value::Number(_) => Ok(value),
                Value::String(s) => Ok(to_number(&s)),
                other => Err(MappingError::type_mismatch(
                    "function to_number",
                    "string or number",
                    &other,
                )),
            },
            Operation::ExtractYear => {
                let s = expect_string("extract_year", value)?;
                Ok(YEAR
                    .find(&s)
                    .and_then(|m| m.as_str().parse::<i64>().ok())
                    .map(Value::from)
                    .unwrap_or(Value::Null))
            }
            Operation::Default { value: default } => Ok(match value {
                Value::Null => default.clone(),
                Value::String(s) if s.trim().is_empty() => default.clone(),
                other => other,
            }),
        }
    }

    fn map_string(&self, value: Value, f: impl FnOnce(String) -> String) -> MappingResult<Value> {
        expect_string(self.name(), value).map(|s| Value::String(f(s)))
    }
}

/// Compile a list of operations into a pipeline.
pub fn compile_pipeline(operations: &[Operation]) -> ConfigResult<Pipeline> {
    operations.iter().map(Operation::stage).collect()
}

fn compile(pattern: &str) -> ConfigResult<Regex> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn expect_string(function: &str, value: Value) -> MappingResult<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(MappingError::type_mismatch(
            format!("function {}", function),
            "string",
            &other,
        )),
    }
}

fn pad(s: String, length: usize, pad_char: &str, at_start: bool) -> String {
    let len = s.chars().count();
    if len >= length {
        return s;
    }
    let pad = pad_char.chars().next().unwrap_or('0');
    let padding: String = std::iter::repeat(pad).take(length - len).collect();
    if at_start {
        format!("{}{}", padding, s)
    } else {
        format!("{}{}", s, padding)
    }
}

fn to_number(s: &str) -> Value {
    let is_negative = s.trim().starts_with('-');
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Value::Null;
    }
    let num = if is_negative {
        format!("-{}", digits)
    } else {
        digits
    };
    num.parse::<i64>().map(Value::from).unwrap_or(Value::Null)
}

/// Get a description of all available operations
pub fn operations_description() -> String {
    r#"Available transformation operations:

| Operation     | Description                               | Parameters                                              |
|---------------|-------------------------------------------|---------------------------------------------------------|
| to_string     | Any value to text (null becomes "")       | -                                                       |
| uppercase     | Convert to uppercase                      | -                                                       |
| lowercase     | Convert to lowercase                      | -                                                       |
| trim          | Remove leading/trailing whitespace        | -                                                       |
| replace       | Regex pattern replacement                 | pattern: regex, value: replacement                      |
| pad_start     | Pad string at start                       | length: target length, char: pad character (default "0") |
| pad_end       | Pad string at end                         | length: target length, char: pad character (default "0") |
| ensure_prefix | Add prefix if not present                 | value: prefix string                                    |
| ensure_suffix | Add suffix if not present                 | value: suffix string                                    |
| map           | Map values using lookup table             | mapping: {source: target}, case_insensitive, default_unmapped |
| substring     | Extract substring                         | start: start index, length: optional length             |
| alphanumeric  | Keep only alphanumeric chars              | -                                                       |
| digits_only   | Keep only digits                          | -                                                       |
| to_number     | Convert to integer                        | -                                                       |
| extract_year  | Extract 4-digit year from date            | -                                                       |
| default       | Replace null/blank with a value           | value: any JSON value                                   |

All operations except to_string, to_number and default require a string.

Example operations in JSON:
[
  {"type": "trim"},
  {"type": "replace", "pattern": "[-. ]", "value": ""},
  {"type": "map", "mapping": {"M": "Mr", "F": "Ms"}, "case_insensitive": true},
  {"type": "to_number"},
  {"type": "to_string"}
]"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(op: Operation, value: Value) -> Value {
        op.stage().unwrap()(value).unwrap()
    }

    #[test]
    fn test_deserialize_tagged() {
        let ops: Vec<Operation> = serde_json::from_str(
            r#"[{"type": "trim"}, {"type": "stringify"}, {"type": "pad_start", "length": 4}]"#,
        )
        .unwrap();
        assert_eq!(
            ops,
            vec![
                Operation::Trim,
                Operation::ToString,
                Operation::PadStart {
                    length: 4,
                    char: "0".into()
                },
            ]
        );
    }

    #[test]
    fn test_trim() {
        assert_eq!(run(Operation::Trim, json!("  hello  ")), json!("hello"));
    }

    #[test]
    fn test_case_operations() {
        assert_eq!(run(Operation::Uppercase, json!("Tim")), json!("TIM"));
        assert_eq!(run(Operation::Lowercase, json!("Tim")), json!("tim"));
    }

    #[test]
    fn test_string_operations_reject_other_types() {
        let err = Operation::Trim.stage().unwrap()(json!(3)).unwrap_err();
        assert_eq!(err.to_string(), "invalid type number for function trim, expected string");
    }

    #[test]
    fn test_replace() {
        let op = Operation::Replace {
            pattern: "[-. ]".into(),
            value: String::new(),
        };
        assert_eq!(run(op.clone(), json!("T-123.456 789")), json!("T123456789"));
        assert_eq!(op.apply(json!("1-2")).unwrap(), json!("12"));
    }

    #[test]
    fn test_invalid_pattern_fails_at_compile_time() {
        let op = Operation::Replace {
            pattern: "(".into(),
            value: String::new(),
        };
        assert!(matches!(op.stage(), Err(ConfigError::InvalidPattern { .. })));

        match op.apply(json!("x")).unwrap_err() {
            MappingError::Custom(err) => {
                assert!(matches!(
                    err.downcast_ref::<ConfigError>(),
                    Some(ConfigError::InvalidPattern { .. })
                ));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_pad() {
        let op = Operation::PadStart {
            length: 4,
            char: "0".into(),
        };
        assert_eq!(run(op, json!("42")), json!("0042"));

        let op = Operation::PadEnd {
            length: 3,
            char: "*".into(),
        };
        assert_eq!(run(op.clone(), json!("a")), json!("a**"));
        assert_eq!(run(op, json!("abcd")), json!("abcd"));
    }

    #[test]
    fn test_map() {
        let mut mapping = HashMap::new();
        mapping.insert("M".to_string(), "Mr".to_string());
        mapping.insert("F".to_string(), "Ms".to_string());

        let op = Operation::Map {
            mapping: mapping.clone(),
            case_insensitive: true,
            default_unmapped: None,
        };
        assert_eq!(run(op.clone(), json!("m")), json!("Mr"));
        assert_eq!(run(op, json!("X")), json!(""));

        let op = Operation::Map {
            mapping,
            case_insensitive: false,
            default_unmapped: Some("Mx".into()),
        };
        assert_eq!(run(op.clone(), json!("f")), json!("Mx"));
        assert_eq!(run(op, json!("F")), json!("Ms"));
    }

    #[test]
    fn test_substring_and_filters() {
        let op = Operation::Substring {
            start: 1,
            length: Some(3),
        };
        assert_eq!(run(op, json!("abcdef")), json!("bcd"));
        assert_eq!(run(Operation::DigitsOnly, json!("a1b2")), json!("12"));
        assert_eq!(run(Operation::Alphanumeric, json!("a-1 b")), json!("a1b"));
    }

    #[test]
    fn test_to_number() {
        assert_eq!(run(Operation::ToNumber, json!("123-456")), json!(123456));
        assert_eq!(run(Operation::ToNumber, json!("-12")), json!(-12));
        assert_eq!(run(Operation::ToNumber, json!("n/a")), Value::Null);
        assert_eq!(run(Operation::ToNumber, json!(7)), json!(7));
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(run(Operation::ExtractYear, json!("01/01/2000")), json!(2000));
        assert_eq!(run(Operation::ExtractYear, json!("unknown")), Value::Null);
    }

    #[test]
    fn test_default() {
        let op = Operation::Default { value: json!("n/a") };
        assert_eq!(run(op.clone(), Value::Null), json!("n/a"));
        assert_eq!(run(op.clone(), json!("  ")), json!("n/a"));
        assert_eq!(run(op, json!("x")), json!("x"));
    }

    #[test]
    fn test_compile_pipeline_in_order() {
        let pipeline = compile_pipeline(&[Operation::ToString, Operation::Trim, Operation::Uppercase]).unwrap();
        assert_eq!(pipeline.len(), 3);
        assert_eq!(pipeline.apply(json!(" tim ")).unwrap(), json!("TIM"));
        assert_eq!(pipeline.apply(Value::Null).unwrap(), json!(""));
    }

    #[test]
    fn test_description_lists_every_operation() {
        let description = operations_description();
        for op in ["to_string", "uppercase", "lowercase", "replace", "map", "extract_year", "default"] {
            assert!(description.contains(op), "missing {}", op);
        }
    }
}
