//! Transform pipelines.
//!
//! A pipeline is an ordered list of stages, each turning one value into
//! another. Stages run as a strict left fold: the source value enters the
//! first stage and the last stage's output goes to the target.

use serde_json::Value;
use std::fmt;
use std::rc::Rc;

use crate::error::{MappingError, MappingResult};

/// One pipeline stage.
pub type Stage = Rc<dyn Fn(Value) -> MappingResult<Value>>;

/// Ordered sequence of stages. Empty pipelines are the identity.
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    pub fn then<F>(mut self, stage: F) -> Self
    where
        F: Fn(Value) -> MappingResult<Value> + 'static,
    {
        self.stages.push(Rc::new(stage));
        self
    }

    /// Append an already shared stage.
    pub fn push(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run `value` through every stage, stopping at the first error.
    pub fn apply(&self, value: Value) -> MappingResult<Value> {
        self.stages.iter().try_fold(value, |value, stage| stage(value))
    }
}

impl FromIterator<Stage> for Pipeline {
    fn from_iter<I: IntoIterator<Item = Stage>>(iter: I) -> Self {
        Self {
            stages: iter.into_iter().collect(),
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages.len())
            .finish()
    }
}

// =============================================================================
// Reference stages
// =============================================================================

/// Display text of a value: `null` is empty, strings are unquoted and
/// containers render as compact JSON.
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Convert any value to its display string. Never fails.
pub fn stringify(value: Value) -> MappingResult<Value> {
    Ok(match value {
        Value::String(_) => value,
        other => Value::String(display(&other)),
    })
}

/// Uppercase a string value.
pub fn to_upper(value: Value) -> MappingResult<Value> {
    match value {
        Value::String(s) => Ok(Value::String(s.to_uppercase())),
        other => Err(MappingError::type_mismatch("function to_upper", "string", &other)),
    }
}

/// Lowercase a string value.
pub fn to_lower(value: Value) -> MappingResult<Value> {
    match value {
        Value::String(s) => Ok(Value::String(s.to_lowercase())),
        other => Err(MappingError::type_mismatch("function to_lower", "string", &other)),
    }
}
