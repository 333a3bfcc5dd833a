//! Tree documents addressed by dotted paths.
//!
//! A [`Document`] is a shared handle over a JSON value. Path sources and
//! targets hold clones of the same handle, so writes made by one mapping
//! are visible to the caller and to every later mapping.

pub mod path;

use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

use crate::error::PathResult;
use crate::mapping::pipeline::display;

pub use path::{set_value_for_path, value_for_path, Segment};

/// Shared, mutable JSON document.
///
/// Borrows of the inner value never escape a method call.
#[derive(Debug, Clone, Default)]
pub struct Document(Rc<RefCell<Value>>);

impl Document {
    /// Wrap an existing value.
    pub fn new(value: Value) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// An empty JSON object.
    pub fn object() -> Self {
        Self::new(Value::Object(serde_json::Map::new()))
    }

    /// Parse a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self::new)
    }

    /// Copy of the value at `path`.
    pub fn value_for_path(&self, path: &str) -> PathResult<Value> {
        path::value_for_path(&self.0.borrow(), path).cloned()
    }

    /// Store `value` at `path`, creating intermediate objects.
    pub fn set_value_for_path(&self, value: Value, path: &str) -> PathResult<()> {
        path::set_value_for_path(&mut self.0.borrow_mut(), value, path)
    }

    /// The value at `path` as display text, or `""` when absent or null.
    pub fn value_or_empty_for_path_string(&self, path: &str) -> String {
        match path::value_for_path(&self.0.borrow(), path) {
            Ok(value) => display(value),
            Err(_) => String::new(),
        }
    }

    /// Snapshot of the whole document.
    pub fn to_value(&self) -> Value {
        self.0.borrow().clone()
    }

    /// Pretty-printed JSON of the whole document.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&*self.0.borrow())
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}
