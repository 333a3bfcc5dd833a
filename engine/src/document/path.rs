//! Dotted path navigation over JSON values.
//!
//! Paths are dot separated keys with optional bracketed array indexes:
//!
//! ```text
//! user.first_name
//! orders[0].lines[2].sku
//! orders.0.sku          (numeric segments index into arrays)
//! ```

use serde_json::{Map, Value};

use crate::error::{type_name, PathError, PathResult};

/// One step of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    fn label(&self) -> String {
        match self {
            Segment::Key(key) => key.clone(),
            Segment::Index(i) => format!("[{}]", i),
        }
    }
}

/// Parse a path expression into segments.
pub fn parse(path: &str) -> PathResult<Vec<Segment>> {
    let invalid = |reason: &str| PathError::Invalid {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.trim().is_empty() {
        return Err(invalid("path is empty"));
    }

    let mut segments = Vec::new();
    for part in path.split('.') {
        if part.is_empty() {
            return Err(invalid("empty segment"));
        }

        let (key, mut rest) = match part.find('[') {
            Some(pos) => part.split_at(pos),
            None => (part, ""),
        };
        if !key.is_empty() {
            segments.push(Segment::Key(key.to_string()));
        }

        while !rest.is_empty() {
            let close = rest.find(']').ok_or_else(|| invalid("unclosed '['"))?;
            let index = rest[1..close]
                .trim()
                .parse::<usize>()
                .map_err(|_| invalid("array index must be a non-negative integer"))?;
            segments.push(Segment::Index(index));
            rest = &rest[close + 1..];
            if !rest.is_empty() && !rest.starts_with('[') {
                return Err(invalid("unexpected characters after ']'"));
            }
        }
    }

    Ok(segments)
}

/// Borrow the value at `path`.
///
/// A `null` stored at the path is returned as such; only a missing key,
/// a missing index or a scalar in the way yields [`PathError::NotExist`].
pub fn value_for_path<'a>(root: &'a Value, path: &str) -> PathResult<&'a Value> {
    let mut node = root;
    for segment in parse(path)? {
        let next = match (&segment, node) {
            (Segment::Key(key), Value::Object(map)) => map.get(key),
            (Segment::Key(key), Value::Array(items)) => {
                key.parse::<usize>().ok().and_then(|i| items.get(i))
            }
            (Segment::Index(i), Value::Array(items)) => items.get(*i),
            _ => None,
        };
        node = next.ok_or_else(|| PathError::NotExist(path.to_string()))?;
    }
    Ok(node)
}

/// Store `value` at `path`, creating intermediate containers as needed.
///
/// Null nodes along the way become objects for key segments and arrays for
/// index segments. An index may address an existing element or the position
/// right after the last one (append). A failed write leaves `root` untouched.
pub fn set_value_for_path(root: &mut Value, value: Value, path: &str) -> PathResult<()> {
    let segments = parse(path)?;
    check_writable(root, &segments)?;
    let slot = slot_for_path(root, segments)?;
    *slot = value;
    Ok(())
}

/// Walk `segments` without creating anything and report the error the
/// write would hit. `None` stands for a node the write would create.
fn check_writable(root: &Value, segments: &[Segment]) -> PathResult<()> {
    let mut node = Some(root);
    for segment in segments {
        node = match (segment, node) {
            (Segment::Index(i), None | Some(Value::Null)) if *i > 0 => {
                return Err(PathError::IndexOutOfBounds {
                    segment: segment.label(),
                    index: *i,
                    len: 0,
                })
            }
            (_, None | Some(Value::Null)) => None,
            (Segment::Key(key), Some(Value::Object(map))) => map.get(key),
            (Segment::Key(key), Some(Value::Array(items))) => match key.parse::<usize>() {
                Ok(i) => element(items, i, key)?,
                Err(_) => {
                    return Err(PathError::NotAContainer {
                        segment: key.clone(),
                        found: "array",
                    })
                }
            },
            (Segment::Index(i), Some(Value::Array(items))) => element(items, *i, &segment.label())?,
            (segment, Some(other)) => {
                return Err(PathError::NotAContainer {
                    segment: segment.label(),
                    found: type_name(other),
                })
            }
        };
    }
    Ok(())
}

fn element<'a>(items: &'a [Value], index: usize, segment: &str) -> PathResult<Option<&'a Value>> {
    let len = items.len();
    if index > len {
        return Err(PathError::IndexOutOfBounds {
            segment: segment.to_string(),
            index,
            len,
        });
    }
    Ok(items.get(index))
}

fn slot_for_path(root: &mut Value, segments: Vec<Segment>) -> PathResult<&mut Value> {
    let mut node = root;
    for segment in segments {
        if node.is_null() {
            *node = match segment {
                Segment::Key(_) => Value::Object(Map::new()),
                Segment::Index(_) => Value::Array(Vec::new()),
            };
        }

        node = match (segment, node) {
            (Segment::Key(key), Value::Object(map)) => map.entry(key).or_insert(Value::Null),
            (Segment::Key(key), Value::Array(items)) => match key.parse::<usize>() {
                Ok(i) => element_mut(items, i, &key)?,
                Err(_) => {
                    return Err(PathError::NotAContainer {
                        segment: key,
                        found: "array",
                    })
                }
            },
            (Segment::Index(i), Value::Array(items)) => {
                let label = Segment::Index(i).label();
                element_mut(items, i, &label)?
            }
            (segment, other) => {
                return Err(PathError::NotAContainer {
                    segment: segment.label(),
                    found: type_name(other),
                })
            }
        };
    }
    Ok(node)
}

fn element_mut<'a>(items: &'a mut Vec<Value>, index: usize, segment: &str) -> PathResult<&'a mut Value> {
    let len = items.len();
    if index == len {
        items.push(Value::Null);
    } else if index > len {
        return Err(PathError::IndexOutOfBounds {
            segment: segment.to_string(),
            index,
            len,
        });
    }
    Ok(&mut items[index])
}
