//! Field references and their resolution against a record.
//!
//! A field is identified either by an explicit 1-based position or by a
//! name looked up in a header. Resolution runs every time a record is
//! accessed, against whatever the record holds at that moment, and never
//! changes the reference itself.

use crate::error::{MappingError, MappingResult};

use super::record::Header;

/// Identifies one cell of a delimited record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRef {
    /// 1-based position; `0` means "look the name up instead".
    pub position: usize,
    /// Field name, used together with `header`.
    pub name: Option<String>,
    /// Header to resolve `name` against.
    pub header: Option<Header>,
}

impl FieldRef {
    /// Reference the field at a 1-based position.
    pub fn at(position: usize) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Reference a field by name within `header`.
    pub fn named(name: impl Into<String>, header: Header) -> Self {
        Self {
            position: 0,
            name: Some(name.into()),
            header: Some(header),
        }
    }

    /// Resolve to a 1-based position without bounds checking.
    ///
    /// A position of 1 or more is returned as is, header and name are not
    /// consulted. Otherwise the first header entry equal to the name wins.
    pub fn resolve(&self, record_len: usize) -> MappingResult<usize> {
        if self.position >= 1 {
            return Ok(self.position);
        }

        let (name, header) = match (self.name.as_deref(), self.header.as_ref()) {
            (Some(name), Some(header)) if !name.is_empty() && !header.is_empty() => (name, header),
            _ => return Err(MappingError::MissingFieldIdentifier { record_len }),
        };

        header
            .position_of(name)
            .ok_or_else(|| MappingError::UnknownFieldName {
                name: name.to_string(),
                header: header.names().to_vec(),
            })
    }

    /// Resolve and bounds check, returning the 0-based cell index.
    pub fn resolve_index(&self, record_len: usize) -> MappingResult<usize> {
        let position = self.resolve(record_len)?;
        if position > record_len {
            return Err(MappingError::FieldOutOfRange {
                position,
                record_len,
            });
        }
        Ok(position - 1)
    }

    /// Human readable identifier used in error context.
    pub fn describe(&self) -> String {
        match (self.position, self.name.as_deref()) {
            (0, Some(name)) => format!("column '{}'", name),
            (position, _) => format!("column {}", position),
        }
    }
}
