//! Lookup tables.
//!
//! Small read-only CSV tables queried by key, typically from computed
//! sources (e.g. turning a postcode into an index value). The first column
//! of each table is its key; matching is a case-insensitive linear scan.

use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use crate::error::{LookupError, LookupResult, MappingError};
use crate::mapping::{Computed, Source};

/// One lookup table: a header plus data rows.
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl LookupTable {
    /// Parse CSV text whose first row is the header.
    pub fn from_csv(text: &str) -> LookupResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(text.as_bytes());

        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if header.is_empty() {
            return Err(LookupError::EmptyTable);
        }

        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;

        Ok(Self { header, rows })
    }

    /// Load a table from a CSV file.
    pub fn from_path(path: impl AsRef<Path>) -> LookupResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_csv(&text)
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row whose key cell is non-empty and equals `key`, ignoring case.
    pub fn first_matching_record(&self, key: &str) -> Option<&[String]> {
        self.rows
            .iter()
            .find(|row| {
                row.first()
                    .is_some_and(|cell| !cell.is_empty() && cell.to_lowercase() == key.to_lowercase())
            })
            .map(Vec::as_slice)
    }

    /// Integer in the 1-based `column` of the first row matching `key`.
    ///
    /// `Ok(None)` means no row matched.
    pub fn parse_int(&self, key: &str, column: usize) -> LookupResult<Option<i64>> {
        let Some(row) = self.first_matching_record(key) else {
            return Ok(None);
        };

        let cell = column
            .checked_sub(1)
            .and_then(|i| row.get(i))
            .ok_or(LookupError::ColumnOutOfRange {
                column,
                len: row.len(),
            })?;

        cell.trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|source| LookupError::InvalidInteger {
                value: cell.clone(),
                source,
            })
    }
}

/// Named collection of lookup tables.
#[derive(Debug, Default)]
pub struct LookupTables {
    tables: HashMap<String, LookupTable>,
}

impl LookupTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table under `id`, replacing any previous one.
    pub fn insert(&mut self, id: impl Into<String>, table: LookupTable) {
        self.tables.insert(id.into(), table);
    }

    pub fn get(&self, id: &str) -> LookupResult<&LookupTable> {
        self.tables
            .get(id)
            .ok_or_else(|| LookupError::UnknownTable(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tables.contains_key(id)
    }

    /// Query table `id`, see [`LookupTable::parse_int`].
    pub fn parse_int(&self, id: &str, key: &str, column: usize) -> LookupResult<Option<i64>> {
        self.get(id)?.parse_int(key, column)
    }
}

/// Computed source looking up the value produced by `key` in a table.
///
/// The key must be a string. Produces an integer, or `null` when no row
/// matches.
pub fn lookup_int(tables: Rc<LookupTables>, table: String, key: Box<dyn Source>, column: usize) -> Computed {
    Computed::formula(move || {
        let key = match key.value()? {
            Value::String(key) => key,
            other => {
                return Err(MappingError::type_mismatch(
                    format!("lookup key of table '{}'", table),
                    "string",
                    &other,
                ))
            }
        };

        let found = tables.parse_int(&table, &key, column)?;
        tracing::trace!(table = %table, key = %key, found = found.is_some(), "lookup");
        Ok(found.map(Value::from).unwrap_or(Value::Null))
    })
}
