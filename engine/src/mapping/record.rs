//! Delimited records and headers.

use std::cell::RefCell;
use std::rc::Rc;

/// Ordered field names of a delimited record set.
///
/// Headers are immutable and cheap to clone. Names resolve when a field is
/// read or written, so a source or target sees a new header as soon as its
/// [`FieldRef`](super::field::FieldRef) holds one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header(Rc<[String]>);

impl Header {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// 1-based position of the first field called `name`.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|field| field == name).map(|i| i + 1)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for Header {
    fn from(names: Vec<String>) -> Self {
        Self(names.into())
    }
}

impl From<&[&str]> for Header {
    fn from(names: &[&str]) -> Self {
        Self::new(names.iter().copied())
    }
}

/// Shared, mutable row of string cells.
///
/// Cloning a `Record` clones the handle: every clone reads and writes the
/// same cells. Borrows of the cells never escape a method call.
#[derive(Debug, Clone, Default)]
pub struct Record(Rc<RefCell<Vec<String>>>);

impl Record {
    pub fn new<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(Rc::new(RefCell::new(cells.into_iter().map(Into::into).collect())))
    }

    /// A record of `len` empty cells.
    pub fn blank(len: usize) -> Self {
        Self::new(vec![String::new(); len])
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Cell at the 0-based `index`.
    pub fn get(&self, index: usize) -> Option<String> {
        self.0.borrow().get(index).cloned()
    }

    /// Overwrite the cell at the 0-based `index`, returning the old content.
    ///
    /// Returns `None` and leaves the record untouched when out of range.
    pub fn set(&self, index: usize, value: String) -> Option<String> {
        self.0
            .borrow_mut()
            .get_mut(index)
            .map(|cell| std::mem::replace(cell, value))
    }

    /// Replace every cell, e.g. to reuse the handle for the next row.
    pub fn replace(&self, cells: Vec<String>) -> Vec<String> {
        std::mem::replace(&mut *self.0.borrow_mut(), cells)
    }

    /// Snapshot of the cells.
    pub fn to_vec(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

impl From<Vec<String>> for Record {
    fn from(cells: Vec<String>) -> Self {
        Self(Rc::new(RefCell::new(cells)))
    }
}
