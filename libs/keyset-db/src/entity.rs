//! Static per-entity descriptors.
//!
//! Each listable entity registers exactly one table of sortable columns. The
//! listing service, the filter allow-list and next-key derivation all read
//! the same table, so a sort key can never drift from its physical column.

use std::fmt::{Debug, Display};

use chrono::{DateTime, Utc};
use keyset_core::{Value, ValueKind};
use thiserror::Error;

/// A physical column and the type it is scanned as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ValueKind,
}

impl ColumnDef {
    pub const fn new(name: &'static str, kind: ValueKind) -> Self {
        Self { name, kind }
    }
}

/// Logical sort key → physical column, plus the accessor that reads the
/// cursor value back out of a materialized row.
pub struct SortColumn<K: 'static, E: 'static> {
    pub key: K,
    pub column: ColumnDef,
    pub extract: fn(&E) -> Value,
}

impl<K: Debug, E> Debug for SortColumn<K, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SortColumn")
            .field("key", &self.key)
            .field("column", &self.column)
            .finish()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("column {0:?} missing from result row")]
    MissingColumn(&'static str),

    #[error("column {column:?}: expected {expected}, got {got}")]
    TypeMismatch {
        column: &'static str,
        expected: ValueKind,
        got: ValueKind,
    },
}

/// One result row decoded according to an entity's [`ColumnDef`]s.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(&'static str, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: &'static str, value: Value) {
        self.fields.push((column, value));
    }

    pub fn with(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.push(column, value.into());
        self
    }

    pub fn get(&self, column: &'static str) -> Result<&Value, ScanError> {
        self.fields
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, v)| v)
            .ok_or(ScanError::MissingColumn(column))
    }

    pub fn integer(&self, column: &'static str) -> Result<i64, ScanError> {
        match self.get(column)? {
            Value::Integer(i) => Ok(*i),
            other => Err(mismatch(column, ValueKind::Integer, other)),
        }
    }

    pub fn text(&self, column: &'static str) -> Result<String, ScanError> {
        match self.get(column)? {
            Value::Text(s) => Ok(s.clone()),
            other => Err(mismatch(column, ValueKind::Text, other)),
        }
    }

    pub fn timestamp(&self, column: &'static str) -> Result<DateTime<Utc>, ScanError> {
        match self.get(column)? {
            Value::Timestamp(ts) => Ok(*ts),
            other => Err(mismatch(column, ValueKind::Timestamp, other)),
        }
    }
}

fn mismatch(column: &'static str, expected: ValueKind, got: &Value) -> ScanError {
    ScanError::TypeMismatch {
        column,
        expected,
        got: got.kind(),
    }
}

/// A row type that can be listed with keyset pagination.
pub trait KeysetEntity: Sized + Send + Sync + 'static {
    type SortKey: Copy + Eq + Debug + Display + Send + Sync + 'static;

    /// Physical table name.
    const TABLE: &'static str;

    /// Every column scanned from a `SELECT *` row.
    fn columns() -> &'static [ColumnDef];

    /// The static sort-key table. Must hold exactly one entry per sort key.
    fn sort_columns() -> &'static [SortColumn<Self::SortKey, Self>];

    /// Columns callers may filter on.
    fn filter_columns() -> &'static [ColumnDef];

    fn from_record(record: &Record) -> Result<Self, ScanError>;

    fn sort_column(key: Self::SortKey) -> Option<&'static SortColumn<Self::SortKey, Self>> {
        Self::sort_columns().iter().find(|c| c.key == key)
    }

    fn filter_column(name: &str) -> Option<&'static ColumnDef> {
        Self::filter_columns().iter().find(|c| c.name == name)
    }
}
