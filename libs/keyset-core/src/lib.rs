//! Keyset (cursor) pagination engine.
//!
//! Turns a `(sort column, cursor value, direction, limit, filter set)` request
//! into one parameterized SQL statement plus its bound arguments. Execution of
//! the statement lives in `keyset-db`; this crate has no database dependency.

pub mod cursor;
pub mod filter;
pub mod page;
pub mod query;

pub use cursor::{operator, SortDir};
pub use filter::{compile, CompiledFilters, Filter, FilterSet};
pub use page::{Page, PageInfo};
pub use query::{assemble, PageQuery, Statement};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value type of a sortable or filterable column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Integer,
    Text,
    Timestamp,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueKind::Integer => "integer",
            ValueKind::Text => "text",
            ValueKind::Timestamp => "timestamp",
        };
        f.write_str(s)
    }
}

/// A scalar bound into a statement as a `?` parameter.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Integer(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Integer(_) => ValueKind::Integer,
            Value::Text(_) => ValueKind::Text,
            Value::Timestamp(_) => ValueKind::Timestamp,
        }
    }

    /// Short description that never includes the payload itself.
    pub fn redacted(&self) -> String {
        match self {
            Value::Integer(_) => "integer".to_string(),
            Value::Text(s) => format!("text(len={})", s.chars().count()),
            Value::Timestamp(_) => "timestamp".to_string(),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

/// Validation errors raised before any statement reaches the store.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid direction: {0:?} (expected ASC or DESC)")]
    InvalidDirection(String),

    #[error("invalid sort column: {0:?}")]
    InvalidColumn(String),

    #[error("invalid cursor for {kind} column: {value:?}")]
    InvalidCursor { kind: ValueKind, value: String },

    #[error("invalid filter on {field:?}: {reason}")]
    InvalidFilter { field: String, reason: String },
}

impl Error {
    pub fn invalid_filter(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
