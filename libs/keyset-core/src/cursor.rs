//! Cursor comparison and the textual cursor codec.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, Value, ValueKind};

/// Page direction. Drives both the cursor operator and `ORDER BY`, so the two
/// can never disagree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    /// Strict inequality against the cursor: the row that produced the cursor
    /// is never returned again.
    pub fn cursor_op(self) -> &'static str {
        match self {
            SortDir::Asc => ">",
            SortDir::Desc => "<",
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for SortDir {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ASC" => Ok(SortDir::Asc),
            "DESC" => Ok(SortDir::Desc),
            _ => Err(Error::InvalidDirection(s.to_string())),
        }
    }
}

/// Comparison operator for a raw direction string.
pub fn operator(direction: &str) -> Result<&'static str> {
    direction.parse::<SortDir>().map(SortDir::cursor_op)
}

/// Encode a cursor value for the wire.
pub fn encode_value(value: &Value) -> String {
    match value {
        Value::Integer(i) => i.to_string(),
        Value::Text(s) => s.clone(),
        Value::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
    }
}

/// Parse a wire cursor (or a wire filter scalar) into a value of `kind`.
pub fn parse_value(kind: ValueKind, raw: &str) -> Result<Value> {
    let invalid = || Error::InvalidCursor {
        kind,
        value: raw.to_string(),
    };
    Ok(match kind {
        ValueKind::Integer => Value::Integer(raw.trim().parse::<i64>().map_err(|_| invalid())?),
        ValueKind::Text => Value::Text(raw.to_string()),
        ValueKind::Timestamp => {
            let ts = DateTime::parse_from_rfc3339(raw.trim()).map_err(|_| invalid())?;
            Value::Timestamp(ts.with_timezone(&Utc))
        }
    })
}
