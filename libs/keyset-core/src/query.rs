//! Statement assembly: cursor predicate + filters + ordering + limit.

use serde::Serialize;

use crate::cursor::SortDir;
use crate::filter::{compile, FilterSet};
use crate::{Error, Result, Value};

/// One keyset page request against a physical column.
///
/// `direction` is kept as received from the caller and validated by
/// [`assemble`] before anything else.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageQuery {
    pub column: String,
    pub cursor: Value,
    pub direction: String,
    pub limit: u64,
    pub filters: FilterSet,
}

impl PageQuery {
    pub fn new(
        column: impl Into<String>,
        cursor: impl Into<Value>,
        direction: impl Into<String>,
        limit: u64,
    ) -> Self {
        Self {
            column: column.into(),
            cursor: cursor.into(),
            direction: direction.into(),
            limit,
            filters: FilterSet::new(),
        }
    }

    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }
}

/// A ready-to-run statement. `args` aligns 1:1 with the `?` placeholders in
/// `sql`; the cursor comes first and the limit last.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
    pub dir: SortDir,
    pub limit: u64,
}

impl Statement {
    /// Bound arguments described without their payload, for logging.
    pub fn redacted_args(&self) -> Vec<String> {
        self.args.iter().map(Value::redacted).collect()
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Build the SQL and bound arguments for one page.
///
/// Direction is checked first, then the sort column; both fail before any
/// SQL text exists.
pub fn assemble(table: &str, query: &PageQuery) -> Result<Statement> {
    let dir: SortDir = query.direction.parse()?;

    let column = query.column.trim();
    if column.is_empty() || !is_identifier(column) {
        return Err(Error::InvalidColumn(query.column.clone()));
    }

    let compiled = compile(&query.filters);

    let mut sql = format!(
        "SELECT * FROM {table} WHERE {column} {op} ?",
        op = dir.cursor_op()
    );
    let mut args = Vec::with_capacity(compiled.params.len() + 2);
    args.push(query.cursor.clone());

    for fragment in &compiled.fragments {
        sql.push_str(" AND ");
        sql.push_str(fragment);
    }
    args.extend(compiled.params);

    sql.push_str(&format!(" ORDER BY {column} {dir} LIMIT ?"));
    args.push(Value::Integer(
        i64::try_from(query.limit).unwrap_or(i64::MAX),
    ));

    Ok(Statement {
        sql,
        args,
        dir,
        limit: query.limit,
    })
}
