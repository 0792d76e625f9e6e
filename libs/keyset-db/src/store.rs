//! The execution seam between the page executor and a concrete database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keyset_core::{Statement, Value, ValueKind};
use sqlx::Row;

use crate::entity::{ColumnDef, Record};
use crate::{DbError, DbHandle, DbPool};

/// Parameterized query execution.
///
/// Implementations run `stmt.sql` with `stmt.args` bound in order and decode
/// every returned row according to `columns`. Zero rows is `Ok(vec![])`;
/// connectivity and decoding failures are `Err`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn fetch(
        &self,
        stmt: &Statement,
        columns: &'static [ColumnDef],
    ) -> Result<Vec<Record>, DbError>;
}

#[async_trait]
impl Store for DbHandle {
    async fn fetch(
        &self,
        stmt: &Statement,
        columns: &'static [ColumnDef],
    ) -> Result<Vec<Record>, DbError> {
        match self.pool() {
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(pool) => {
                let mut query = sqlx::query(&stmt.sql);
                for arg in &stmt.args {
                    query = match arg {
                        Value::Integer(i) => query.bind(*i),
                        Value::Text(s) => query.bind(s.as_str()),
                        // SQLite compares timestamps as text; match the
                        // `CURRENT_TIMESTAMP` layout (`YYYY-MM-DD HH:MM:SS`).
                        Value::Timestamp(ts) => query.bind(ts.naive_utc()),
                    };
                }
                let rows = query.fetch_all(pool).await?;
                rows.iter().map(|row| decode_record(row, columns)).collect()
            }
            #[cfg(feature = "mysql")]
            DbPool::MySql(pool) => {
                let mut query = sqlx::query(&stmt.sql);
                for arg in &stmt.args {
                    query = match arg {
                        Value::Integer(i) => query.bind(*i),
                        Value::Text(s) => query.bind(s.as_str()),
                        Value::Timestamp(ts) => query.bind(*ts),
                    };
                }
                let rows = query.fetch_all(pool).await?;
                rows.iter().map(|row| decode_record(row, columns)).collect()
            }
            #[cfg(not(any(feature = "mysql", feature = "sqlite")))]
            _ => Err(DbError::FeatureDisabled("no database backends enabled")),
        }
    }
}

fn decode_record<'r, R>(row: &'r R, columns: &'static [ColumnDef]) -> Result<Record, DbError>
where
    R: Row,
    &'static str: sqlx::ColumnIndex<R>,
    i64: sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    String: sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    DateTime<Utc>: sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
{
    let mut record = Record::new();
    for col in columns {
        let value = match col.kind {
            ValueKind::Integer => Value::Integer(row.try_get::<i64, _>(col.name)?),
            ValueKind::Text => Value::Text(row.try_get::<String, _>(col.name)?),
            ValueKind::Timestamp => Value::Timestamp(row.try_get::<DateTime<Utc>, _>(col.name)?),
        };
        record.push(col.name, value);
    }
    Ok(record)
}
