#![allow(dead_code)]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use keyset_core::{Statement, Value, ValueKind};
use keyset_db::{
    ColumnDef, ConnectOpts, DbError, DbHandle, KeysetEntity, Record, ScanError, SortColumn, Store,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ranking {
    pub id: i64,
    pub rank: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RankingKey {
    Rank,
    Name,
}

impl std::fmt::Display for RankingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

fn rank_of(r: &Ranking) -> Value {
    Value::Integer(r.rank)
}

fn name_of(r: &Ranking) -> Value {
    Value::Text(r.name.clone())
}

static COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", ValueKind::Integer),
    ColumnDef::new("rank", ValueKind::Integer),
    ColumnDef::new("name", ValueKind::Text),
    ColumnDef::new("created_at", ValueKind::Timestamp),
];

static SORT_COLUMNS: &[SortColumn<RankingKey, Ranking>] = &[
    SortColumn {
        key: RankingKey::Rank,
        column: ColumnDef::new("rank", ValueKind::Integer),
        extract: rank_of,
    },
    SortColumn {
        key: RankingKey::Name,
        column: ColumnDef::new("name", ValueKind::Text),
        extract: name_of,
    },
];

impl KeysetEntity for Ranking {
    type SortKey = RankingKey;
    const TABLE: &'static str = "rankings";

    fn columns() -> &'static [ColumnDef] {
        COLUMNS
    }

    fn sort_columns() -> &'static [SortColumn<RankingKey, Self>] {
        SORT_COLUMNS
    }

    fn filter_columns() -> &'static [ColumnDef] {
        &COLUMNS[1..3]
    }

    fn from_record(record: &Record) -> Result<Self, ScanError> {
        Ok(Self {
            id: record.integer("id")?,
            rank: record.integer("rank")?,
            name: record.text("name")?,
            created_at: record.timestamp("created_at")?,
        })
    }
}

pub const ANIMALS: &[(i64, &str)] = &[
    (1, "Lion"),
    (2, "Tiger"),
    (3, "Elephant"),
    (4, "Leopard"),
    (5, "Wolf"),
];

pub fn created_at(rank: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 25, 10, 0, 0).unwrap() + chrono::Duration::minutes(5 * (rank - 1))
}

/// Single-connection in-memory SQLite seeded with the five rankings.
pub async fn seeded_sqlite() -> Result<DbHandle> {
    let db = DbHandle::connect(
        "sqlite::memory:",
        ConnectOpts {
            max_conns: Some(1),
            min_conns: Some(1),
            ..Default::default()
        },
    )
    .await?;
    let pool = db.sqlx_sqlite().expect("sqlite pool");

    sqlx::query(
        "CREATE TABLE rankings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            rank INTEGER NOT NULL UNIQUE,
            name VARCHAR(100) NOT NULL,
            created_at TIMESTAMP NOT NULL
        )",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX rankings_name_idx ON rankings (name)")
        .execute(pool)
        .await?;

    for (rank, name) in ANIMALS {
        sqlx::query("INSERT INTO rankings (rank, name, created_at) VALUES (?, ?, ?)")
            .bind(*rank)
            .bind(*name)
            .bind(created_at(*rank).naive_utc())
            .execute(pool)
            .await?;
    }

    Ok(db)
}

pub fn record(id: i64, rank: i64, name: &str) -> Record {
    Record::new()
        .with("id", id)
        .with("rank", rank)
        .with("name", name)
        .with("created_at", created_at(rank))
}

/// Store double that records every call and replays canned rows.
#[derive(Default)]
pub struct SpyStore {
    pub calls: AtomicUsize,
    pub rows: Vec<Record>,
    pub fail: bool,
    pub delay: Option<Duration>,
}

impl SpyStore {
    pub fn with_rows(rows: Vec<Record>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Store for SpyStore {
    async fn fetch(
        &self,
        _stmt: &Statement,
        _columns: &'static [ColumnDef],
    ) -> Result<Vec<Record>, DbError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        if self.fail {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(self.rows.clone())
    }
}
