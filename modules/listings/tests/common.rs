#![allow(dead_code)]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use keyset_core::Statement;
use keyset_db::{ColumnDef, ConnectOpts, DbError, DbHandle, Record, Store};
use listings::{ListingsConfig, RankingsService, ResourcesService};

pub const ANIMALS: &[(i64, &str)] = &[
    (1, "Lion"),
    (2, "Tiger"),
    (3, "Elephant"),
    (4, "Leopard"),
    (5, "Wolf"),
];

/// 2024-09-25T10:00:00Z plus `minutes`.
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 25, 10, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
}

/// In-memory SQLite with both listing tables created and seeded: five
/// rankings (Lion..Wolf) and five resources created five minutes apart.
pub async fn seeded_db() -> Result<DbHandle> {
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

    for ddl in [
        "CREATE TABLE animal_rankings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            rank INTEGER NOT NULL UNIQUE,
            name VARCHAR(100) NOT NULL,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        )",
        "CREATE INDEX animal_rankings_name_idx ON animal_rankings (name)",
        "CREATE TABLE resources (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid VARCHAR(100) NOT NULL UNIQUE,
            name VARCHAR(100) NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        "CREATE INDEX resources_created_at_idx ON resources (created_at)",
        "CREATE INDEX resources_name_idx ON resources (name)",
    ] {
        sqlx::query(ddl).execute(pool).await?;
    }

    for (rank, name) in ANIMALS {
        sqlx::query(
            "INSERT INTO animal_rankings (rank, name, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(*rank)
        .bind(*name)
        .bind(at(*rank).naive_utc())
        .bind(at(*rank).naive_utc())
        .execute(pool)
        .await?;
    }

    for i in 1..=5_i64 {
        sqlx::query("INSERT INTO resources (uuid, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(format!("uuid-{i}"))
            .bind(format!("Resource {i}"))
            .bind(at(5 * (i - 1)).naive_utc())
            .bind(at(5 * (i - 1)).naive_utc())
            .execute(pool)
            .await?;
    }

    Ok(db)
}

/// Resources written the way SQLite itself writes timestamps: four literal
/// `YYYY-MM-DD HH:MM:SS` rows five minutes apart, plus one row whose
/// timestamps come from `DEFAULT CURRENT_TIMESTAMP` (so it sorts last).
pub async fn resources_with_native_timestamps() -> Result<ResourcesService> {
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
        "CREATE TABLE resources (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid VARCHAR(100) NOT NULL UNIQUE,
            name VARCHAR(100) NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    for (i, ts) in [
        "2024-09-25 10:00:00",
        "2024-09-25 10:05:00",
        "2024-09-25 10:10:00",
        "2024-09-25 10:15:00",
    ]
    .iter()
    .enumerate()
    {
        sqlx::query(&format!(
            "INSERT INTO resources (uuid, name, created_at, updated_at) \
             VALUES ('uuid-r{i}', 'R{i}', '{ts}', '{ts}')"
        ))
        .execute(pool)
        .await?;
    }
    sqlx::query("INSERT INTO resources (uuid, name) VALUES ('uuid-now', 'Now')")
        .execute(pool)
        .await?;

    let store: Arc<dyn Store> = Arc::new(db);
    Ok(ResourcesService::new(store, ListingsConfig::default()))
}

pub async fn rankings() -> Result<RankingsService> {
    let store: Arc<dyn Store> = Arc::new(seeded_db().await?);
    Ok(RankingsService::new(store, ListingsConfig::default()))
}

pub async fn resources() -> Result<ResourcesService> {
    let store: Arc<dyn Store> = Arc::new(seeded_db().await?);
    Ok(ResourcesService::new(store, ListingsConfig::default()))
}

/// Store double that counts calls and returns no rows.
#[derive(Default)]
pub struct SpyStore {
    calls: AtomicUsize,
    pub last_sql: std::sync::Mutex<Option<String>>,
}

impl SpyStore {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Store for SpyStore {
    async fn fetch(
        &self,
        stmt: &Statement,
        _columns: &'static [ColumnDef],
    ) -> Result<Vec<Record>, DbError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_sql.lock().unwrap() = Some(stmt.sql.clone());
        Ok(Vec::new())
    }
}
