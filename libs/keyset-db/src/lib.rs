#![cfg_attr(
    not(any(feature = "mysql", feature = "sqlite")),
    allow(unused_imports, unused_variables, dead_code, unreachable_code)
)]

//! Store side of the keyset listings engine.
//!
//! This crate owns everything that touches a database:
//! - [`DbHandle`]: a pooled SQLx connection (SQLite and MySQL via cargo
//!   features; both speak `?` placeholders, which is what `keyset-core` emits)
//! - [`Store`]: the seam the page executor runs statements through, so
//!   services can be given a real handle or a test double
//! - [`entity`]: static per-entity descriptors (columns, sortable columns)
//! - [`executor`]: runs an assembled statement and derives the next cursor
//!
//! # Example
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> keyset_db::Result<()> {
//!     use keyset_db::{ConnectOpts, DbHandle};
//!
//!     let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
//!     // Hand `Arc::new(db)` to a listing service as its `Arc<dyn Store>`.
//!     db.close().await;
//!     Ok(())
//! }
//! ```

pub mod entity;
pub mod executor;
pub mod store;

pub use entity::{ColumnDef, KeysetEntity, Record, ScanError, SortColumn};
pub use executor::{execute, fetch_page, ExecOptions, KeysetPage, PageError};
pub use store::Store;

use std::time::Duration;

#[cfg(feature = "mysql")]
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
#[cfg(feature = "sqlite")]
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use thiserror::Error;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Typed error for the DB handle and helpers.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error("Feature not enabled: {0}")]
    FeatureDisabled(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Supported engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
    MySql,
    Sqlite,
}

/// Connection options.
/// Each driver applies the subset of pool knobs it supports.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    /// Maximum number of connections in the pool.
    pub max_conns: Option<u32>,
    /// Minimum number of connections in the pool.
    pub min_conns: Option<u32>,
    /// Timeout to acquire a connection from the pool.
    pub acquire_timeout: Option<Duration>,
    /// Idle timeout before a connection is closed.
    pub idle_timeout: Option<Duration>,
    /// Test connection health before acquire.
    pub test_before_acquire: bool,
    /// SQLite busy timeout; ignored for in-memory databases.
    pub sqlite_busy_timeout: Option<Duration>,
    /// For SQLite file DSNs, create parent directories if missing.
    pub create_sqlite_dirs: bool,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: Some(10),
            min_conns: None,
            acquire_timeout: Some(Duration::from_secs(30)),
            idle_timeout: None,
            test_before_acquire: false,
            sqlite_busy_timeout: Some(Duration::from_millis(5000)),
            create_sqlite_dirs: true,
        }
    }
}

/// One concrete sqlx pool.
#[derive(Clone, Debug)]
pub enum DbPool {
    #[cfg(feature = "mysql")]
    MySql(MySqlPool),
    #[cfg(feature = "sqlite")]
    Sqlite(SqlitePool),
}

/// Main handle. Cheap to share behind an `Arc`; the pool is internally
/// synchronized.
#[derive(Debug)]
pub struct DbHandle {
    engine: DbEngine,
    pool: DbPool,
}

macro_rules! apply_pool_opts {
    ($o:ident, $opts:expr) => {{
        let mut o = $o;
        if let Some(n) = $opts.max_conns {
            o = o.max_connections(n);
        }
        if let Some(n) = $opts.min_conns {
            o = o.min_connections(n);
        }
        if let Some(t) = $opts.acquire_timeout {
            o = o.acquire_timeout(t);
        }
        if let Some(t) = $opts.idle_timeout {
            o = o.idle_timeout(t);
        }
        if $opts.test_before_acquire {
            o = o.test_before_acquire(true);
        }
        o
    }};
}

impl DbHandle {
    /// Detect engine by DSN scheme.
    pub fn detect(dsn: &str) -> Result<DbEngine> {
        let s = dsn.trim_start();
        if s.starts_with("mysql://") || s.starts_with("mariadb://") {
            Ok(DbEngine::MySql)
        } else if s.starts_with("sqlite:") {
            Ok(DbEngine::Sqlite)
        } else {
            Err(DbError::UnknownDsn(redact_credentials_in_dsn(Some(dsn))))
        }
    }

    /// Connect and build handle.
    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        let engine = Self::detect(dsn)?;
        tracing::debug!(
            dsn = %redact_credentials_in_dsn(Some(dsn)),
            ?engine,
            "Connecting database pool"
        );

        match engine {
            #[cfg(feature = "mysql")]
            DbEngine::MySql => {
                let o = MySqlPoolOptions::new();
                let o = apply_pool_opts!(o, opts);
                let dsn = dsn.trim().replacen("mariadb://", "mysql://", 1);
                let pool = o.connect(&dsn).await?;
                Ok(Self {
                    engine,
                    pool: DbPool::MySql(pool),
                })
            }
            #[cfg(feature = "sqlite")]
            DbEngine::Sqlite => {
                let dsn = prepare_sqlite_path(dsn.trim(), opts.create_sqlite_dirs)?;
                let in_memory = dsn.contains(":memory:") || dsn.contains("mode=memory");
                let busy_ms = opts
                    .sqlite_busy_timeout
                    .map(|t| i64::try_from(t.as_millis()).unwrap_or(i64::MAX));

                let o = SqlitePoolOptions::new();
                let o = apply_pool_opts!(o, opts);
                let o = o.after_connect(move |conn, _meta| {
                    Box::pin(async move {
                        if let (false, Some(ms)) = (in_memory, busy_ms) {
                            let stmt = format!("PRAGMA busy_timeout = {ms}");
                            sqlx::query(&stmt).execute(&mut *conn).await?;
                        }
                        Ok(())
                    })
                });

                let pool = o.connect(&dsn).await?;
                Ok(Self {
                    engine,
                    pool: DbPool::Sqlite(pool),
                })
            }
            #[cfg(not(feature = "mysql"))]
            DbEngine::MySql => Err(DbError::FeatureDisabled("MySQL feature not enabled")),
            #[cfg(not(feature = "sqlite"))]
            DbEngine::Sqlite => Err(DbError::FeatureDisabled("SQLite feature not enabled")),
        }
    }

    /// Graceful pool close. (Dropping the pool also closes it; this just makes it explicit.)
    pub async fn close(self) {
        match self.pool {
            #[cfg(feature = "mysql")]
            DbPool::MySql(p) => p.close().await,
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(p) => p.close().await,
        }
    }

    /// Get the backend.
    pub fn engine(&self) -> DbEngine {
        self.engine
    }

    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }

    // --- sqlx accessors ---
    #[cfg(feature = "sqlite")]
    pub fn sqlx_sqlite(&self) -> Option<&SqlitePool> {
        match self.pool {
            DbPool::Sqlite(ref p) => Some(p),
            #[cfg(feature = "mysql")]
            _ => None,
        }
    }
}

// ===================== helpers =====================

#[cfg(feature = "sqlite")]
fn prepare_sqlite_path(dsn: &str, create_dirs: bool) -> Result<String> {
    if !create_dirs || dsn.contains(":memory:") {
        return Ok(dsn.to_string());
    }

    // Handles "sqlite:/path" and "sqlite://path"; URI forms have no dir to create.
    let raw = dsn
        .strip_prefix("sqlite://")
        .or_else(|| dsn.strip_prefix("sqlite:"))
        .unwrap_or(dsn);
    let path = raw.split('?').next().unwrap_or(raw);

    if !path.starts_with("file:") {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    Ok(dsn.to_string())
}

/// Replace the password of a URL-style DSN with `***` for logging.
pub fn redact_credentials_in_dsn(dsn: Option<&str>) -> String {
    match dsn {
        Some(dsn) if dsn.contains('@') => {
            if let Ok(mut parsed) = url::Url::parse(dsn) {
                if parsed.password().is_some() {
                    let _ = parsed.set_password(Some("***"));
                }
                parsed.to_string()
            } else {
                "***".to_string()
            }
        }
        Some(dsn) => dsn.to_string(),
        None => "none".to_string(),
    }
}
