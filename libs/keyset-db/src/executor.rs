//! Page executor: statement in, typed rows and next-cursor row out.

use std::future::Future;
use std::time::Duration;

use keyset_core::{assemble, PageQuery, SortDir, Statement, Value};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::entity::{KeysetEntity, Record, SortColumn};
use crate::store::Store;
use crate::DbError;

#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Invalid(#[from] keyset_core::Error),

    #[error("query execution failed: {0}")]
    ExecutionFailed(#[source] DbError),

    #[error("query cancelled")]
    Cancelled,

    #[error("query timed out after {0:?}")]
    Timeout(Duration),
}

/// Per-call controls. Cancelling `cancel` or exceeding `timeout` drops the
/// in-flight store future.
#[derive(Clone, Debug, Default)]
pub struct ExecOptions {
    pub cancel: CancellationToken,
    pub timeout: Option<Duration>,
}

impl ExecOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Rows of one page in the requested order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeysetPage<E> {
    pub rows: Vec<E>,
    pub dir: SortDir,
    pub limit: u64,
}

impl<E> KeysetPage<E> {
    /// The row nearest the page boundary; `None` means no further pages.
    pub fn next_cursor_row(&self) -> Option<&E> {
        self.rows.last()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A short page means the store had nothing beyond it.
    pub fn is_full(&self) -> bool {
        u64::try_from(self.rows.len()).unwrap_or(u64::MAX) >= self.limit && self.limit > 0
    }
}

impl<E: KeysetEntity> KeysetPage<E> {
    pub fn next_cursor(&self, sort: &SortColumn<E::SortKey, E>) -> Option<Value> {
        self.next_cursor_row().map(sort.extract)
    }
}

async fn guarded<F>(fetch: F, opts: &ExecOptions) -> Result<Vec<Record>, PageError>
where
    F: Future<Output = Result<Vec<Record>, DbError>>,
{
    let bounded = async {
        match opts.timeout {
            Some(limit) => match tokio::time::timeout(limit, fetch).await {
                Ok(res) => res.map_err(PageError::ExecutionFailed),
                Err(_) => Err(PageError::Timeout(limit)),
            },
            None => fetch.await.map_err(PageError::ExecutionFailed),
        }
    };

    tokio::select! {
        biased;
        _ = opts.cancel.cancelled() => Err(PageError::Cancelled),
        res = bounded => res,
    }
}

/// Run an assembled statement and materialize `E` rows.
///
/// Either the whole page is returned or an error; rows scanned before a
/// failure are dropped.
#[instrument(name = "keyset.execute", skip_all, fields(table = E::TABLE, limit = stmt.limit))]
pub async fn execute<E, S>(
    store: &S,
    stmt: &Statement,
    opts: &ExecOptions,
) -> Result<KeysetPage<E>, PageError>
where
    E: KeysetEntity,
    S: Store + ?Sized,
{
    if opts.cancel.is_cancelled() {
        return Err(PageError::Cancelled);
    }

    let records = guarded(store.fetch(stmt, E::columns()), opts)
        .await
        .inspect_err(|e| warn!(error = %e, "page query failed"))?;

    let mut rows = records
        .iter()
        .map(E::from_record)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| PageError::ExecutionFailed(e.into()))?;
    rows.truncate(usize::try_from(stmt.limit).unwrap_or(usize::MAX));

    debug!(rows = rows.len(), "page fetched");
    Ok(KeysetPage {
        rows,
        dir: stmt.dir,
        limit: stmt.limit,
    })
}

/// Assemble and execute one page of `E`.
///
/// Validation errors are returned before the store is touched.
pub async fn fetch_page<E, S>(
    store: &S,
    query: &PageQuery,
    opts: &ExecOptions,
) -> Result<KeysetPage<E>, PageError>
where
    E: KeysetEntity,
    S: Store + ?Sized,
{
    let stmt = assemble(E::TABLE, query)?;
    debug!(
        sql = %stmt.sql,
        args = ?stmt.redacted_args(),
        "assembled keyset statement"
    );
    execute(store, &stmt, opts).await
}
