use std::marker::PhantomData;
use std::sync::Arc;

use keyset_core::cursor::{encode_value, parse_value};
use keyset_core::{Error, Page, PageInfo, PageQuery, SortDir};
use keyset_db::{fetch_page, ExecOptions, KeysetEntity, Store};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::config::ListingsConfig;
use crate::contract::error::ListingError;
use crate::contract::model::{ListRequest, ListResponse};
use crate::domain::filters::filter_set;

/// Keyset listing over one entity table.
/// Depends only on the store seam; the handle is injected at construction.
pub struct ListingService<E> {
    store: Arc<dyn Store>,
    config: ListingsConfig,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for ListingService<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: KeysetEntity> ListingService<E> {
    pub fn new(store: Arc<dyn Store>, config: ListingsConfig) -> Self {
        Self {
            store,
            config,
            _entity: PhantomData,
        }
    }

    pub fn config(&self) -> &ListingsConfig {
        &self.config
    }

    /// Fetch one page.
    ///
    /// Direction, cursor and filters are all validated before the store is
    /// called. The next page key is set only when the page came back
    /// full, and is read from the requested sort key's column.
    #[instrument(
        name = "listings.service.list",
        skip(self, req, cancel),
        fields(table = E::TABLE, sort = %req.sort, order = %req.order)
    )]
    pub async fn list(
        &self,
        req: &ListRequest<E::SortKey>,
        cancel: CancellationToken,
    ) -> Result<ListResponse<E>, ListingError> {
        req.order.parse::<SortDir>()?;

        let sort = E::sort_column(req.sort)
            .ok_or_else(|| Error::InvalidColumn(req.sort.to_string()))?;
        let cursor = parse_value(sort.column.kind, &req.cursor)?;
        let filters = filter_set::<E>(&req.filters)?;
        let limit = self.config.clamp_limit(req.limit);

        let query = PageQuery {
            column: sort.column.name.to_string(),
            cursor,
            direction: req.order.clone(),
            limit,
            filters,
        };
        let opts = ExecOptions {
            cancel,
            timeout: self.config.query_timeout,
        };

        let page = fetch_page::<E, dyn Store>(self.store.as_ref(), &query, &opts)
            .await
            .inspect_err(|e| warn!(error = %e, "listing failed"))?;

        let next_cursor = if page.is_full() {
            page.next_cursor(sort).map(|v| encode_value(&v))
        } else {
            None
        };
        debug!(rows = page.len(), has_next = next_cursor.is_some(), "listed page");

        Ok(Page::new(page.rows, PageInfo { next_cursor, limit }))
    }
}
