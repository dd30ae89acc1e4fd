use catalog_sync_config::{ListEndpoint, ListSource, SourceRegistry, SyncOptions};
use catalog_sync_models::{CatalogItem, ListedItem, MediaKind};
use catalog_sync_sources::{CatalogProvider, SourceError};
use chrono::Duration;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::clock::Clock;
use crate::enrichment::{merge, EnrichmentService, OwnedFields, PartialRecord};
use crate::error::{EnrichmentError, SyncError};
use crate::store::CatalogStore;

/// Outcome of one page sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub list_id: String,
    pub page: u32,
    /// Items returned by the catalog provider.
    pub fetched: usize,
    /// Records inserted, merged, or re-ranked.
    pub written: usize,
    /// Of `written`, records that only had their rank updated.
    pub reranked: usize,
    pub skipped: usize,
}

impl SyncReport {
    fn new(list_id: &str, page: u32) -> Self {
        Self {
            list_id: list_id.to_string(),
            page,
            fetched: 0,
            written: 0,
            reranked: 0,
            skipped: 0,
        }
    }

    /// The provider returned an empty page: there is nothing further to fetch.
    pub fn is_exhausted(&self) -> bool {
        self.fetched == 0
    }
}

enum Planned<'a> {
    Rerank { tmdb_id: u64, order: u32 },
    Enrich { item: &'a ListedItem, order: u32 },
}

/// Drives logical lists from the catalog provider into the store.
pub struct SyncOrchestrator {
    registry: Arc<SourceRegistry>,
    catalog: Arc<dyn CatalogProvider>,
    enrichment: Arc<EnrichmentService>,
    store: Arc<CatalogStore>,
    clock: Arc<dyn Clock>,
    options: SyncOptions,
}

impl SyncOrchestrator {
    pub fn new(
        registry: Arc<SourceRegistry>,
        catalog: Arc<dyn CatalogProvider>,
        enrichment: Arc<EnrichmentService>,
        store: Arc<CatalogStore>,
        clock: Arc<dyn Clock>,
        options: SyncOptions,
    ) -> Self {
        Self {
            registry,
            catalog,
            enrichment,
            store,
            clock,
            options,
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    async fn fetch(&self, source: &ListSource, page: u32) -> Result<Vec<ListedItem>, SourceError> {
        let limit = self.options.page_size;
        match &source.endpoint {
            ListEndpoint::Trending => self.catalog.trending(source.kind, page, limit).await,
            ListEndpoint::Popular => self.catalog.popular(source.kind, page, limit).await,
            ListEndpoint::UserList { owner, slug } => {
                self.catalog.user_list_items(owner, slug, page, limit).await
            }
        }
    }

    /// Fetch one page of `list_id`, enrich what needs it and write the page in one transaction.
    ///
    /// Page 1 replaces the list's ranking: every record of the list's kind loses
    /// this list's ordering field before the new ranks are written.
    #[instrument(skip(self), fields(operation = "sync_page"))]
    pub async fn sync_page(&self, list_id: &str, page: u32) -> Result<SyncReport, SyncError> {
        // Ranks for the whole page must fit in u32
        let base_order = page
            .checked_sub(1)
            .and_then(|previous| previous.checked_mul(self.options.page_size))
            .filter(|base| base.checked_add(self.options.page_size).is_some())
            .ok_or(SyncError::InvalidPage(page))?;
        let source = self.registry.resolve(list_id)?;
        if !source.endpoint.is_paginated() && page > 1 {
            return Err(SyncError::PaginationUnsupported {
                list_id: list_id.to_string(),
                page,
            });
        }

        let items = self
            .fetch(source, page)
            .await
            .map_err(|e| SyncError::Upstream {
                list_id: list_id.to_string(),
                source: e,
            })?;

        let mut report = SyncReport::new(list_id, page);
        report.fetched = items.len();
        let kind = source.kind;
        let now = self.clock.now();
        let details_ttl = Duration::days(self.options.details_ttl_days);

        let mut plan = Vec::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            let order = base_order.saturating_add(position as u32);
            if item.kind != kind {
                warn!(title = %item.title, expected = %kind, actual = %item.kind, "Skipping item of the wrong media kind");
                report.skipped += 1;
                continue;
            }
            let fresh_record = match item.ids.tmdb {
                Some(tmdb_id) => self
                    .store
                    .get(kind, tmdb_id)
                    .await
                    .filter(|existing| now - existing.last_enriched < details_ttl)
                    .map(|_| tmdb_id),
                None => None,
            };
            plan.push(match fresh_record {
                Some(tmdb_id) => Planned::Rerank { tmdb_id, order },
                None => Planned::Enrich { item, order },
            });
        }

        let enrichment = &self.enrichment;
        let to_enrich: Vec<(&ListedItem, u32)> = plan
            .iter()
            .filter_map(|p| match p {
                Planned::Enrich { item, order } => Some((*item, *order)),
                Planned::Rerank { .. } => None,
            })
            .collect();
        let lookups: Vec<_> = to_enrich
            .into_iter()
            .map(|(item, order)| async move { (order, enrichment.fetch(item).await) })
            .collect();
        let enriched: Vec<(u32, Result<PartialRecord, EnrichmentError>)> = stream::iter(lookups)
            .buffered(self.options.enrich_concurrency.max(1))
            .collect()
            .await;

        let mut records = Vec::with_capacity(enriched.len());
        for (order, result) in enriched {
            match result {
                Ok(record) => records.push(record.with_list_order(&source.cache_key, order)),
                Err(e) => {
                    warn!(order, error = %e, "Skipping item that could not be enriched");
                    report.skipped += 1;
                }
            }
        }
        let reranks: Vec<(u64, u32)> = plan
            .iter()
            .filter_map(|p| match p {
                Planned::Rerank { tmdb_id, order } => Some((*tmdb_id, *order)),
                Planned::Enrich { .. } => None,
            })
            .collect();

        let cache_key = source.cache_key.as_str();
        let (merged, reranked, missing) = self
            .store
            .transaction(|tx| {
                if page == 1 {
                    let cleared = tx.clear_list(kind, cache_key);
                    debug!(cleared, cache_key, "Cleared previous ranking");
                }
                let mut merged = 0;
                for record in &records {
                    // Merge against the record as it is now, not as it was before enrichment
                    let item = merge(
                        tx.item(kind, record.tmdb_id),
                        record,
                        OwnedFields::DETAILS.with_list_order(),
                    );
                    tx.put_item(item);
                    merged += 1;
                }
                let mut reranked = 0;
                let mut missing = 0;
                for (tmdb_id, order) in &reranks {
                    if tx.set_order(kind, *tmdb_id, cache_key, *order) {
                        reranked += 1;
                    } else {
                        missing += 1;
                    }
                }
                Ok::<_, Infallible>((merged, reranked, missing))
            })
            .await
            .unwrap_or_else(|never| match never {});

        report.written = merged + reranked;
        report.reranked = reranked;
        report.skipped += missing;

        info!(
            fetched = report.fetched,
            written = report.written,
            reranked = report.reranked,
            skipped = report.skipped,
            "Synced page"
        );
        Ok(report)
    }

    /// Pull-to-refresh: re-sync page 1, replacing the list's ranking.
    pub async fn refresh_list(&self, list_id: &str) -> Result<SyncReport, SyncError> {
        self.sync_page(list_id, 1).await
    }

    /// Refresh every enabled list concurrently.
    pub async fn refresh_all(&self) -> Vec<(String, Result<SyncReport, SyncError>)> {
        let ids: Vec<String> = self
            .registry
            .enabled()
            .iter()
            .map(|l| l.id.clone())
            .collect();
        let results = join_all(ids.iter().map(|id| self.refresh_list(id))).await;
        ids.into_iter().zip(results).collect()
    }

    /// Artwork pass for one stored record. Returns `None` if there is no such record.
    #[instrument(skip(self), fields(operation = "refresh_artwork"))]
    pub async fn refresh_artwork(
        &self,
        kind: MediaKind,
        tmdb_id: u64,
    ) -> Result<Option<CatalogItem>, EnrichmentError> {
        let logo_url = self.enrichment.artwork(kind, tmdb_id).await?;
        let mut fresh = PartialRecord::new(kind, tmdb_id, self.clock.now());
        fresh.logo_url = logo_url;
        Ok(self.apply_pass(fresh, OwnedFields::ARTWORK).await)
    }

    /// Similar pass for one stored record. Returns `None` if there is no such record.
    #[instrument(skip(self), fields(operation = "refresh_similar"))]
    pub async fn refresh_similar(
        &self,
        kind: MediaKind,
        tmdb_id: u64,
    ) -> Result<Option<CatalogItem>, EnrichmentError> {
        let similar = self.enrichment.similar(kind, tmdb_id).await?;
        let mut fresh = PartialRecord::new(kind, tmdb_id, self.clock.now());
        fresh.similar = similar;
        Ok(self.apply_pass(fresh, OwnedFields::SIMILAR).await)
    }

    async fn apply_pass(&self, fresh: PartialRecord, owned: OwnedFields) -> Option<CatalogItem> {
        self.store
            .transaction(|tx| {
                let merged = tx
                    .item(fresh.kind, fresh.tmdb_id)
                    .map(|existing| merge(Some(existing), &fresh, owned));
                if let Some(item) = &merged {
                    tx.put_item(item.clone());
                }
                Ok::<_, Infallible>(merged)
            })
            .await
            .unwrap_or_else(|never| match never {})
    }
}

#[cfg(test)]
mod tests;
