use catalog_sync_models::{ItemRef, ListedItem, ViewKey, VirtualListEntry, VirtualListItem};
use catalog_sync_sources::CatalogProvider;
use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::clock::Clock;
use crate::enrichment::{merge, EnrichmentService, OwnedFields, PartialRecord};
use crate::error::VirtualListError;
use crate::store::{CatalogStore, Transaction};

const ENRICH_CONCURRENCY: usize = 4;

/// Where a virtual list's membership comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    UserList {
        owner: String,
        slug: String,
    },
    /// Recognized but not fetchable; the reason is logged.
    Unsupported(String),
}

impl DataSource {
    pub fn parse(data_url: &str) -> Self {
        let url = match Url::parse(data_url.trim()) {
            Ok(url) => url,
            Err(e) => return DataSource::Unsupported(format!("invalid URL: {}", e)),
        };
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            ["sync", feed @ ("collection" | "watchlist"), kind @ ("movies" | "shows"), ..] => {
                DataSource::Unsupported(format!("personal {} of {} is not supported", feed, kind))
            }
            ["users", owner, "lists", slug, ..]
                if url
                    .host_str()
                    .map_or(false, |h| h == "trakt.tv" || h.ends_with(".trakt.tv")) =>
            {
                DataSource::UserList {
                    owner: owner.to_string(),
                    slug: slug.to_string(),
                }
            }
            _ => DataSource::Unsupported("unrecognized data URL".to_string()),
        }
    }
}

/// Everything needed to (re)build a view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRequest {
    pub key: ViewKey,
    pub data_url: String,
    pub item_name: Option<String>,
    pub background_url: Option<String>,
}

impl ViewRequest {
    pub fn new(key: ViewKey, data_url: impl Into<String>) -> Self {
        Self {
            key,
            data_url: data_url.into(),
            item_name: None,
            background_url: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.item_name = Some(name.into());
        self
    }

    pub fn with_background(mut self, url: impl Into<String>) -> Self {
        self.background_url = Some(url.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub expired: usize,
    pub orphans: usize,
}

/// Time-boxed cache of externally defined list views.
///
/// Entries hold references into the catalog store, not records. An entry is
/// valid while `now - last_updated < ttl`.
pub struct VirtualListCache {
    catalog: Arc<dyn CatalogProvider>,
    enrichment: Arc<EnrichmentService>,
    store: Arc<CatalogStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    page_size: u32,
}

impl VirtualListCache {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        enrichment: Arc<EnrichmentService>,
        store: Arc<CatalogStore>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        page_size: u32,
    ) -> Self {
        Self {
            catalog,
            enrichment,
            store,
            clock,
            ttl,
            page_size: page_size.max(1),
        }
    }

    /// Cached references while the entry is valid, otherwise a fresh page 1.
    #[instrument(skip(self, request), fields(view = %request.key))]
    pub async fn get(&self, request: &ViewRequest) -> Result<Vec<ItemRef>, VirtualListError> {
        let now = self.clock.now();
        if let Some(entry) = self.store.view(&request.key).await {
            if entry.is_fresh(now, self.ttl) {
                debug!("Virtual list cache hit");
                return Ok(refs(&self.store.view_items(&request.key).await));
            }
            debug!(last_updated = %entry.last_updated, "Virtual list entry expired");
        }

        let page = self.fetch_page(request, 1).await?;
        if page.is_empty() {
            // Nothing to cache; the next get tries again
            return Ok(Vec::new());
        }

        let references = self.store_page(request, page, 1, now, Replace::Yes).await;
        info!(items = references.len(), "Cached virtual list");
        Ok(references)
    }

    /// Fetch the page after what is cached and append it.
    ///
    /// The page number comes from how many upstream items the entry has
    /// consumed, not a stored cursor. Items skipped on an earlier page still
    /// count, so a partly stored page is never fetched twice.
    /// Returns the references appended by this call.
    #[instrument(skip(self, request), fields(view = %request.key))]
    pub async fn load_more(&self, request: &ViewRequest) -> Result<Vec<ItemRef>, VirtualListError> {
        let cached = self.store.view_items(&request.key).await.len() as u32;
        let consumed = self
            .store
            .view(&request.key)
            .await
            .map_or(cached, |entry| entry.fetched_items.max(cached));
        let next_page = consumed / self.page_size + 1;
        debug!(cached, consumed, next_page, "Loading more");

        let page = self.fetch_page(request, next_page).await?;
        if page.is_empty() {
            debug!("No further items");
            return Ok(Vec::new());
        }

        let now = self.clock.now();
        Ok(self
            .store_page(request, page, next_page, now, Replace::No)
            .await)
    }

    /// Drop an entry and its references.
    pub async fn invalidate(&self, key: &ViewKey) -> bool {
        let key = key.clone();
        self.store
            .transaction(|tx| Ok::<_, Infallible>(tx.delete_view(&key)))
            .await
            .unwrap_or_else(|never| match never {})
    }

    /// Delete expired entries and reference sets that have no entry.
    pub async fn sweep_expired(&self) -> SweepReport {
        let now = self.clock.now();
        let ttl = self.ttl;
        let report = self
            .store
            .transaction(|tx| {
                let (entries, orphans) = tx.view_keys();
                let mut report = SweepReport::default();
                for key in entries {
                    let expired = tx.view(&key).map_or(false, |e| !e.is_fresh(now, ttl));
                    if expired {
                        tx.delete_view(&key);
                        report.expired += 1;
                    }
                }
                for key in orphans {
                    tx.delete_view(&key);
                    report.orphans += 1;
                }
                Ok::<_, Infallible>(report)
            })
            .await
            .unwrap_or_else(|never| match never {});
        info!(
            expired = report.expired,
            orphans = report.orphans,
            "Swept virtual list cache"
        );
        report
    }

    async fn fetch_page(
        &self,
        request: &ViewRequest,
        page: u32,
    ) -> Result<Vec<ListedItem>, VirtualListError> {
        match DataSource::parse(&request.data_url) {
            DataSource::UserList { owner, slug } => self
                .catalog
                .user_list_items(&owner, &slug, page, self.page_size)
                .await
                .map_err(|source| VirtualListError::Upstream {
                    view: request.key.to_string(),
                    source,
                }),
            DataSource::Unsupported(reason) => {
                warn!(data_url = %request.data_url, reason, "Unsupported virtual list data URL");
                Ok(Vec::new())
            }
        }
    }

    /// Enrich records the store does not have yet, then write records, entry
    /// and references in one transaction.
    async fn store_page(
        &self,
        request: &ViewRequest,
        page: Vec<ListedItem>,
        page_number: u32,
        now: DateTime<Utc>,
        replace: Replace,
    ) -> Vec<ItemRef> {
        let page_len = page.len() as u32;
        let mut candidates = Vec::with_capacity(page.len());
        let mut missing = Vec::new();
        for item in &page {
            let Some(tmdb_id) = item.ids.tmdb else {
                warn!(title = %item.title, "Skipping list item without enrichment-provider ID");
                continue;
            };
            let reference = ItemRef {
                kind: item.kind,
                tmdb_id,
            };
            if self.store.get(item.kind, tmdb_id).await.is_none() {
                missing.push(item);
            }
            candidates.push(reference);
        }

        let enrichment = &self.enrichment;
        let fetched: Vec<PartialRecord> = stream::iter(missing)
            .map(|item| async move {
                enrichment
                    .fetch_with_artwork(item)
                    .await
                    .map_err(
                        |e| warn!(title = %item.title, error = %e, "Failed to enrich list item"),
                    )
                    .ok()
            })
            .buffered(ENRICH_CONCURRENCY)
            .filter_map(|record| async move { record })
            .collect()
            .await;

        let key = request.key.clone();
        self.store
            .transaction(|tx| {
                for record in &fetched {
                    let item = merge(
                        tx.item(record.kind, record.tmdb_id),
                        record,
                        OwnedFields::DETAILS.union(OwnedFields::ARTWORK),
                    );
                    tx.put_item(item);
                }

                let mut seen: HashSet<ItemRef> = match replace {
                    Replace::Yes => HashSet::new(),
                    Replace::No => tx.view_items(&key).iter().map(|i| i.item).collect(),
                };
                let start = match replace {
                    Replace::Yes => 0,
                    Replace::No => tx.view_items(&key).len() as u32,
                };
                let fetched_items = match replace {
                    Replace::Yes => page_len,
                    Replace::No => tx.view(&key).map_or(0, |e| e.fetched_items) + page_len,
                };
                let items: Vec<VirtualListItem> = candidates
                    .into_iter()
                    .filter(|r| tx.item(r.kind, r.tmdb_id).is_some())
                    .filter(|r| seen.insert(*r))
                    .enumerate()
                    .map(|(i, item)| VirtualListItem {
                        item,
                        order_index: start + i as u32,
                        added_at: now,
                    })
                    .collect();
                let appended = refs(&items);

                match replace {
                    Replace::Yes => tx.replace_view_items(&key, items),
                    Replace::No => tx.append_view_items(&key, items),
                }
                let entry =
                    next_entry(tx, request, page_number, fetched_items, now, self.page_size);
                tx.put_view(entry);
                Ok::<_, Infallible>(appended)
            })
            .await
            .unwrap_or_else(|never| match never {})
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replace {
    Yes,
    No,
}

fn refs(items: &[VirtualListItem]) -> Vec<ItemRef> {
    items.iter().map(|i| i.item).collect()
}

fn next_entry(
    tx: &Transaction<'_>,
    request: &ViewRequest,
    page: u32,
    fetched_items: u32,
    now: DateTime<Utc>,
    page_size: u32,
) -> VirtualListEntry {
    let previous = tx.view(&request.key);
    VirtualListEntry {
        key: request.key.clone(),
        item_name: request
            .item_name
            .clone()
            .or_else(|| previous.and_then(|p| p.item_name.clone())),
        background_url: request
            .background_url
            .clone()
            .or_else(|| previous.and_then(|p| p.background_url.clone())),
        data_url: request.data_url.clone(),
        last_updated: now,
        total_items: tx.view_items(&request.key).len() as u32,
        fetched_items,
        page,
        page_size,
    }
}
