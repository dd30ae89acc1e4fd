use catalog_sync_models::{CatalogItem, MediaKind, RatingsRecord};
use catalog_sync_sources::CatalogProvider;
use chrono::Duration;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::clock::Clock;
use crate::enrichment::{merge, OwnedFields, PartialRecord};
use crate::error::RatingsError;
use crate::store::CatalogStore;

/// Aggregate ratings from the catalog provider, cached per item with their own TTL.
pub struct RatingsCache {
    catalog: Arc<dyn CatalogProvider>,
    store: Arc<CatalogStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl RatingsCache {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        store: Arc<CatalogStore>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            catalog,
            store,
            clock,
            ttl,
        }
    }

    /// Cached record if younger than the TTL, otherwise a live fetch.
    ///
    /// A failed refetch falls back to the stale record when there is one.
    #[instrument(skip(self), fields(operation = "ratings"))]
    pub async fn ratings(
        &self,
        kind: MediaKind,
        trakt_id: u64,
    ) -> Result<RatingsRecord, RatingsError> {
        let now = self.clock.now();
        let cached = self.store.ratings(kind, trakt_id).await;
        if let Some(record) = &cached {
            if record.is_fresh(now, self.ttl) {
                debug!("Ratings cache hit");
                return Ok(record.clone());
            }
        }

        match self.catalog.ratings(kind, trakt_id).await {
            Ok(aggregate) => {
                let record = RatingsRecord {
                    kind,
                    trakt_id,
                    rating: aggregate.rating,
                    votes: aggregate.votes,
                    fetched_at: now,
                };
                let stored = record.clone();
                self.store
                    .transaction(|tx| {
                        tx.put_ratings(stored);
                        Ok::<_, Infallible>(())
                    })
                    .await
                    .unwrap_or_else(|never| match never {});
                debug!(
                    rating = record.rating,
                    votes = record.votes,
                    "Ratings refetched"
                );
                Ok(record)
            }
            Err(e) => match cached {
                Some(stale) => {
                    warn!(error = %e, "Ratings refetch failed, serving stale record");
                    Ok(stale)
                }
                None => Err(e.into()),
            },
        }
    }

    /// Ratings pass: write the catalog provider's rating onto a stored record.
    pub async fn apply_to_item(
        &self,
        kind: MediaKind,
        tmdb_id: u64,
    ) -> Result<CatalogItem, RatingsError> {
        let item = self
            .store
            .get(kind, tmdb_id)
            .await
            .ok_or_else(|| RatingsError::UnknownItem(format!("{} {}", kind, tmdb_id)))?;
        let trakt_id = item
            .trakt_id
            .ok_or_else(|| RatingsError::MissingCatalogId(item.title.clone()))?;
        let record = self.ratings(kind, trakt_id).await?;

        let mut fresh = PartialRecord::new(kind, tmdb_id, record.fetched_at);
        fresh.catalog_rating = Some(record.rating);
        fresh.catalog_votes = Some(record.votes);

        let updated = self
            .store
            .transaction(|tx| {
                let current = tx.item(kind, tmdb_id).cloned().unwrap_or(item);
                let merged = merge(Some(&current), &fresh, OwnedFields::RATINGS);
                tx.put_item(merged.clone());
                Ok::<_, Infallible>(merged)
            })
            .await
            .unwrap_or_else(|never| match never {});
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::test_support::{catalog_item, FakeCatalog};
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::Ordering;

    fn setup() -> (
        Arc<FakeCatalog>,
        Arc<CatalogStore>,
        Arc<ManualClock>,
        RatingsCache,
    ) {
        let catalog = Arc::new(FakeCatalog::default());
        let store = Arc::new(CatalogStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        ));
        let cache = RatingsCache::new(
            catalog.clone(),
            store.clone(),
            clock.clone(),
            Duration::days(7),
        );
        (catalog, store, clock, cache)
    }

    #[tokio::test]
    async fn test_fresh_record_makes_no_call() {
        let (catalog, _store, clock, cache) = setup();
        catalog.set_ratings(MediaKind::Movie, 10, 8.2, 500);
        cache.ratings(MediaKind::Movie, 10).await.unwrap();

        clock.advance(Duration::days(6));
        catalog.set_ratings(MediaKind::Movie, 10, 1.0, 1);
        let record = cache.ratings(MediaKind::Movie, 10).await.unwrap();

        assert_eq!(record.rating, 8.2);
        assert_eq!(catalog.rating_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_record_is_refetched() {
        let (catalog, store, clock, cache) = setup();
        catalog.set_ratings(MediaKind::Movie, 10, 8.2, 500);
        cache.ratings(MediaKind::Movie, 10).await.unwrap();

        clock.advance(Duration::days(8));
        catalog.set_ratings(MediaKind::Movie, 10, 7.0, 900);
        let record = cache.ratings(MediaKind::Movie, 10).await.unwrap();

        assert_eq!(record.votes, 900);
        assert_eq!(record.fetched_at, clock.now());
        assert_eq!(catalog.rating_calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.ratings(MediaKind::Movie, 10).await, Some(record));
    }

    #[tokio::test]
    async fn test_failed_refetch_serves_stale_record() {
        let (catalog, _store, clock, cache) = setup();
        catalog.set_ratings(MediaKind::Show, 3, 9.0, 40);
        cache.ratings(MediaKind::Show, 3).await.unwrap();

        clock.advance(Duration::days(30));
        catalog.fail("ratings");

        assert_eq!(cache.ratings(MediaKind::Show, 3).await.unwrap().rating, 9.0);
        assert!(matches!(
            cache.ratings(MediaKind::Show, 4).await,
            Err(RatingsError::Upstream(_))
        ));
    }

    #[tokio::test]
    async fn test_apply_to_item_only_touches_rating_fields() {
        let (catalog, store, _clock, cache) = setup();
        let mut item = catalog_item(MediaKind::Movie, 5, "Heat");
        item.orders.set("popular", 2);
        item.logo_url = Some("logo".to_string());
        store.upsert(item.clone()).await;
        catalog.set_ratings(MediaKind::Movie, 1005, 8.3, 12000);

        let updated = cache.apply_to_item(MediaKind::Movie, 5).await.unwrap();

        assert_eq!(updated.catalog_rating, Some(8.3));
        assert_eq!(updated.catalog_votes, Some(12000));
        assert_eq!(updated.order_in("popular"), Some(2));
        assert_eq!(updated.logo_url, item.logo_url);
        assert_eq!(updated.last_enriched, item.last_enriched);
        assert_eq!(store.get(MediaKind::Movie, 5).await, Some(updated));
    }

    #[tokio::test]
    async fn test_apply_to_unknown_item() {
        let (_catalog, _store, _clock, cache) = setup();
        assert!(matches!(
            cache.apply_to_item(MediaKind::Movie, 5).await,
            Err(RatingsError::UnknownItem(_))
        ));
    }
}
