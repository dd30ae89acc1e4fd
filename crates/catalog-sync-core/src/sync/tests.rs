use super::*;
use crate::clock::ManualClock;
use crate::enrichment::ImageUrls;
use crate::test_support::{listed, FakeCatalog, FakeEnrichment};
use catalog_sync_config::RegistryError;
use catalog_sync_models::ProviderIds;
use chrono::{TimeZone, Utc};
use std::sync::atomic::Ordering;

const COMMUNITY: &str = "garycrawfordgc/top-movies-of-the-week";

struct Harness {
    catalog: Arc<FakeCatalog>,
    provider: Arc<FakeEnrichment>,
    store: Arc<CatalogStore>,
    clock: Arc<ManualClock>,
    sync: SyncOrchestrator,
}

fn harness(page_size: u32) -> Harness {
    let catalog = Arc::new(FakeCatalog::default());
    let provider = Arc::new(FakeEnrichment::default());
    let store = Arc::new(CatalogStore::new());
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
    ));
    let enrichment = Arc::new(EnrichmentService::new(
        provider.clone(),
        store.clone(),
        clock.clone(),
        ImageUrls::new("https://img"),
        std::time::Duration::from_secs(1),
    ));
    let sync = SyncOrchestrator::new(
        Arc::new(SourceRegistry::builtin()),
        catalog.clone(),
        enrichment,
        store.clone(),
        clock.clone(),
        SyncOptions {
            page_size,
            ..Default::default()
        },
    );
    Harness {
        catalog,
        provider,
        store,
        clock,
        sync,
    }
}

fn movies(ids: &[u64]) -> Vec<ListedItem> {
    ids.iter().map(|id| listed(MediaKind::Movie, *id)).collect()
}

async fn order(h: &Harness, tmdb_id: u64, cache_key: &str) -> Option<u32> {
    h.store
        .get(MediaKind::Movie, tmdb_id)
        .await
        .and_then(|item| item.order_in(cache_key))
}

#[tokio::test]
async fn test_lists_keep_independent_orderings() {
    let h = harness(50);
    h.catalog
        .set_page("trending", MediaKind::Movie, 1, movies(&[1, 2]));
    h.catalog
        .set_page("popular", MediaKind::Movie, 1, movies(&[1, 2]));

    let trending = h.sync.sync_page("trending_movies", 1).await.unwrap();
    let popular = h.sync.sync_page("popular_movies", 1).await.unwrap();

    assert_eq!(trending.written, 2);
    assert_eq!(popular.written, 2);
    // Second list found both records freshly enriched
    assert_eq!(popular.reranked, 2);
    assert_eq!(h.provider.detail_calls.load(Ordering::SeqCst), 2);
    for (id, rank) in [(1, 0), (2, 1)] {
        assert_eq!(order(&h, id, "trending").await, Some(rank));
        assert_eq!(order(&h, id, "popular").await, Some(rank));
    }

    h.catalog
        .set_page("trending", MediaKind::Movie, 1, movies(&[1]));
    h.sync.refresh_list("trending_movies").await.unwrap();

    assert_eq!(order(&h, 1, "trending").await, Some(0));
    assert_eq!(order(&h, 2, "trending").await, None);
    assert_eq!(order(&h, 2, "popular").await, Some(1));
    assert_eq!(h.store.count(MediaKind::Movie).await, 2);
}

#[tokio::test]
async fn test_later_pages_offset_orders_and_keep_earlier_pages() {
    let h = harness(2);
    h.catalog
        .set_page("trending", MediaKind::Movie, 1, movies(&[1, 2]));
    h.catalog
        .set_page("trending", MediaKind::Movie, 2, movies(&[3, 4]));

    h.sync.sync_page("trending_movies", 1).await.unwrap();
    let report = h.sync.sync_page("trending_movies", 2).await.unwrap();

    assert_eq!(report.written, 2);
    let ranked: Vec<(u64, Option<u32>)> = h
        .store
        .ordered(MediaKind::Movie, "trending")
        .await
        .iter()
        .map(|item| (item.tmdb_id, item.order_in("trending")))
        .collect();
    assert_eq!(
        ranked,
        vec![(1, Some(0)), (2, Some(1)), (3, Some(2)), (4, Some(3))]
    );
}

#[tokio::test]
async fn test_empty_page_is_exhausted_not_an_error() {
    let h = harness(2);
    h.catalog
        .set_page("trending", MediaKind::Movie, 1, movies(&[1, 2]));
    h.sync.sync_page("trending_movies", 1).await.unwrap();

    let report = h.sync.sync_page("trending_movies", 2).await.unwrap();

    assert!(report.is_exhausted());
    assert_eq!(report.written, 0);
    assert_eq!(h.store.count_in_list(MediaKind::Movie, "trending").await, 2);
}

#[tokio::test]
async fn test_upstream_failure_is_typed_and_leaves_store_alone() {
    let h = harness(50);
    h.catalog
        .set_page("trending", MediaKind::Movie, 1, movies(&[1, 2]));
    h.sync.sync_page("trending_movies", 1).await.unwrap();
    h.store.mark_clean();

    h.catalog.fail("trending");
    let err = h.sync.refresh_list("trending_movies").await.unwrap_err();

    assert!(matches!(err, SyncError::Upstream { ref list_id, .. } if list_id == "trending_movies"));
    assert_eq!(h.store.count_in_list(MediaKind::Movie, "trending").await, 2);
    assert!(!h.store.is_dirty());
}

#[tokio::test]
async fn test_structural_errors() {
    let h = harness(50);

    assert!(matches!(
        h.sync.sync_page("top_movies_week", 2).await,
        Err(SyncError::PaginationUnsupported { page: 2, .. })
    ));
    assert!(matches!(
        h.sync.sync_page("trending_movies", 0).await,
        Err(SyncError::InvalidPage(0))
    ));
    assert!(matches!(
        h.sync.sync_page("trending_movies", 90_000_000).await,
        Err(SyncError::InvalidPage(90_000_000))
    ));
    assert!(matches!(
        h.sync.sync_page("trending_movies", u32::MAX).await,
        Err(SyncError::InvalidPage(u32::MAX))
    ));
    assert!(matches!(
        h.sync.sync_page("nope", 1).await,
        Err(SyncError::UnknownList(RegistryError::NotFound(_)))
    ));
    assert_eq!(h.catalog.list_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unusable_items_are_skipped_not_fatal() {
    let h = harness(50);
    let no_cross_reference = ListedItem::new(
        MediaKind::Movie,
        "Obscure",
        ProviderIds::new().with_trakt(77),
    );
    h.catalog.set_page(
        "popular",
        MediaKind::Movie,
        1,
        vec![
            listed(MediaKind::Movie, 1),
            no_cross_reference,
            listed(MediaKind::Movie, 3),
        ],
    );
    h.provider.fail_id(3);

    let report = h.sync.sync_page("popular_movies", 1).await.unwrap();

    assert_eq!(report.fetched, 3);
    assert_eq!(report.written, 1);
    assert_eq!(report.skipped, 2);
    assert!(!report.is_exhausted());
    assert_eq!(order(&h, 1, "popular").await, Some(0));
}

#[tokio::test]
async fn test_community_list_skips_other_kind() {
    let h = harness(50);
    h.catalog
        .set_page(COMMUNITY, MediaKind::Movie, 1, movies(&[1]));
    h.catalog.set_page(
        COMMUNITY,
        MediaKind::Show,
        1,
        vec![listed(MediaKind::Show, 5)],
    );

    let report = h.sync.sync_page("top_movies_week", 1).await.unwrap();

    assert_eq!(report.fetched, 2);
    assert_eq!(report.written, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(h.store.count(MediaKind::Show).await, 0);
    assert_eq!(order(&h, 1, "top_movies_week").await, Some(0));
}

#[tokio::test]
async fn test_stale_record_is_re_enriched_without_losing_foreign_fields() {
    let h = harness(50);
    h.catalog
        .set_page("trending", MediaKind::Movie, 1, movies(&[1]));
    h.catalog
        .set_page("popular", MediaKind::Movie, 1, movies(&[1]));
    h.sync.sync_page("trending_movies", 1).await.unwrap();
    h.sync.refresh_artwork(MediaKind::Movie, 1).await.unwrap();

    h.clock.advance(chrono::Duration::days(8));
    let report = h.sync.sync_page("popular_movies", 1).await.unwrap();

    assert_eq!(report.reranked, 0);
    assert_eq!(h.provider.detail_calls.load(Ordering::SeqCst), 2);
    let item = h.store.get(MediaKind::Movie, 1).await.unwrap();
    assert_eq!(item.logo_url.as_deref(), Some("https://img/w500/logo1.png"));
    assert_eq!(item.order_in("trending"), Some(0));
    assert_eq!(item.order_in("popular"), Some(0));
    assert_eq!(item.last_enriched, h.clock.now());
}

#[tokio::test]
async fn test_refresh_all_covers_every_enabled_list() {
    let h = harness(50);
    h.catalog
        .set_page("trending", MediaKind::Movie, 1, movies(&[1]));
    h.catalog.set_page(
        "trending",
        MediaKind::Show,
        1,
        vec![listed(MediaKind::Show, 1)],
    );
    h.catalog.fail("popular");

    let results = h.sync.refresh_all().await;

    assert_eq!(results.len(), 5);
    let failed: Vec<&str> = results
        .iter()
        .filter(|(_, r)| r.is_err())
        .map(|(id, _)| id.as_str())
        .collect();
    assert_eq!(failed.len(), 2);
    assert!(failed.contains(&"popular_movies"));
    // Movie 1 and show 1 share an ID but are separate records
    assert_eq!(h.store.count_in_list(MediaKind::Movie, "trending").await, 1);
    assert_eq!(h.store.count_in_list(MediaKind::Show, "trending").await, 1);
}

#[tokio::test]
async fn test_passes_ignore_unknown_records() {
    let h = harness(50);
    assert_eq!(
        h.sync.refresh_similar(MediaKind::Movie, 9).await.unwrap(),
        None
    );

    h.catalog
        .set_page("trending", MediaKind::Movie, 1, movies(&[9]));
    h.sync.sync_page("trending_movies", 1).await.unwrap();
    let item = h
        .sync
        .refresh_similar(MediaKind::Movie, 9)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(item.similar.len(), 3);
    assert_eq!(item.order_in("trending"), Some(0));
}
