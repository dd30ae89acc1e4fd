use catalog_sync_models::{
    CastMember, CatalogItem, CollectionRef, ListOrders, ListedItem, MediaKind, SimilarItem,
    TitleSummary,
};
use catalog_sync_sources::EnrichmentProvider;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::clock::Clock;
use crate::error::EnrichmentError;
use crate::fanout::{guarded, BranchError};
use crate::store::CatalogStore;

pub const MAX_CAST_ITEMS: usize = 15;
pub const MAX_SIMILAR_ITEMS: usize = 20;

/// Builds absolute artwork URLs from provider-relative paths.
#[derive(Debug, Clone)]
pub struct ImageUrls {
    base: String,
}

impl ImageUrls {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn sized(&self, size: &str, path: Option<&str>) -> Option<String> {
        path.filter(|p| !p.trim().is_empty())
            .map(|p| format!("{}/{}{}", self.base, size, p))
    }

    pub fn poster(&self, path: Option<&str>) -> Option<String> {
        self.sized("w500", path)
    }

    pub fn backdrop(&self, path: Option<&str>) -> Option<String> {
        self.sized("w780", path)
    }

    pub fn profile(&self, path: Option<&str>) -> Option<String> {
        self.sized("w185", path)
    }

    pub fn logo(&self, path: Option<&str>) -> Option<String> {
        self.sized("w500", path)
    }
}

/// Fields written by the details pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailFields {
    pub trakt_id: Option<u64>,
    pub imdb_id: Option<String>,
    pub title: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub overview: Option<String>,
    pub rating: Option<f32>,
    pub year: Option<i32>,
    pub release_date: Option<String>,
    pub last_air_date: Option<String>,
    pub runtime: Option<u32>,
    pub genres: Vec<String>,
    pub cast: Vec<CastMember>,
    pub collection: Option<CollectionRef>,
}

/// Rank of an item within one logical list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOrder {
    pub cache_key: String,
    pub order: u32,
}

/// The output of one or more enrichment passes, before it is merged with what is stored.
///
/// Only the groups named in the accompanying [`OwnedFields`] are read by [`merge`].
#[derive(Debug, Clone, PartialEq)]
pub struct PartialRecord {
    pub kind: MediaKind,
    pub tmdb_id: u64,
    pub details: Option<DetailFields>,
    pub logo_url: Option<String>,
    pub catalog_rating: Option<f32>,
    pub catalog_votes: Option<u32>,
    pub similar: Vec<SimilarItem>,
    pub list_order: Option<ListOrder>,
    pub fetched_at: DateTime<Utc>,
}

impl PartialRecord {
    pub fn new(kind: MediaKind, tmdb_id: u64, fetched_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            tmdb_id,
            details: None,
            logo_url: None,
            catalog_rating: None,
            catalog_votes: None,
            similar: Vec::new(),
            list_order: None,
            fetched_at,
        }
    }

    pub fn with_list_order(mut self, cache_key: &str, order: u32) -> Self {
        self.list_order = Some(ListOrder {
            cache_key: cache_key.to_string(),
            order,
        });
        self
    }
}

/// Which field groups a pass owns and is allowed to overwrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OwnedFields {
    pub details: bool,
    pub artwork: bool,
    pub ratings: bool,
    pub similar: bool,
    /// Only the ordering field named by the record's `list_order`.
    pub list_order: bool,
}

impl OwnedFields {
    pub const DETAILS: OwnedFields = OwnedFields {
        details: true,
        artwork: false,
        ratings: false,
        similar: false,
        list_order: false,
    };
    pub const ARTWORK: OwnedFields = OwnedFields {
        details: false,
        artwork: true,
        ratings: false,
        similar: false,
        list_order: false,
    };
    pub const RATINGS: OwnedFields = OwnedFields {
        details: false,
        artwork: false,
        ratings: true,
        similar: false,
        list_order: false,
    };
    pub const SIMILAR: OwnedFields = OwnedFields {
        details: false,
        artwork: false,
        ratings: false,
        similar: true,
        list_order: false,
    };

    pub fn union(self, other: OwnedFields) -> OwnedFields {
        OwnedFields {
            details: self.details || other.details,
            artwork: self.artwork || other.artwork,
            ratings: self.ratings || other.ratings,
            similar: self.similar || other.similar,
            list_order: self.list_order || other.list_order,
        }
    }

    pub fn with_list_order(mut self) -> OwnedFields {
        self.list_order = true;
        self
    }
}

fn blank(kind: MediaKind, tmdb_id: u64, at: DateTime<Utc>) -> CatalogItem {
    CatalogItem {
        tmdb_id,
        kind,
        trakt_id: None,
        imdb_id: None,
        title: String::new(),
        poster_url: None,
        backdrop_url: None,
        logo_url: None,
        overview: None,
        rating: None,
        catalog_rating: None,
        catalog_votes: None,
        year: None,
        release_date: None,
        last_air_date: None,
        runtime: None,
        genres: Vec::new(),
        cast: Vec::new(),
        similar: Vec::new(),
        collection: None,
        orders: ListOrders::new(),
        last_enriched: at,
    }
}

/// Combine a stored record with the output of an enrichment pass.
///
/// Owned groups are taken from `fresh` verbatim. Everything else, including
/// every ordering field except the one being written, comes from `existing`
/// (or stays empty for a new record). One list's sync can therefore never
/// erase another list's membership or another pass's artwork.
pub fn merge(
    existing: Option<&CatalogItem>,
    fresh: &PartialRecord,
    owned: OwnedFields,
) -> CatalogItem {
    let mut record = match existing {
        Some(item) => item.clone(),
        None => blank(fresh.kind, fresh.tmdb_id, fresh.fetched_at),
    };

    if owned.details {
        if let Some(details) = &fresh.details {
            // IDs identify the item, so keep a known one rather than losing it
            record.trakt_id = details.trakt_id.or(record.trakt_id);
            record.imdb_id = details.imdb_id.clone().or(record.imdb_id);
            record.title = details.title.clone();
            record.poster_url = details.poster_url.clone();
            record.backdrop_url = details.backdrop_url.clone();
            record.overview = details.overview.clone();
            record.rating = details.rating;
            record.year = details.year;
            record.release_date = details.release_date.clone();
            record.last_air_date = details.last_air_date.clone();
            record.runtime = details.runtime;
            record.genres = details.genres.clone();
            record.cast = details.cast.clone();
            record.collection = details.collection.clone();
            record.last_enriched = fresh.fetched_at;
        }
    }
    if owned.artwork {
        record.logo_url = fresh.logo_url.clone();
    }
    if owned.ratings {
        record.catalog_rating = fresh.catalog_rating;
        record.catalog_votes = fresh.catalog_votes;
    }
    if owned.similar {
        record.similar = fresh.similar.clone();
    }
    if owned.list_order {
        if let Some(list) = &fresh.list_order {
            record.orders.set(&list.cache_key, list.order);
        }
    }

    record
}

fn branch_error(e: BranchError) -> EnrichmentError {
    match e {
        BranchError::Timeout { label, .. } => EnrichmentError::Timeout(label),
        BranchError::Failed { source, .. } => EnrichmentError::Failed(source),
    }
}

/// Fetches enrichment-provider data for bare catalog items.
///
/// Produces records but never writes them; persistence belongs to the caller.
pub struct EnrichmentService {
    provider: Arc<dyn EnrichmentProvider>,
    store: Arc<CatalogStore>,
    clock: Arc<dyn Clock>,
    images: ImageUrls,
    timeout: Duration,
}

impl EnrichmentService {
    pub fn new(
        provider: Arc<dyn EnrichmentProvider>,
        store: Arc<CatalogStore>,
        clock: Arc<dyn Clock>,
        images: ImageUrls,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            clock,
            images,
            timeout,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn images(&self) -> &ImageUrls {
        &self.images
    }

    fn cross_reference(item: &ListedItem) -> Result<u64, EnrichmentError> {
        item.ids
            .tmdb
            .ok_or_else(|| EnrichmentError::MissingCrossReference {
                title: item.title.clone(),
            })
    }

    /// Fetch details and credits concurrently and build the details group.
    pub async fn fetch(&self, item: &ListedItem) -> Result<PartialRecord, EnrichmentError> {
        let tmdb_id = Self::cross_reference(item)?;
        let kind = item.kind;

        let (details, credits) = tokio::join!(
            guarded(
                "details",
                self.timeout,
                self.provider.details(kind, tmdb_id)
            ),
            guarded(
                "credits",
                self.timeout,
                self.provider.credits(kind, tmdb_id)
            ),
        );
        let details = details.map_err(branch_error)?;
        let credits = credits.map_err(branch_error)?;

        let cast = credits
            .into_iter()
            .take(MAX_CAST_ITEMS)
            .map(|c| CastMember {
                id: c.id,
                name: c.name,
                role: c.character,
                image: self.images.profile(c.profile_path.as_deref()),
            })
            .collect();

        let collection = details.collection.as_ref().map(|c| CollectionRef {
            id: c.id,
            name: c.name.clone(),
            poster_url: self.images.poster(c.poster_url.as_deref()),
            backdrop_url: self.images.backdrop(c.backdrop_url.as_deref()),
        });

        let mut record = PartialRecord::new(kind, tmdb_id, self.clock.now());
        record.details = Some(DetailFields {
            trakt_id: item.ids.trakt,
            imdb_id: details.imdb_id.clone().or_else(|| item.ids.imdb.clone()),
            title: if details.title.is_empty() {
                item.title.clone()
            } else {
                details.title.clone()
            },
            poster_url: self.images.poster(details.poster_path.as_deref()),
            backdrop_url: self.images.backdrop(details.backdrop_path.as_deref()),
            overview: details.overview.clone(),
            rating: details.vote_average,
            year: details.year().or(item.year),
            release_date: details.release_date.clone(),
            last_air_date: details.last_air_date.clone(),
            runtime: details.runtime,
            genres: details.genres.clone(),
            cast,
            collection,
        });
        Ok(record)
    }

    /// Enrich a bare item for `list` and merge it with the stored record.
    #[instrument(skip(self, item), fields(title = %item.title))]
    pub async fn enrich(
        &self,
        item: &ListedItem,
        list: Option<ListOrder>,
    ) -> Result<CatalogItem, EnrichmentError> {
        let mut fresh = self.fetch(item).await?;
        fresh.list_order = list;
        let existing = self.store.get(fresh.kind, fresh.tmdb_id).await;
        debug!(
            tmdb_id = fresh.tmdb_id,
            existing = existing.is_some(),
            "Enriched item"
        );
        Ok(merge(
            existing.as_ref(),
            &fresh,
            OwnedFields::DETAILS.with_list_order(),
        ))
    }

    /// Details plus artwork in one go, for items first seen outside a logical list.
    pub async fn fetch_with_artwork(
        &self,
        item: &ListedItem,
    ) -> Result<PartialRecord, EnrichmentError> {
        let tmdb_id = Self::cross_reference(item)?;
        let (record, logo) = tokio::join!(self.fetch(item), self.artwork(item.kind, tmdb_id));
        let mut record = record?;
        record.logo_url = logo?;
        Ok(record)
    }

    /// Artwork pass: the preferred logo URL, if any.
    pub async fn artwork(
        &self,
        kind: MediaKind,
        tmdb_id: u64,
    ) -> Result<Option<String>, EnrichmentError> {
        let images = guarded("images", self.timeout, self.provider.images(kind, tmdb_id))
            .await
            .map_err(branch_error)?;
        Ok(images
            .preferred_logo()
            .and_then(|logo| self.images.logo(Some(&logo.file_path))))
    }

    /// Similar pass.
    pub async fn similar(
        &self,
        kind: MediaKind,
        tmdb_id: u64,
    ) -> Result<Vec<SimilarItem>, EnrichmentError> {
        let similar = guarded(
            "similar",
            self.timeout,
            self.provider.similar(kind, tmdb_id),
        )
        .await
        .map_err(branch_error)?;
        Ok(similar
            .into_iter()
            .take(MAX_SIMILAR_ITEMS)
            .map(|s| self.similar_item(s))
            .collect())
    }

    fn similar_item(&self, summary: TitleSummary) -> SimilarItem {
        let year = summary
            .release_date
            .as_deref()
            .and_then(|d| d.get(0..4))
            .and_then(|y| y.parse().ok());
        SimilarItem {
            tmdb_id: summary.tmdb_id,
            kind: summary.kind,
            title: summary.title,
            poster_url: self.images.poster(summary.poster_path.as_deref()),
            backdrop_url: self.images.backdrop(summary.backdrop_path.as_deref()),
            rating: summary.vote_average,
            year,
        }
    }
}
