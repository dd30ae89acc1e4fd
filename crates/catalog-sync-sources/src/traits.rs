use async_trait::async_trait;
use catalog_sync_models::{
    Credit, EpisodeRef, HistoryEvent, ImageSet, ListedItem, MediaKind, PersonHit,
    PlaybackProgress, SearchHit, TitleDetails, TitleSummary,
};

use crate::error::SourceError;

/// Aggregate community score for one title.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateRating {
    pub rating: f32,
    pub votes: u32,
}

/// The primary catalog: listings, aggregate ratings and search.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn trending(&self, kind: MediaKind, page: u32, limit: u32) -> Result<Vec<ListedItem>, SourceError>;
    async fn popular(&self, kind: MediaKind, page: u32, limit: u32) -> Result<Vec<ListedItem>, SourceError>;
    async fn user_list_items(
        &self,
        owner: &str,
        slug: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<ListedItem>, SourceError>;
    async fn ratings(&self, kind: MediaKind, trakt_id: u64) -> Result<AggregateRating, SourceError>;
    async fn search(&self, kind: MediaKind, query: &str, limit: u32) -> Result<Vec<SearchHit>, SourceError>;
    async fn search_people(&self, query: &str, limit: u32) -> Result<Vec<PersonHit>, SourceError>;
}

/// A user's watch activity. Every call needs a bearer token.
#[async_trait]
pub trait WatchActivityProvider: Send + Sync {
    async fn playback(&self, token: &str) -> Result<Vec<PlaybackProgress>, SourceError>;
    async fn history(&self, token: &str, limit: u32) -> Result<Vec<HistoryEvent>, SourceError>;
    /// Next unwatched episode of a show, `None` when the user is caught up.
    async fn next_episode(&self, token: &str, show_id: u64) -> Result<Option<EpisodeRef>, SourceError>;
}

/// The secondary provider that fills in details, cast and artwork.
#[async_trait]
pub trait EnrichmentProvider: Send + Sync {
    async fn details(&self, kind: MediaKind, tmdb_id: u64) -> Result<TitleDetails, SourceError>;
    async fn credits(&self, kind: MediaKind, tmdb_id: u64) -> Result<Vec<Credit>, SourceError>;
    async fn images(&self, kind: MediaKind, tmdb_id: u64) -> Result<ImageSet, SourceError>;
    async fn similar(&self, kind: MediaKind, tmdb_id: u64) -> Result<Vec<TitleSummary>, SourceError>;
    async fn search(&self, kind: MediaKind, query: &str) -> Result<Vec<TitleSummary>, SourceError>;
    async fn search_people(&self, query: &str) -> Result<Vec<PersonSummary>, SourceError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonSummary {
    pub tmdb_id: u64,
    pub name: String,
    pub profile_path: Option<String>,
    pub known_for: Option<String>,
}

/// Supplies bearer tokens, refreshing them before they expire.
///
/// `None` means "no usable token": callers skip authenticated work.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn valid_access_token(&self, account: &str) -> Option<String>;
}
