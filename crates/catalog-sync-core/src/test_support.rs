use async_trait::async_trait;
use catalog_sync_models::{
    ArtworkImage, CatalogItem, Credit, EpisodeRef, HistoryEvent, ImageSet, ListOrders, ListedItem,
    MediaKind, PersonHit, PlaybackProgress, ProviderIds, SearchHit, TitleDetails, TitleSummary,
};
use catalog_sync_sources::{
    AggregateRating, CatalogProvider, EnrichmentProvider, PersonSummary, SourceError,
    TokenProvider, WatchActivityProvider,
};
use chrono::{TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn catalog_item(kind: MediaKind, tmdb_id: u64, title: &str) -> CatalogItem {
    CatalogItem {
        tmdb_id,
        kind,
        trakt_id: Some(tmdb_id + 1000),
        imdb_id: None,
        title: title.to_string(),
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
        last_enriched: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

pub fn listed(kind: MediaKind, tmdb_id: u64) -> ListedItem {
    ListedItem::new(
        kind,
        format!("Title {}", tmdb_id),
        ProviderIds::new()
            .with_trakt(tmdb_id + 1000)
            .with_tmdb(tmdb_id),
    )
}

pub fn show(trakt_id: u64, title: &str) -> ListedItem {
    ListedItem::new(
        MediaKind::Show,
        title,
        ProviderIds::new().with_trakt(trakt_id),
    )
}

pub fn episode(season: u32, number: u32) -> EpisodeRef {
    EpisodeRef {
        season,
        number,
        title: None,
        trakt_id: None,
    }
}

type PageKey = (String, MediaKind, u32);

#[derive(Default)]
pub struct FakeCatalog {
    pages: Mutex<HashMap<PageKey, Vec<ListedItem>>>,
    ratings: Mutex<HashMap<(MediaKind, u64), AggregateRating>>,
    search_hits: Mutex<HashMap<MediaKind, Vec<SearchHit>>>,
    people: Mutex<Vec<PersonHit>>,
    failing: Mutex<HashSet<String>>,
    pub list_calls: AtomicUsize,
    pub rating_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn set_page(&self, feed: &str, kind: MediaKind, page: u32, items: Vec<ListedItem>) {
        self.pages
            .lock()
            .unwrap()
            .insert((feed.to_string(), kind, page), items);
    }

    pub fn set_ratings(&self, kind: MediaKind, trakt_id: u64, rating: f32, votes: u32) {
        self.ratings
            .lock()
            .unwrap()
            .insert((kind, trakt_id), AggregateRating { rating, votes });
    }

    pub fn set_search(&self, kind: MediaKind, hits: Vec<SearchHit>) {
        self.search_hits.lock().unwrap().insert(kind, hits);
    }

    pub fn set_people(&self, people: Vec<PersonHit>) {
        *self.people.lock().unwrap() = people;
    }

    /// Make every call whose operation name is `op` fail with a transient error.
    pub fn fail(&self, op: &str) {
        self.failing.lock().unwrap().insert(op.to_string());
    }

    fn check(&self, op: &str) -> Result<(), SourceError> {
        if self.failing.lock().unwrap().contains(op) {
            Err(SourceError::Transient(format!("{} unavailable", op)))
        } else {
            Ok(())
        }
    }

    fn page(&self, feed: &str, kind: MediaKind, page: u32) -> Result<Vec<ListedItem>, SourceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check(feed)?;
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get(&(feed.to_string(), kind, page))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl CatalogProvider for FakeCatalog {
    async fn trending(
        &self,
        kind: MediaKind,
        page: u32,
        _limit: u32,
    ) -> Result<Vec<ListedItem>, SourceError> {
        self.page("trending", kind, page)
    }

    async fn popular(
        &self,
        kind: MediaKind,
        page: u32,
        _limit: u32,
    ) -> Result<Vec<ListedItem>, SourceError> {
        self.page("popular", kind, page)
    }

    async fn user_list_items(
        &self,
        owner: &str,
        slug: &str,
        page: u32,
        _limit: u32,
    ) -> Result<Vec<ListedItem>, SourceError> {
        let feed = format!("{}/{}", owner, slug);
        let items = self.page(&feed, MediaKind::Movie, page)?;
        let shows = self
            .pages
            .lock()
            .unwrap()
            .get(&(feed, MediaKind::Show, page))
            .cloned()
            .unwrap_or_default();
        Ok(items.into_iter().chain(shows).collect())
    }

    async fn ratings(
        &self,
        kind: MediaKind,
        trakt_id: u64,
    ) -> Result<AggregateRating, SourceError> {
        self.rating_calls.fetch_add(1, Ordering::SeqCst);
        self.check("ratings")?;
        self.ratings
            .lock()
            .unwrap()
            .get(&(kind, trakt_id))
            .copied()
            .ok_or(SourceError::Rejected {
                status: 404,
                body: "not found".to_string(),
            })
    }

    async fn search(
        &self,
        kind: MediaKind,
        _query: &str,
        _limit: u32,
    ) -> Result<Vec<SearchHit>, SourceError> {
        self.check(&format!("search_{}", kind))?;
        Ok(self
            .search_hits
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_default())
    }

    async fn search_people(
        &self,
        _query: &str,
        _limit: u32,
    ) -> Result<Vec<PersonHit>, SourceError> {
        self.check("search_people")?;
        Ok(self.people.lock().unwrap().clone())
    }
}

/// Enrichment provider that derives every payload from the requested ID.
#[derive(Default)]
pub struct FakeEnrichment {
    failing_ids: Mutex<HashSet<u64>>,
    search_results: Mutex<HashMap<MediaKind, Vec<TitleSummary>>>,
    people: Mutex<Vec<PersonSummary>>,
    failing_ops: Mutex<HashSet<String>>,
    pub detail_calls: AtomicUsize,
    pub image_calls: AtomicUsize,
}

impl FakeEnrichment {
    pub fn fail_id(&self, tmdb_id: u64) {
        self.failing_ids.lock().unwrap().insert(tmdb_id);
    }

    pub fn fail(&self, op: &str) {
        self.failing_ops.lock().unwrap().insert(op.to_string());
    }

    pub fn set_search(&self, kind: MediaKind, results: Vec<TitleSummary>) {
        self.search_results.lock().unwrap().insert(kind, results);
    }

    pub fn set_people(&self, people: Vec<PersonSummary>) {
        *self.people.lock().unwrap() = people;
    }

    fn check(&self, op: &str, tmdb_id: Option<u64>) -> Result<(), SourceError> {
        let id_failing = tmdb_id.map_or(false, |id| self.failing_ids.lock().unwrap().contains(&id));
        if id_failing || self.failing_ops.lock().unwrap().contains(op) {
            Err(SourceError::Transient(format!("{} unavailable", op)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EnrichmentProvider for FakeEnrichment {
    async fn details(&self, _kind: MediaKind, tmdb_id: u64) -> Result<TitleDetails, SourceError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.check("details", Some(tmdb_id))?;
        Ok(TitleDetails {
            tmdb_id,
            title: format!("Title {}", tmdb_id),
            overview: Some(format!("Overview {}", tmdb_id)),
            poster_path: Some(format!("/poster{}.jpg", tmdb_id)),
            backdrop_path: Some(format!("/backdrop{}.jpg", tmdb_id)),
            vote_average: Some(7.5),
            imdb_id: Some(format!("tt{:07}", tmdb_id)),
            release_date: Some("2020-05-01".to_string()),
            last_air_date: None,
            runtime: Some(120),
            genres: vec!["Drama".to_string()],
            collection: None,
        })
    }

    async fn credits(&self, _kind: MediaKind, tmdb_id: u64) -> Result<Vec<Credit>, SourceError> {
        self.check("credits", Some(tmdb_id))?;
        Ok((0..20)
            .map(|i| Credit {
                id: i,
                name: format!("Actor {}", i),
                character: Some(format!("Role {}", i)),
                profile_path: Some(format!("/actor{}.jpg", i)),
            })
            .collect())
    }

    async fn images(&self, _kind: MediaKind, tmdb_id: u64) -> Result<ImageSet, SourceError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        self.check("images", Some(tmdb_id))?;
        Ok(ImageSet {
            logos: vec![
                ArtworkImage {
                    file_path: format!("/logo{}-de.png", tmdb_id),
                    iso_639_1: Some("de".to_string()),
                },
                ArtworkImage {
                    file_path: format!("/logo{}.png", tmdb_id),
                    iso_639_1: Some("en".to_string()),
                },
            ],
            ..Default::default()
        })
    }

    async fn similar(
        &self,
        kind: MediaKind,
        tmdb_id: u64,
    ) -> Result<Vec<TitleSummary>, SourceError> {
        self.check("similar", Some(tmdb_id))?;
        Ok((1..=3)
            .map(|i| TitleSummary {
                tmdb_id: tmdb_id * 10 + i,
                kind,
                title: format!("Similar {}", i),
                overview: None,
                poster_path: None,
                backdrop_path: None,
                vote_average: None,
                release_date: Some("2019-01-01".to_string()),
            })
            .collect())
    }

    async fn search(
        &self,
        kind: MediaKind,
        _query: &str,
    ) -> Result<Vec<TitleSummary>, SourceError> {
        self.check(&format!("search_{}", kind), None)?;
        Ok(self
            .search_results
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_default())
    }

    async fn search_people(&self, _query: &str) -> Result<Vec<PersonSummary>, SourceError> {
        self.check("search_people", None)?;
        Ok(self.people.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct FakeActivity {
    pub playback: Mutex<Vec<PlaybackProgress>>,
    pub history: Mutex<Vec<HistoryEvent>>,
    pub next_episodes: Mutex<HashMap<u64, EpisodeRef>>,
    pub failing_shows: Mutex<HashSet<u64>>,
    pub fail_history: Mutex<bool>,
    pub next_episode_calls: AtomicUsize,
}

#[async_trait]
impl WatchActivityProvider for FakeActivity {
    async fn playback(&self, _token: &str) -> Result<Vec<PlaybackProgress>, SourceError> {
        Ok(self.playback.lock().unwrap().clone())
    }

    async fn history(&self, _token: &str, limit: u32) -> Result<Vec<HistoryEvent>, SourceError> {
        if *self.fail_history.lock().unwrap() {
            return Err(SourceError::Transient("history unavailable".to_string()));
        }
        let history = self.history.lock().unwrap();
        Ok(history.iter().take(limit as usize).cloned().collect())
    }

    async fn next_episode(
        &self,
        _token: &str,
        show_id: u64,
    ) -> Result<Option<EpisodeRef>, SourceError> {
        self.next_episode_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_shows.lock().unwrap().contains(&show_id) {
            return Err(SourceError::Transient("progress unavailable".to_string()));
        }
        Ok(self.next_episodes.lock().unwrap().get(&show_id).cloned())
    }
}

pub struct FakeTokens(pub Option<String>);

#[async_trait]
impl TokenProvider for FakeTokens {
    async fn valid_access_token(&self, _account: &str) -> Option<String> {
        self.0.clone()
    }
}
