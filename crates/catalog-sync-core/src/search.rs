use catalog_sync_config::SearchConfig;
use catalog_sync_models::{
    MediaKind, PersonHit, SearchHit, SearchResults, SearchSource, TitleSummary,
};
use catalog_sync_sources::{CatalogProvider, EnrichmentProvider, PersonSummary};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::enrichment::ImageUrls;
use crate::fanout::{guarded, or_empty};

/// Cross-provider search: six independent lookups joined into one result set.
pub struct SearchService {
    catalog: Arc<dyn CatalogProvider>,
    enrichment: Arc<dyn EnrichmentProvider>,
    images: ImageUrls,
    config: SearchConfig,
}

impl SearchService {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        enrichment: Arc<dyn EnrichmentProvider>,
        images: ImageUrls,
        config: SearchConfig,
    ) -> Self {
        Self {
            catalog,
            enrichment,
            images,
            config,
        }
    }

    /// A failing or slow branch contributes nothing; the others still count.
    #[instrument(skip(self), fields(operation = "search"))]
    pub async fn search(&self, query: &str) -> SearchResults {
        let query = query.trim();
        if query.is_empty() {
            return SearchResults::default();
        }
        let timeout = Duration::from_secs(self.config.branch_timeout_secs);
        let limit = self.config.per_source_limit;

        let (trakt_movies, trakt_shows, trakt_people, tmdb_movies, tmdb_shows, tmdb_people) = tokio::join!(
            guarded(
                "trakt_movies",
                timeout,
                self.catalog.search(MediaKind::Movie, query, limit)
            ),
            guarded(
                "trakt_shows",
                timeout,
                self.catalog.search(MediaKind::Show, query, limit)
            ),
            guarded(
                "trakt_people",
                timeout,
                self.catalog.search_people(query, limit)
            ),
            guarded(
                "tmdb_movies",
                timeout,
                self.enrichment.search(MediaKind::Movie, query)
            ),
            guarded(
                "tmdb_shows",
                timeout,
                self.enrichment.search(MediaKind::Show, query)
            ),
            guarded("tmdb_people", timeout, self.enrichment.search_people(query)),
        );

        let limit = self.config.result_limit;
        let results = SearchResults {
            movies: self.combine_titles(or_empty(trakt_movies), or_empty(tmdb_movies), limit),
            shows: self.combine_titles(or_empty(trakt_shows), or_empty(tmdb_shows), limit),
            people: self.combine_people(or_empty(trakt_people), or_empty(tmdb_people), limit),
        };
        debug!(
            movies = results.movies.len(),
            shows = results.shows.len(),
            people = results.people.len(),
            "Search complete"
        );
        results
    }

    fn combine_titles(
        &self,
        mut hits: Vec<SearchHit>,
        secondary: Vec<TitleSummary>,
        limit: usize,
    ) -> Vec<SearchHit> {
        for summary in secondary {
            let poster_url = self.images.poster(summary.poster_path.as_deref());
            let backdrop_url = self.images.backdrop(summary.backdrop_path.as_deref());
            match hits.iter_mut().find(|h| h.tmdb_id == Some(summary.tmdb_id)) {
                Some(hit) => {
                    hit.poster_url = poster_url.or(hit.poster_url.take());
                    hit.backdrop_url = backdrop_url.or(hit.backdrop_url.take());
                    hit.overview = summary.overview.or(hit.overview.take());
                    hit.rating = summary.vote_average.or(hit.rating);
                    hit.source = SearchSource::Combined;
                }
                None => {
                    let year = summary
                        .release_date
                        .as_deref()
                        .and_then(|d| d.get(0..4))
                        .and_then(|y| y.parse().ok());
                    hits.push(SearchHit {
                        kind: summary.kind,
                        title: summary.title,
                        year,
                        trakt_id: None,
                        tmdb_id: Some(summary.tmdb_id),
                        overview: summary.overview,
                        poster_url,
                        backdrop_url,
                        rating: summary.vote_average,
                        source: SearchSource::Tmdb,
                    });
                }
            }
        }
        hits.truncate(limit);
        hits
    }

    fn combine_people(
        &self,
        mut people: Vec<PersonHit>,
        secondary: Vec<PersonSummary>,
        limit: usize,
    ) -> Vec<PersonHit> {
        for person in secondary {
            let profile_url = self.images.profile(person.profile_path.as_deref());
            match people
                .iter_mut()
                .find(|p| p.tmdb_id == Some(person.tmdb_id))
            {
                Some(hit) => {
                    hit.profile_url = profile_url.or(hit.profile_url.take());
                    hit.known_for = hit.known_for.take().or(person.known_for);
                    hit.source = SearchSource::Combined;
                }
                None => people.push(PersonHit {
                    name: person.name,
                    trakt_id: None,
                    tmdb_id: Some(person.tmdb_id),
                    profile_url,
                    known_for: person.known_for,
                    source: SearchSource::Tmdb,
                }),
            }
        }
        people.truncate(limit);
        people
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeCatalog, FakeEnrichment};

    fn trakt_hit(kind: MediaKind, title: &str, trakt_id: u64, tmdb_id: Option<u64>) -> SearchHit {
        SearchHit {
            kind,
            title: title.to_string(),
            year: Some(1999),
            trakt_id: Some(trakt_id),
            tmdb_id,
            overview: None,
            poster_url: None,
            backdrop_url: None,
            rating: None,
            source: SearchSource::Trakt,
        }
    }

    fn summary(kind: MediaKind, tmdb_id: u64, title: &str) -> TitleSummary {
        TitleSummary {
            tmdb_id,
            kind,
            title: title.to_string(),
            overview: Some(format!("About {}", title)),
            poster_path: Some(format!("/p{}.jpg", tmdb_id)),
            backdrop_path: None,
            vote_average: Some(8.0),
            release_date: Some("2001-09-01".to_string()),
        }
    }

    fn service(
        catalog: Arc<FakeCatalog>,
        enrichment: Arc<FakeEnrichment>,
        result_limit: usize,
    ) -> SearchService {
        SearchService::new(
            catalog,
            enrichment,
            ImageUrls::new("https://img"),
            SearchConfig {
                result_limit,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_secondary_hits_merge_into_primary_hits() {
        let catalog = Arc::new(FakeCatalog::default());
        let enrichment = Arc::new(FakeEnrichment::default());
        catalog.set_search(
            MediaKind::Movie,
            vec![
                trakt_hit(MediaKind::Movie, "The Matrix", 1, Some(603)),
                trakt_hit(MediaKind::Movie, "Matrix Fan Edit", 2, None),
            ],
        );
        enrichment.set_search(
            MediaKind::Movie,
            vec![
                summary(MediaKind::Movie, 603, "The Matrix"),
                summary(MediaKind::Movie, 604, "The Matrix Reloaded"),
            ],
        );

        let results = service(catalog, enrichment, 20).search("matrix").await;

        assert_eq!(results.movies.len(), 3);
        let merged = &results.movies[0];
        assert_eq!(merged.source, SearchSource::Combined);
        assert_eq!(merged.trakt_id, Some(1));
        assert_eq!(
            merged.poster_url.as_deref(),
            Some("https://img/w500/p603.jpg")
        );
        assert_eq!(merged.overview.as_deref(), Some("About The Matrix"));
        assert_eq!(results.movies[1].source, SearchSource::Trakt);
        assert_eq!(results.movies[2].source, SearchSource::Tmdb);
        assert_eq!(results.movies[2].year, Some(2001));
    }

    #[tokio::test]
    async fn test_failed_branches_degrade_to_empty() {
        let catalog = Arc::new(FakeCatalog::default());
        let enrichment = Arc::new(FakeEnrichment::default());
        catalog.set_search(
            MediaKind::Show,
            vec![trakt_hit(MediaKind::Show, "Dark", 5, Some(70523))],
        );
        catalog.fail("search_movie");
        catalog.fail("search_people");
        enrichment.set_search(
            MediaKind::Movie,
            vec![summary(MediaKind::Movie, 1, "Dark City")],
        );
        enrichment.set_people(vec![PersonSummary {
            tmdb_id: 9,
            name: "Louis Hofmann".to_string(),
            profile_path: None,
            known_for: Some("Dark".to_string()),
        }]);
        enrichment.fail("search_show");

        let results = service(catalog, enrichment, 20).search("dark").await;

        assert_eq!(results.movies.len(), 1);
        assert_eq!(results.movies[0].source, SearchSource::Tmdb);
        assert_eq!(results.shows.len(), 1);
        assert_eq!(results.shows[0].source, SearchSource::Trakt);
        assert_eq!(results.people.len(), 1);
        assert_eq!(results.total(), 3);
    }

    #[tokio::test]
    async fn test_results_are_truncated_and_blank_query_is_skipped() {
        let catalog = Arc::new(FakeCatalog::default());
        let enrichment = Arc::new(FakeEnrichment::default());
        enrichment.set_search(
            MediaKind::Movie,
            (1..=5)
                .map(|i| summary(MediaKind::Movie, i, "Alien"))
                .collect(),
        );
        let search = service(catalog, enrichment, 3);

        assert_eq!(search.search("alien").await.movies.len(), 3);
        assert!(search.search("   ").await.is_empty());
    }
}
