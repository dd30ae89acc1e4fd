use catalog_sync_models::{
    ArtworkImage, CollectionRef, Credit, ImageSet, MediaKind, TitleDetails, TitleSummary,
};
use serde::Deserialize;

use crate::traits::PersonSummary;

#[derive(Debug, Deserialize)]
struct Genre {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Collection {
    id: u64,
    name: String,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExternalIds {
    imdb_id: Option<String>,
}

/// Movie and TV detail payloads share most fields; the rest are optional.
#[derive(Debug, Deserialize)]
pub(crate) struct DetailsResponse {
    id: u64,
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    vote_average: Option<f32>,
    imdb_id: Option<String>,
    external_ids: Option<ExternalIds>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    last_air_date: Option<String>,
    runtime: Option<u32>,
    #[serde(default)]
    episode_run_time: Vec<u32>,
    #[serde(default)]
    genres: Vec<Genre>,
    belongs_to_collection: Option<Collection>,
}

#[derive(Debug, Deserialize)]
struct CastEntry {
    id: u64,
    name: String,
    character: Option<String>,
    profile_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreditsResponse {
    #[serde(default)]
    cast: Vec<CastEntry>,
}

#[derive(Debug, Deserialize)]
struct ImageEntry {
    file_path: String,
    iso_639_1: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImagesResponse {
    #[serde(default)]
    logos: Vec<ImageEntry>,
    #[serde(default)]
    posters: Vec<ImageEntry>,
    #[serde(default)]
    backdrops: Vec<ImageEntry>,
}

#[derive(Debug, Deserialize)]
struct SummaryEntry {
    id: u64,
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    vote_average: Option<f32>,
    release_date: Option<String>,
    first_air_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryPage {
    #[serde(default)]
    results: Vec<SummaryEntry>,
}

#[derive(Debug, Deserialize)]
struct PersonEntry {
    id: u64,
    name: String,
    profile_path: Option<String>,
    known_for_department: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PersonPage {
    #[serde(default)]
    results: Vec<PersonEntry>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl DetailsResponse {
    pub(crate) fn into_details(self, kind: MediaKind) -> TitleDetails {
        let (title, release_date, runtime) = match kind {
            MediaKind::Movie => (self.title, self.release_date, self.runtime),
            MediaKind::Show => (
                self.name,
                self.first_air_date,
                self.episode_run_time.first().copied(),
            ),
        };
        TitleDetails {
            tmdb_id: self.id,
            title: title.unwrap_or_default(),
            overview: non_empty(self.overview),
            poster_path: non_empty(self.poster_path),
            backdrop_path: non_empty(self.backdrop_path),
            vote_average: self.vote_average,
            imdb_id: non_empty(self.imdb_id.or(self.external_ids.and_then(|e| e.imdb_id))),
            release_date: non_empty(release_date),
            last_air_date: non_empty(self.last_air_date),
            runtime,
            genres: self.genres.into_iter().map(|g| g.name).collect(),
            collection: self.belongs_to_collection.map(|c| CollectionRef {
                id: c.id,
                name: c.name,
                poster_url: c.poster_path,
                backdrop_url: c.backdrop_path,
            }),
        }
    }
}

impl CreditsResponse {
    pub(crate) fn into_credits(self) -> Vec<Credit> {
        self.cast
            .into_iter()
            .map(|c| Credit {
                id: c.id,
                name: c.name,
                character: non_empty(c.character),
                profile_path: non_empty(c.profile_path),
            })
            .collect()
    }
}

impl ImagesResponse {
    pub(crate) fn into_image_set(self) -> ImageSet {
        let convert = |images: Vec<ImageEntry>| {
            images
                .into_iter()
                .map(|i| ArtworkImage {
                    file_path: i.file_path,
                    iso_639_1: i.iso_639_1,
                })
                .collect()
        };
        ImageSet {
            logos: convert(self.logos),
            posters: convert(self.posters),
            backdrops: convert(self.backdrops),
        }
    }
}

impl SummaryPage {
    pub(crate) fn into_summaries(self, kind: MediaKind) -> Vec<TitleSummary> {
        self.results
            .into_iter()
            .map(|r| TitleSummary {
                tmdb_id: r.id,
                kind,
                title: r.title.or(r.name).unwrap_or_default(),
                overview: non_empty(r.overview),
                poster_path: non_empty(r.poster_path),
                backdrop_path: non_empty(r.backdrop_path),
                vote_average: r.vote_average,
                release_date: non_empty(r.release_date.or(r.first_air_date)),
            })
            .collect()
    }
}

impl PersonPage {
    pub(crate) fn into_people(self) -> Vec<PersonSummary> {
        self.results
            .into_iter()
            .map(|p| PersonSummary {
                tmdb_id: p.id,
                name: p.name,
                profile_path: non_empty(p.profile_path),
                known_for: p.known_for_department,
            })
            .collect()
    }
}

/// Path segment for a media kind ("movie" or "tv").
pub(crate) fn kind_path(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => "movie",
        MediaKind::Show => "tv",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_details() {
        let body = r#"{
            "id": 603, "title": "The Matrix", "overview": "Neo.", "poster_path": "/p.jpg",
            "backdrop_path": "", "vote_average": 8.2, "imdb_id": "tt0133093",
            "release_date": "1999-03-31", "runtime": 136,
            "genres": [{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}],
            "belongs_to_collection": {"id": 2344, "name": "The Matrix Collection", "poster_path": null, "backdrop_path": null}
        }"#;
        let details = serde_json::from_str::<DetailsResponse>(body)
            .unwrap()
            .into_details(MediaKind::Movie);
        assert_eq!(details.title, "The Matrix");
        assert_eq!(details.backdrop_path, None);
        assert_eq!(details.runtime, Some(136));
        assert_eq!(details.genres, vec!["Action", "Science Fiction"]);
        assert_eq!(details.collection.as_ref().map(|c| c.id), Some(2344));
        assert_eq!(details.year(), Some(1999));
    }

    #[test]
    fn test_show_details() {
        let body = r#"{
            "id": 1396, "name": "Breaking Bad", "first_air_date": "2008-01-20",
            "last_air_date": "2013-09-29", "episode_run_time": [45, 47],
            "external_ids": {"imdb_id": "tt0903747"}
        }"#;
        let details = serde_json::from_str::<DetailsResponse>(body)
            .unwrap()
            .into_details(MediaKind::Show);
        assert_eq!(details.title, "Breaking Bad");
        assert_eq!(details.release_date.as_deref(), Some("2008-01-20"));
        assert_eq!(details.runtime, Some(45));
        assert_eq!(details.imdb_id.as_deref(), Some("tt0903747"));
    }
}
