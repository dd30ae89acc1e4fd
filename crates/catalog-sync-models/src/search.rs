use serde::{Deserialize, Serialize};

use crate::media::MediaKind;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchSource {
    Trakt,
    Tmdb,
    Combined,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub kind: MediaKind,
    pub title: String,
    pub year: Option<i32>,
    pub trakt_id: Option<u64>,
    pub tmdb_id: Option<u64>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub rating: Option<f32>,
    pub source: SearchSource,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonHit {
    pub name: String,
    pub trakt_id: Option<u64>,
    pub tmdb_id: Option<u64>,
    pub profile_url: Option<String>,
    pub known_for: Option<String>,
    pub source: SearchSource,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResults {
    pub movies: Vec<SearchHit>,
    pub shows: Vec<SearchHit>,
    pub people: Vec<PersonHit>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.movies.is_empty() && self.shows.is_empty() && self.people.is_empty()
    }

    pub fn total(&self) -> usize {
        self.movies.len() + self.shows.len() + self.people.len()
    }
}
