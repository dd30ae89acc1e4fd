use serde::{Deserialize, Serialize};

use crate::catalog_item::CollectionRef;
use crate::media::MediaKind;

/// Detail payload from the enrichment provider, normalized across movies and shows.
///
/// Image fields hold provider-relative paths; the enrichment service turns
/// them into absolute URLs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TitleDetails {
    pub tmdb_id: u64,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: Option<f32>,
    pub imdb_id: Option<String>,
    /// Release date for movies, first air date for shows.
    pub release_date: Option<String>,
    pub last_air_date: Option<String>,
    pub runtime: Option<u32>,
    pub genres: Vec<String>,
    pub collection: Option<CollectionRef>,
}

impl TitleDetails {
    /// Year parsed from the leading `YYYY` of the release date.
    pub fn year(&self) -> Option<i32> {
        self.release_date
            .as_deref()
            .and_then(|d| d.get(0..4))
            .and_then(|y| y.parse().ok())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Credit {
    pub id: u64,
    pub name: String,
    pub character: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtworkImage {
    pub file_path: String,
    pub iso_639_1: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageSet {
    pub logos: Vec<ArtworkImage>,
    pub posters: Vec<ArtworkImage>,
    pub backdrops: Vec<ArtworkImage>,
}

impl ImageSet {
    /// English logo with a non-blank path, otherwise the first non-blank logo.
    pub fn preferred_logo(&self) -> Option<&ArtworkImage> {
        let usable = |img: &&ArtworkImage| !img.file_path.trim().is_empty();
        self.logos
            .iter()
            .filter(usable)
            .find(|img| img.iso_639_1.as_deref() == Some("en"))
            .or_else(|| self.logos.iter().find(usable))
    }
}

/// Minimal listing entry for "similar" and search results from the enrichment provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TitleSummary {
    pub tmdb_id: u64,
    pub kind: MediaKind,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: Option<f32>,
    pub release_date: Option<String>,
}
