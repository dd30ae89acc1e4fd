use serde::{Deserialize, Serialize};

/// Identifiers an item carries across providers.
///
/// `trakt` and `slug` come from the catalog provider; `tmdb` is the
/// enrichment provider's cross-reference and is required before an item
/// can be enriched or stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ProviderIds {
    pub trakt: Option<u64>,
    pub slug: Option<String>,
    pub imdb: Option<String>,
    pub tmdb: Option<u64>,
}

impl ProviderIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trakt(mut self, id: u64) -> Self {
        self.trakt = Some(id);
        self
    }

    pub fn with_tmdb(mut self, id: u64) -> Self {
        self.tmdb = Some(id);
        self
    }

    pub fn with_imdb(mut self, id: impl Into<String>) -> Self {
        self.imdb = Some(id.into());
        self
    }

    /// Fill in missing IDs from `other`. Existing values are not overwritten.
    pub fn merge(&mut self, other: &ProviderIds) {
        if self.trakt.is_none() {
            self.trakt = other.trakt;
        }
        if self.slug.is_none() {
            self.slug = other.slug.clone();
        }
        if self.imdb.is_none() {
            self.imdb = other.imdb.clone();
        }
        if self.tmdb.is_none() {
            self.tmdb = other.tmdb;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.trakt.is_none() && self.slug.is_none() && self.imdb.is_none() && self.tmdb.is_none()
    }
}
