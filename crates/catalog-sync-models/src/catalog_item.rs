use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::media::MediaKind;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    pub role: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarItem {
    pub tmdb_id: u64,
    pub kind: MediaKind,
    pub title: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub rating: Option<f32>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionRef {
    pub id: u64,
    pub name: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
}

/// Per-list rank of an item, keyed by the list's cache key.
///
/// A missing key means the item is not currently in that list. Each key is
/// written by exactly one logical list, which is what lets different lists
/// sync concurrently without stepping on each other.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListOrders(BTreeMap<String, u32>);

impl ListOrders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cache_key: &str) -> Option<u32> {
        self.0.get(cache_key).copied()
    }

    pub fn set(&mut self, cache_key: &str, order: u32) {
        self.0.insert(cache_key.to_string(), order);
    }

    /// Returns the previous order, if the item was in the list.
    pub fn clear(&mut self, cache_key: &str) -> Option<u32> {
        self.0.remove(cache_key)
    }

    pub fn contains(&self, cache_key: &str) -> bool {
        self.0.contains_key(cache_key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A fully enriched movie or show as persisted in the catalog store.
///
/// Identity is `(kind, tmdb_id)`. Fields are grouped by the enrichment pass
/// that owns them: details (title through collection), artwork (`logo_url`),
/// ratings (`catalog_rating`, `catalog_votes`), similar (`similar`) and list
/// membership (`orders`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub tmdb_id: u64,
    pub kind: MediaKind,
    pub trakt_id: Option<u64>,
    pub imdb_id: Option<String>,
    pub title: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub logo_url: Option<String>,
    pub overview: Option<String>,
    /// Vote average reported by the enrichment provider.
    pub rating: Option<f32>,
    /// Aggregate rating from the catalog provider.
    pub catalog_rating: Option<f32>,
    pub catalog_votes: Option<u32>,
    pub year: Option<i32>,
    pub release_date: Option<String>,
    pub last_air_date: Option<String>,
    pub runtime: Option<u32>,
    pub genres: Vec<String>,
    pub cast: Vec<CastMember>,
    pub similar: Vec<SimilarItem>,
    pub collection: Option<CollectionRef>,
    pub orders: ListOrders,
    pub last_enriched: DateTime<Utc>,
}

impl CatalogItem {
    pub fn key(&self) -> (MediaKind, u64) {
        (self.kind, self.tmdb_id)
    }

    pub fn order_in(&self, cache_key: &str) -> Option<u32> {
        self.orders.get(cache_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_orders_are_independent() {
        let mut orders = ListOrders::new();
        orders.set("trending", 3);
        orders.set("popular", 0);

        assert_eq!(orders.clear("trending"), Some(3));
        assert_eq!(orders.get("trending"), None);
        assert_eq!(orders.get("popular"), Some(0));
        assert_eq!(orders.len(), 1);
    }
}
