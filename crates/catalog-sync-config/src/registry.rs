use catalog_sync_models::MediaKind;
use std::collections::HashSet;
use thiserror::Error;

use crate::config::ListConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown list: {0}")]
    NotFound(String),
    #[error("List '{0}' is defined more than once")]
    DuplicateList(String),
    #[error("Cache key '{cache_key}' is used by more than one {kind} list")]
    DuplicateCacheKey { cache_key: String, kind: MediaKind },
    #[error("Invalid endpoint for list '{list}': {reason}")]
    InvalidEndpoint { list: String, reason: String },
}

/// Where a logical list is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEndpoint {
    Trending,
    Popular,
    /// Community list owned by a user. Not paginated.
    UserList { owner: String, slug: String },
}

impl ListEndpoint {
    /// Parse an endpoint path such as `movies/trending` or
    /// `users/{owner}/lists/{slug}/items`.
    ///
    /// Native endpoints must agree with the list's declared media kind.
    pub fn parse(list: &str, endpoint: &str, kind: MediaKind) -> Result<Self, RegistryError> {
        let invalid = |reason: String| RegistryError::InvalidEndpoint {
            list: list.to_string(),
            reason,
        };
        let segments: Vec<&str> = endpoint.trim_matches('/').split('/').collect();

        match segments.as_slice() {
            [prefix, feed] if *prefix == "movies" || *prefix == "shows" => {
                if *prefix != kind.plural() {
                    return Err(invalid(format!(
                        "endpoint '{}' does not serve {} items",
                        endpoint, kind
                    )));
                }
                match *feed {
                    "trending" => Ok(ListEndpoint::Trending),
                    "popular" => Ok(ListEndpoint::Popular),
                    other => Err(invalid(format!("unsupported feed '{}'", other))),
                }
            }
            ["users", owner, "lists", slug, "items"] if !owner.is_empty() && !slug.is_empty() => {
                Ok(ListEndpoint::UserList {
                    owner: owner.to_string(),
                    slug: slug.to_string(),
                })
            }
            _ => Err(invalid(format!("unrecognized endpoint '{}'", endpoint))),
        }
    }

    pub fn is_paginated(&self) -> bool {
        !matches!(self, ListEndpoint::UserList { .. })
    }
}

/// One resolved logical list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSource {
    pub id: String,
    pub title: String,
    pub endpoint: ListEndpoint,
    pub kind: MediaKind,
    /// Name of the ordering field this list writes on catalog items.
    pub cache_key: String,
    pub enabled: bool,
    pub order: u32,
}

/// Immutable table of logical lists, built once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    lists: Vec<ListSource>,
}

impl SourceRegistry {
    pub fn from_configs(configs: &[ListConfig]) -> Result<Self, RegistryError> {
        let mut ids = HashSet::new();
        let mut cache_keys = HashSet::new();
        let mut lists = Vec::with_capacity(configs.len());

        for config in configs {
            if !ids.insert(config.id.clone()) {
                return Err(RegistryError::DuplicateList(config.id.clone()));
            }
            if !cache_keys.insert((config.media_type, config.cache_key.clone())) {
                return Err(RegistryError::DuplicateCacheKey {
                    cache_key: config.cache_key.clone(),
                    kind: config.media_type,
                });
            }
            let endpoint = ListEndpoint::parse(&config.id, &config.endpoint, config.media_type)?;
            lists.push(ListSource {
                id: config.id.clone(),
                title: config.title.clone(),
                endpoint,
                kind: config.media_type,
                cache_key: config.cache_key.clone(),
                enabled: config.enabled,
                order: config.order,
            });
        }

        Ok(Self { lists })
    }

    /// The default home-screen lists.
    pub fn builtin() -> Self {
        let lists = builtin_lists()
            .iter()
            .filter_map(|config| {
                ListEndpoint::parse(&config.id, &config.endpoint, config.media_type)
                    .ok()
                    .map(|endpoint| ListSource {
                        id: config.id.clone(),
                        title: config.title.clone(),
                        endpoint,
                        kind: config.media_type,
                        cache_key: config.cache_key.clone(),
                        enabled: config.enabled,
                        order: config.order,
                    })
            })
            .collect();
        Self { lists }
    }

    pub fn resolve(&self, id: &str) -> Result<&ListSource, RegistryError> {
        self.lists
            .iter()
            .find(|list| list.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Enabled lists, ordered by kind then by their configured order.
    pub fn enabled(&self) -> Vec<&ListSource> {
        let mut lists: Vec<&ListSource> = self.lists.iter().filter(|l| l.enabled).collect();
        lists.sort_by_key(|l| (l.kind, l.order));
        lists
    }

    pub fn iter(&self) -> impl Iterator<Item = &ListSource> {
        self.lists.iter()
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

pub fn builtin_lists() -> Vec<ListConfig> {
    let list = |id: &str, title: &str, endpoint: &str, kind: MediaKind, cache_key: &str, order: u32| ListConfig {
        id: id.to_string(),
        title: title.to_string(),
        endpoint: endpoint.to_string(),
        media_type: kind,
        cache_key: cache_key.to_string(),
        enabled: true,
        order,
    };
    vec![
        list("trending_movies", "Trending", "movies/trending", MediaKind::Movie, "trending", 1),
        list("popular_movies", "Popular", "movies/popular", MediaKind::Movie, "popular", 2),
        list(
            "top_movies_week",
            "Top Movies of the Week",
            "users/garycrawfordgc/lists/top-movies-of-the-week/items",
            MediaKind::Movie,
            "top_movies_week",
            3,
        ),
        list("trending_shows", "Trending Shows", "shows/trending", MediaKind::Show, "trending", 1),
        list("popular_shows", "Popular Shows", "shows/popular", MediaKind::Show, "popular", 2),
    ]
}
