use async_trait::async_trait;
use catalog_sync_config::TraktConfig;
use catalog_sync_models::{
    EpisodeRef, HistoryEvent, ListedItem, MediaKind, PersonHit, PlaybackProgress, SearchHit,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::error::SourceError;
use crate::traits::{AggregateRating, CatalogProvider, WatchActivityProvider};
use crate::trakt::{api, auth};

#[derive(Clone)]
pub struct TraktClient {
    client: Arc<Client>,
    client_id: String,
    base_url: String,
}

impl TraktClient {
    pub fn new(config: &TraktConfig, timeout: Duration) -> Self {
        Self {
            client: Arc::new(auth::http_client(timeout)),
            client_id: config.client_id.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn http(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CatalogProvider for TraktClient {
    async fn trending(&self, kind: MediaKind, page: u32, limit: u32) -> Result<Vec<ListedItem>, SourceError> {
        api::get_trending(&self.client, &self.base_url, &self.client_id, kind, page, limit).await
    }

    async fn popular(&self, kind: MediaKind, page: u32, limit: u32) -> Result<Vec<ListedItem>, SourceError> {
        api::get_popular(&self.client, &self.base_url, &self.client_id, kind, page, limit).await
    }

    async fn user_list_items(
        &self,
        owner: &str,
        slug: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<ListedItem>, SourceError> {
        api::get_user_list_items(&self.client, &self.base_url, &self.client_id, owner, slug, page, limit).await
    }

    async fn ratings(&self, kind: MediaKind, trakt_id: u64) -> Result<AggregateRating, SourceError> {
        api::get_ratings(&self.client, &self.base_url, &self.client_id, kind, trakt_id).await
    }

    async fn search(&self, kind: MediaKind, query: &str, limit: u32) -> Result<Vec<SearchHit>, SourceError> {
        api::search_titles(&self.client, &self.base_url, &self.client_id, kind, query, limit).await
    }

    async fn search_people(&self, query: &str, limit: u32) -> Result<Vec<PersonHit>, SourceError> {
        api::search_people(&self.client, &self.base_url, &self.client_id, query, limit).await
    }
}

#[async_trait]
impl WatchActivityProvider for TraktClient {
    async fn playback(&self, token: &str) -> Result<Vec<PlaybackProgress>, SourceError> {
        api::get_playback(&self.client, &self.base_url, &self.client_id, token).await
    }

    async fn history(&self, token: &str, limit: u32) -> Result<Vec<HistoryEvent>, SourceError> {
        api::get_history(&self.client, &self.base_url, &self.client_id, token, limit).await
    }

    async fn next_episode(&self, token: &str, show_id: u64) -> Result<Option<EpisodeRef>, SourceError> {
        api::get_next_episode(&self.client, &self.base_url, &self.client_id, token, show_id).await
    }
}
