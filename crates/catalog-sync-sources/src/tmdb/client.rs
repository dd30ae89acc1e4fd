use async_trait::async_trait;
use catalog_sync_config::TmdbConfig;
use catalog_sync_models::{Credit, ImageSet, MediaKind, TitleDetails, TitleSummary};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::SourceError;
use crate::tmdb::api::{
    kind_path, CreditsResponse, DetailsResponse, ImagesResponse, PersonPage, SummaryPage,
};
use crate::traits::{EnrichmentProvider, PersonSummary};

#[derive(Clone)]
pub struct TmdbClient {
    client: Arc<Client>,
    access_token: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client: Arc::new(client),
            access_token: config.access_token.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T, SourceError> {
        let url = format!("{}/{}", self.base_url, path_and_query);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SourceError::from_status(status, error_text));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl EnrichmentProvider for TmdbClient {
    async fn details(&self, kind: MediaKind, tmdb_id: u64) -> Result<TitleDetails, SourceError> {
        let path = match kind {
            MediaKind::Movie => format!("movie/{}", tmdb_id),
            MediaKind::Show => format!("tv/{}?append_to_response=external_ids", tmdb_id),
        };
        let response: DetailsResponse = self.get_json(&path).await?;
        Ok(response.into_details(kind))
    }

    async fn credits(&self, kind: MediaKind, tmdb_id: u64) -> Result<Vec<Credit>, SourceError> {
        let response: CreditsResponse = self
            .get_json(&format!("{}/{}/credits", kind_path(kind), tmdb_id))
            .await?;
        Ok(response.into_credits())
    }

    async fn images(&self, kind: MediaKind, tmdb_id: u64) -> Result<ImageSet, SourceError> {
        let response: ImagesResponse = self
            .get_json(&format!(
                "{}/{}/images?include_image_language=en,null",
                kind_path(kind),
                tmdb_id
            ))
            .await?;
        Ok(response.into_image_set())
    }

    async fn similar(&self, kind: MediaKind, tmdb_id: u64) -> Result<Vec<TitleSummary>, SourceError> {
        let response: SummaryPage = self
            .get_json(&format!("{}/{}/similar?page=1", kind_path(kind), tmdb_id))
            .await?;
        Ok(response.into_summaries(kind))
    }

    async fn search(&self, kind: MediaKind, query: &str) -> Result<Vec<TitleSummary>, SourceError> {
        let response: SummaryPage = self
            .get_json(&format!(
                "search/{}?query={}&page=1",
                kind_path(kind),
                urlencoding::encode(query)
            ))
            .await?;
        Ok(response.into_summaries(kind))
    }

    async fn search_people(&self, query: &str) -> Result<Vec<PersonSummary>, SourceError> {
        let response: PersonPage = self
            .get_json(&format!("search/person?query={}&page=1", urlencoding::encode(query)))
            .await?;
        Ok(response.into_people())
    }
}
