use catalog_sync_models::MediaKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::registry::{builtin_lists, RegistryError, SourceRegistry};

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub trakt: TraktConfig,
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub sync: SyncOptions,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub continue_watching: ContinueWatchingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub scheduler: Option<SchedulerConfig>,
    /// Logical lists. Empty means the built-in table.
    #[serde(default)]
    pub lists: Vec<ListConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TraktConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_trakt_base_url")]
    pub base_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TmdbConfig {
    /// v4 read access token, sent as a bearer token.
    pub access_token: String,
    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,
    #[serde(default = "default_tmdb_image_base_url")]
    pub image_base_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncOptions {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_enrich_concurrency")]
    pub enrich_concurrency: usize,
    /// Records enriched more recently than this are only re-ranked on sync.
    #[serde(default = "default_details_ttl_days")]
    pub details_ttl_days: i64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_virtual_list_ttl_hours")]
    pub virtual_list_ttl_hours: i64,
    #[serde(default = "default_virtual_list_page_size")]
    pub virtual_list_page_size: u32,
    #[serde(default = "default_ratings_ttl_days")]
    pub ratings_ttl_days: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ContinueWatchingConfig {
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
    #[serde(default = "default_feed_limit")]
    pub feed_limit: usize,
    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_branch_timeout_secs")]
    pub branch_timeout_secs: u64,
    #[serde(default = "default_per_source_limit")]
    pub per_source_limit: u32,
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchedulerConfig {
    #[serde(default = "default_schedule")]
    pub schedule: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ListConfig {
    pub id: String,
    pub title: String,
    pub endpoint: String,
    pub media_type: MediaKind,
    pub cache_key: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub order: u32,
}

fn default_true() -> bool {
    true
}

fn default_trakt_base_url() -> String {
    "https://api.trakt.tv".to_string()
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_page_size() -> u32 {
    50
}

fn default_enrich_concurrency() -> usize {
    4
}

fn default_details_ttl_days() -> i64 {
    7
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_virtual_list_ttl_hours() -> i64 {
    24
}

fn default_virtual_list_page_size() -> u32 {
    20
}

fn default_ratings_ttl_days() -> i64 {
    7
}

fn default_history_limit() -> u32 {
    100
}

fn default_feed_limit() -> usize {
    20
}

fn default_lookup_timeout_secs() -> u64 {
    10
}

fn default_branch_timeout_secs() -> u64 {
    8
}

fn default_per_source_limit() -> u32 {
    10
}

fn default_result_limit() -> usize {
    20
}

fn default_schedule() -> String {
    "0 0 */6 * * *".to_string() // Every 6 hours
}

fn default_timezone() -> String {
    std::env::var("TZ").unwrap_or_else(|_| "UTC".to_string())
}

pub fn default_scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        schedule: default_schedule(),
        timezone: default_timezone(),
        run_on_startup: default_true(),
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            enrich_concurrency: default_enrich_concurrency(),
            details_ttl_days: default_details_ttl_days(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            virtual_list_ttl_hours: default_virtual_list_ttl_hours(),
            virtual_list_page_size: default_virtual_list_page_size(),
            ratings_ttl_days: default_ratings_ttl_days(),
        }
    }
}

impl Default for ContinueWatchingConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            feed_limit: default_feed_limit(),
            lookup_timeout_secs: default_lookup_timeout_secs(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            branch_timeout_secs: default_branch_timeout_secs(),
            per_source_limit: default_per_source_limit(),
            result_limit: default_result_limit(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.is_trakt_configured() {
            return Err(anyhow::anyhow!("Trakt client_id and client_secret must be configured"));
        }
        if self.tmdb.access_token.is_empty() || self.tmdb.access_token == "YOUR_ACCESS_TOKEN" {
            return Err(anyhow::anyhow!("TMDB access_token is not configured"));
        }
        if self.sync.page_size == 0 {
            return Err(anyhow::anyhow!("sync.page_size must be greater than zero"));
        }
        if self.sync.enrich_concurrency == 0 {
            return Err(anyhow::anyhow!("sync.enrich_concurrency must be greater than zero"));
        }
        if self.cache.virtual_list_page_size == 0 {
            return Err(anyhow::anyhow!("cache.virtual_list_page_size must be greater than zero"));
        }
        if self.cache.virtual_list_ttl_hours <= 0 || self.cache.ratings_ttl_days <= 0 {
            return Err(anyhow::anyhow!("cache TTLs must be positive"));
        }

        self.registry()?;
        Ok(())
    }

    pub fn is_trakt_configured(&self) -> bool {
        !self.trakt.client_id.is_empty()
            && self.trakt.client_id != "YOUR_CLIENT_ID"
            && !self.trakt.client_secret.is_empty()
            && self.trakt.client_secret != "YOUR_CLIENT_SECRET"
    }

    /// Build the list registry from `[[lists]]`, or the built-in table when none are configured.
    pub fn registry(&self) -> Result<SourceRegistry, RegistryError> {
        if self.lists.is_empty() {
            SourceRegistry::from_configs(&builtin_lists())
        } else {
            SourceRegistry::from_configs(&self.lists)
        }
    }
}
