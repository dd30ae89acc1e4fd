use catalog_sync_config::{Config, PathManager, SourceRegistry};
use catalog_sync_core::{
    CatalogStore, Clock, ContinueWatchingResolver, EnrichmentService, ImageUrls, RatingsCache,
    SearchService, SnapshotStorage, SyncOrchestrator, SystemClock, VirtualListCache,
};
use catalog_sync_sources::{CredentialTokenProvider, TmdbClient, TraktClient};
use chrono::Duration as ChronoDuration;
use color_eyre::eyre::{eyre, Context};
use color_eyre::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Everything a command needs, built once from the config file.
pub struct AppContext {
    pub config: Config,
    pub paths: PathManager,
    pub store: Arc<CatalogStore>,
    storage: SnapshotStorage,
    clock: Arc<dyn Clock>,
    registry: Arc<SourceRegistry>,
    trakt: Arc<TraktClient>,
    tmdb: Arc<TmdbClient>,
    enrichment: Arc<EnrichmentService>,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let paths = PathManager::default();
        let config_file = paths.config_file();
        let config = Config::load_from_file(&config_file)
            .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
        Self::from_config(config, paths)
    }

    pub fn from_config(config: Config, paths: PathManager) -> Result<Self> {
        config
            .validate()
            .map_err(|e| eyre!("Configuration validation failed: {}", e))?;
        paths
            .ensure_directories()
            .map_err(|e| eyre!("Failed to create data directories: {}", e))?;

        let registry = Arc::new(config.registry()?);
        let storage = SnapshotStorage::new(&paths.store_snapshot_file());
        let store = Arc::new(
            storage
                .open_store()
                .wrap_err_with(|| format!("Failed to open store at {}", storage.path().display()))?,
        );
        debug!(snapshot = %storage.path().display(), "Opened catalog store");

        let timeout = Duration::from_secs(config.sync.request_timeout_secs);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let trakt = Arc::new(TraktClient::new(&config.trakt, timeout));
        let tmdb = Arc::new(TmdbClient::new(&config.tmdb, timeout));
        let enrichment = Arc::new(EnrichmentService::new(
            tmdb.clone(),
            store.clone(),
            clock.clone(),
            ImageUrls::new(&config.tmdb.image_base_url),
            timeout,
        ));

        Ok(Self {
            config,
            paths,
            store,
            storage,
            clock,
            registry,
            trakt,
            tmdb,
            enrichment,
        })
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn sync_orchestrator(&self) -> SyncOrchestrator {
        SyncOrchestrator::new(
            self.registry.clone(),
            self.trakt.clone(),
            self.enrichment.clone(),
            self.store.clone(),
            self.clock.clone(),
            self.config.sync.clone(),
        )
    }

    pub fn ratings_cache(&self) -> RatingsCache {
        RatingsCache::new(
            self.trakt.clone(),
            self.store.clone(),
            self.clock.clone(),
            ChronoDuration::days(self.config.cache.ratings_ttl_days),
        )
    }

    pub fn continue_watching(&self) -> ContinueWatchingResolver {
        let tokens = CredentialTokenProvider::new(
            self.paths.credentials_file(),
            &self.config.trakt,
            Duration::from_secs(self.config.sync.request_timeout_secs),
        );
        ContinueWatchingResolver::new(
            self.trakt.clone(),
            Arc::new(tokens),
            self.store.clone(),
            self.config.continue_watching.clone(),
        )
    }

    pub fn virtual_lists(&self) -> VirtualListCache {
        VirtualListCache::new(
            self.trakt.clone(),
            self.enrichment.clone(),
            self.store.clone(),
            self.clock.clone(),
            ChronoDuration::hours(self.config.cache.virtual_list_ttl_hours),
            self.config.cache.virtual_list_page_size,
        )
    }

    pub fn search(&self) -> SearchService {
        SearchService::new(
            self.trakt.clone(),
            self.tmdb.clone(),
            ImageUrls::new(&self.config.tmdb.image_base_url),
            self.config.search.clone(),
        )
    }

    /// Write the store snapshot if anything changed.
    pub async fn persist(&self) -> Result<()> {
        let saved = self
            .storage
            .persist(&self.store)
            .await
            .wrap_err("Failed to save store snapshot")?;
        debug!(saved, "Persisted store");
        Ok(())
    }
}
