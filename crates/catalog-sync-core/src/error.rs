use catalog_sync_config::RegistryError;
use catalog_sync_sources::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode snapshot: {0}")]
    Encode(String),
}

/// Why a single item could not be enriched. The item is skipped, the page goes on.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("'{title}' has no enrichment-provider ID")]
    MissingCrossReference { title: String },
    #[error("Enrichment call failed: {0}")]
    Failed(#[from] SourceError),
    #[error("Enrichment call '{0}' timed out")]
    Timeout(String),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    UnknownList(#[from] RegistryError),
    #[error("Page numbers start at 1 (got {0})")]
    InvalidPage(u32),
    #[error("List '{list_id}' is a community list and has no page {page}")]
    PaginationUnsupported { list_id: String, page: u32 },
    #[error("Failed to fetch list '{list_id}': {source}")]
    Upstream {
        list_id: String,
        #[source]
        source: SourceError,
    },
}

#[derive(Debug, Error)]
pub enum ContinueWatchingError {
    #[error("Failed to fetch {step}: {source}")]
    Upstream {
        step: &'static str,
        #[source]
        source: SourceError,
    },
}

#[derive(Debug, Error)]
pub enum VirtualListError {
    #[error("Failed to fetch virtual list {view}: {source}")]
    Upstream {
        view: String,
        #[source]
        source: SourceError,
    },
}

#[derive(Debug, Error)]
pub enum RatingsError {
    #[error("Failed to fetch ratings: {0}")]
    Upstream(#[from] SourceError),
    #[error("No catalog record for {0}")]
    UnknownItem(String),
    #[error("'{0}' has no catalog-provider ID")]
    MissingCatalogId(String),
}
