pub mod config;
pub mod credentials;
pub mod paths;
pub mod registry;

pub use config::{
    default_scheduler_config, CacheConfig, Config, ContinueWatchingConfig, ListConfig,
    SchedulerConfig, SearchConfig, SyncOptions, TmdbConfig, TraktConfig,
};
pub use credentials::{CredentialStore, StoredToken};
pub use paths::PathManager;
pub use registry::{builtin_lists, ListEndpoint, ListSource, RegistryError, SourceRegistry};
