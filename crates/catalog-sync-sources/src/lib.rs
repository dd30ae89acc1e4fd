pub mod error;
pub mod tmdb;
pub mod token;
pub mod traits;
pub mod trakt;

pub use error::SourceError;
pub use tmdb::TmdbClient;
pub use token::CredentialTokenProvider;
pub use traits::{
    AggregateRating, CatalogProvider, EnrichmentProvider, PersonSummary, TokenProvider,
    WatchActivityProvider,
};
pub use trakt::TraktClient;
