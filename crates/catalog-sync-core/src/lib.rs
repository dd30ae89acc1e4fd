pub mod clock;
pub mod continue_watching;
pub mod enrichment;
pub mod error;
pub mod fanout;
pub mod ratings;
pub mod search;
pub mod storage;
pub mod store;
pub mod sync;
pub mod virtual_list;

#[cfg(test)]
mod test_support;

pub use clock::{Clock, ManualClock, SystemClock};
pub use continue_watching::ContinueWatchingResolver;
pub use enrichment::{merge, EnrichmentService, ImageUrls, ListOrder, OwnedFields, PartialRecord};
pub use error::{
    ContinueWatchingError, EnrichmentError, RatingsError, StoreError, SyncError, VirtualListError,
};
pub use fanout::BranchError;
pub use ratings::RatingsCache;
pub use search::SearchService;
pub use storage::SnapshotStorage;
pub use store::{CatalogStore, StoreTables};
pub use sync::{SyncOrchestrator, SyncReport};
pub use virtual_list::{DataSource, SweepReport, ViewRequest, VirtualListCache};
