pub mod activity;
pub mod catalog_item;
pub mod continue_watching;
pub mod details;
pub mod media;
pub mod media_ids;
pub mod rating;
pub mod search;
pub mod virtual_list;

pub use activity::{EpisodeRef, HistoryEvent, PlaybackProgress, WatchTarget};
pub use catalog_item::{CastMember, CatalogItem, CollectionRef, ListOrders, SimilarItem};
pub use continue_watching::ContinueWatchingEntry;
pub use details::{ArtworkImage, Credit, ImageSet, TitleDetails, TitleSummary};
pub use media::{ListedItem, MediaKind};
pub use media_ids::ProviderIds;
pub use rating::RatingsRecord;
pub use search::{PersonHit, SearchHit, SearchResults, SearchSource};
pub use virtual_list::{ItemRef, ViewKey, ViewType, VirtualListEntry, VirtualListItem};
