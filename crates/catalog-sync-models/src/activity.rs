use serde::{Deserialize, Serialize};

use crate::media::ListedItem;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpisodeRef {
    pub season: u32,
    pub number: u32,
    pub title: Option<String>,
    pub trakt_id: Option<u64>,
}

/// What a playback or history event refers to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum WatchTarget {
    Movie { movie: ListedItem },
    Episode { show: ListedItem, episode: EpisodeRef },
}

impl WatchTarget {
    /// Catalog-provider ID of the show, for episode targets.
    pub fn show_id(&self) -> Option<u64> {
        match self {
            WatchTarget::Movie { .. } => None,
            WatchTarget::Episode { show, .. } => show.ids.trakt,
        }
    }
}

/// A partially watched movie or episode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaybackProgress {
    /// Percent watched, 0-100.
    pub progress: f32,
    /// ISO-8601 timestamp as reported upstream.
    pub paused_at: String,
    pub target: WatchTarget,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEvent {
    /// ISO-8601 timestamp as reported upstream.
    pub watched_at: String,
    pub target: WatchTarget,
}
