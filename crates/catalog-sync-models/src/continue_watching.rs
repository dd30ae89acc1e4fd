use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::activity::EpisodeRef;
use crate::media::ListedItem;

/// One row of the continue-watching feed.
///
/// Timestamps are kept as the upstream strings; `recency()` is what the
/// feed sorts on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ContinueWatchingEntry {
    MovieInProgress {
        movie: ListedItem,
        progress: f32,
        last_watched_at: String,
    },
    EpisodeInProgress {
        show: ListedItem,
        episode: EpisodeRef,
        progress: f32,
        last_watched_at: String,
    },
    EpisodeNextUp {
        show: ListedItem,
        episode: EpisodeRef,
        last_watched_at: String,
    },
}

impl ContinueWatchingEntry {
    pub fn last_watched_at(&self) -> &str {
        match self {
            ContinueWatchingEntry::MovieInProgress { last_watched_at, .. }
            | ContinueWatchingEntry::EpisodeInProgress { last_watched_at, .. }
            | ContinueWatchingEntry::EpisodeNextUp { last_watched_at, .. } => last_watched_at,
        }
    }

    /// Milliseconds since the epoch. Unparseable timestamps count as 0 so they sort last.
    pub fn recency(&self) -> i64 {
        DateTime::parse_from_rfc3339(self.last_watched_at())
            .map(|dt| dt.timestamp_millis())
            .unwrap_or(0)
    }

    pub fn progress(&self) -> Option<f32> {
        match self {
            ContinueWatchingEntry::MovieInProgress { progress, .. }
            | ContinueWatchingEntry::EpisodeInProgress { progress, .. } => Some(*progress),
            ContinueWatchingEntry::EpisodeNextUp { .. } => None,
        }
    }

    pub fn show_id(&self) -> Option<u64> {
        match self {
            ContinueWatchingEntry::MovieInProgress { .. } => None,
            ContinueWatchingEntry::EpisodeInProgress { show, .. }
            | ContinueWatchingEntry::EpisodeNextUp { show, .. } => show.ids.trakt,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ContinueWatchingEntry::MovieInProgress { movie, .. } => &movie.title,
            ContinueWatchingEntry::EpisodeInProgress { show, .. }
            | ContinueWatchingEntry::EpisodeNextUp { show, .. } => &show.title,
        }
    }
}
