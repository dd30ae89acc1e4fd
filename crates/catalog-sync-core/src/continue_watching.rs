use catalog_sync_config::ContinueWatchingConfig;
use catalog_sync_models::{ContinueWatchingEntry, HistoryEvent, ListedItem, WatchTarget};
use catalog_sync_sources::{TokenProvider, WatchActivityProvider};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::ContinueWatchingError;
use crate::fanout::guarded;
use crate::store::CatalogStore;

const TRAKT_ACCOUNT: &str = "trakt";

/// Builds the continue-watching feed from playback progress, watch history
/// and per-show next-episode lookups.
///
/// Stateless across calls: every resolution rebuilds the feed and replaces
/// the stored one wholesale.
pub struct ContinueWatchingResolver {
    activity: Arc<dyn WatchActivityProvider>,
    tokens: Arc<dyn TokenProvider>,
    store: Arc<CatalogStore>,
    config: ContinueWatchingConfig,
}

impl ContinueWatchingResolver {
    pub fn new(
        activity: Arc<dyn WatchActivityProvider>,
        tokens: Arc<dyn TokenProvider>,
        store: Arc<CatalogStore>,
        config: ContinueWatchingConfig,
    ) -> Self {
        Self {
            activity,
            tokens,
            store,
            config,
        }
    }

    #[instrument(skip(self), fields(operation = "continue_watching"))]
    pub async fn resolve(&self) -> Result<Vec<ContinueWatchingEntry>, ContinueWatchingError> {
        let feed = match self.tokens.valid_access_token(TRAKT_ACCOUNT).await {
            Some(token) => self.build(&token).await?,
            None => {
                info!("No access token, continue-watching feed is empty");
                Vec::new()
            }
        };

        let stored = feed.clone();
        self.store
            .transaction(|tx| {
                tx.replace_continue_watching(stored);
                Ok::<_, Infallible>(())
            })
            .await
            .unwrap_or_else(|never| match never {});

        Ok(feed)
    }

    async fn build(
        &self,
        token: &str,
    ) -> Result<Vec<ContinueWatchingEntry>, ContinueWatchingError> {
        let (playback, history) = tokio::join!(
            self.activity.playback(token),
            self.activity.history(token, self.config.history_limit),
        );
        let playback = playback.map_err(|source| ContinueWatchingError::Upstream {
            step: "playback progress",
            source,
        })?;
        let history = history.map_err(|source| ContinueWatchingError::Upstream {
            step: "watch history",
            source,
        })?;

        let mut feed = Vec::with_capacity(playback.len());
        let mut represented = HashSet::new();
        for item in playback {
            if let Some(show_id) = item.target.show_id() {
                represented.insert(show_id);
            }
            feed.push(match item.target {
                WatchTarget::Movie { movie } => ContinueWatchingEntry::MovieInProgress {
                    movie,
                    progress: item.progress,
                    last_watched_at: item.paused_at,
                },
                WatchTarget::Episode { show, episode } => {
                    ContinueWatchingEntry::EpisodeInProgress {
                        show,
                        episode,
                        progress: item.progress,
                        last_watched_at: item.paused_at,
                    }
                }
            });
        }

        let candidates: Vec<(u64, ListedItem, String)> = latest_per_show(history)
            .into_iter()
            .filter(|(show_id, _, _)| !represented.contains(show_id))
            .collect();
        debug!(
            in_progress = feed.len(),
            lookups = candidates.len(),
            "Looking up next episodes"
        );

        let timeout = Duration::from_secs(self.config.lookup_timeout_secs);
        let lookups = candidates.iter().map(|(show_id, _, _)| {
            guarded(
                "next_episode",
                timeout,
                self.activity.next_episode(token, *show_id),
            )
        });
        let results = join_all(lookups).await;

        for ((show_id, show, watched_at), result) in candidates.into_iter().zip(results) {
            match result {
                Ok(Some(episode)) => feed.push(ContinueWatchingEntry::EpisodeNextUp {
                    show,
                    episode,
                    last_watched_at: watched_at,
                }),
                Ok(None) => debug!(show_id, "Show is fully watched"),
                Err(e) => warn!(show_id, error = %e, "Omitting show from continue-watching"),
            }
        }

        // Stable sort keeps upstream order among equal timestamps
        feed.sort_by_key(|entry| std::cmp::Reverse(entry.recency()));
        feed.truncate(self.config.feed_limit);
        Ok(feed)
    }
}

/// Most recent history event per show, as `(show_id, show, watched_at)`.
fn latest_per_show(history: Vec<HistoryEvent>) -> Vec<(u64, ListedItem, String)> {
    let mut latest: HashMap<u64, (i64, ListedItem, String)> = HashMap::new();
    for event in history {
        let WatchTarget::Episode { show, .. } = event.target else {
            continue;
        };
        let Some(show_id) = show.ids.trakt else {
            continue;
        };
        let recency = chrono::DateTime::parse_from_rfc3339(&event.watched_at)
            .map(|dt| dt.timestamp_millis())
            .unwrap_or(0);
        match latest.get(&show_id) {
            Some((seen, _, _)) if *seen >= recency => {}
            _ => {
                latest.insert(show_id, (recency, show, event.watched_at));
            }
        }
    }
    let mut shows: Vec<(u64, ListedItem, String)> = latest
        .into_iter()
        .map(|(id, (_, show, at))| (id, show, at))
        .collect();
    shows.sort_by_key(|(id, _, _)| *id);
    shows
}
