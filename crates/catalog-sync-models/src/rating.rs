use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::media::MediaKind;

/// Aggregate score for one catalog-provider item, cached with its own TTL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingsRecord {
    pub kind: MediaKind,
    pub trakt_id: u64,
    pub rating: f32,
    pub votes: u32,
    pub fetched_at: DateTime<Utc>,
}

impl RatingsRecord {
    /// Valid only while `now - fetched_at < ttl`.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.fetched_at < ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshness_boundary() {
        let now = Utc::now();
        let ttl = Duration::days(7);
        let record = RatingsRecord {
            kind: MediaKind::Movie,
            trakt_id: 1,
            rating: 8.1,
            votes: 1200,
            fetched_at: now - ttl,
        };
        assert!(!record.is_fresh(now, ttl));
        assert!(record.is_fresh(now - Duration::milliseconds(1), ttl));
    }
}
