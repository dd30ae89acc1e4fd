use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::media::MediaKind;

/// Kind of externally defined view a virtual list backs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ViewType {
    Network,
    Collection,
    Director,
    TraktList,
}

impl ViewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewType::Network => "network",
            ViewType::Collection => "collection",
            ViewType::Director => "director",
            ViewType::TraktList => "trakt_list",
        }
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "network" => Ok(ViewType::Network),
            "collection" => Ok(ViewType::Collection),
            "director" => Ok(ViewType::Director),
            "trakt_list" | "list" => Ok(ViewType::TraktList),
            other => Err(format!("Unknown view type: {}", other)),
        }
    }
}

/// Composite key `(view_type, item_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewKey {
    pub view_type: ViewType,
    pub item_id: String,
}

impl ViewKey {
    pub fn new(view_type: ViewType, item_id: impl Into<String>) -> Self {
        Self {
            view_type,
            item_id: item_id.into(),
        }
    }
}

impl fmt::Display for ViewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.view_type, self.item_id)
    }
}

/// Reference to a catalog record; the record itself lives in the catalog store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ItemRef {
    pub kind: MediaKind,
    pub tmdb_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VirtualListEntry {
    pub key: ViewKey,
    pub item_name: Option<String>,
    pub background_url: Option<String>,
    pub data_url: String,
    pub last_updated: DateTime<Utc>,
    pub total_items: u32,
    /// Upstream items consumed so far, including ones that were skipped.
    pub fetched_items: u32,
    pub page: u32,
    pub page_size: u32,
}

impl VirtualListEntry {
    /// Valid only while `now - last_updated < ttl`.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.last_updated < ttl
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VirtualListItem {
    pub item: ItemRef,
    pub order_index: u32,
    pub added_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_key_display() {
        let key = ViewKey::new(ViewType::TraktList, "marvel");
        assert_eq!(key.to_string(), "trakt_list:marvel");
    }

    #[test]
    fn parse_view_type() {
        assert_eq!("director".parse::<ViewType>(), Ok(ViewType::Director));
        assert!("genre".parse::<ViewType>().is_err());
    }
}
