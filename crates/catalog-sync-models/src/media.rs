use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::media_ids::ProviderIds;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Show,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Show => "show",
        }
    }

    /// Plural path segment used by catalog endpoints ("movies", "shows").
    pub fn plural(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movies",
            MediaKind::Show => "shows",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "movie" | "movies" => Ok(MediaKind::Movie),
            "show" | "shows" | "tv" => Ok(MediaKind::Show),
            other => Err(format!("Unknown media kind: {}", other)),
        }
    }
}

/// A bare item as returned by a catalog listing: title plus provider IDs, nothing enriched yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListedItem {
    pub kind: MediaKind,
    pub title: String,
    pub year: Option<i32>,
    pub ids: ProviderIds,
}

impl ListedItem {
    pub fn new(kind: MediaKind, title: impl Into<String>, ids: ProviderIds) -> Self {
        Self {
            kind,
            title: title.into(),
            year: None,
            ids,
        }
    }
}
