use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsFile {
    #[serde(flatten)]
    entries: BTreeMap<String, String>,
}

/// OAuth token material for one account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredToken {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredToken {
    /// The access token, unless it expires within `margin` of `now`.
    ///
    /// A token with no recorded expiry is trusted.
    pub fn usable(&self, now: DateTime<Utc>, margin: Duration) -> Option<&str> {
        let token = self.access_token.as_deref()?;
        match self.expires_at {
            Some(expires_at) if expires_at <= now + margin => None,
            _ => Some(token),
        }
    }
}

/// Flat key/value credential file (`credentials.toml`).
///
/// Keys are namespaced by account type, e.g. `trakt_access_token`.
pub struct CredentialStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl CredentialStore {
    /// Read `path`; a missing file is an empty store.
    pub fn load(path: PathBuf) -> Result<Self> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str::<CredentialsFile>(&content)?.entries
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = CredentialsFile {
            entries: self.entries.clone(),
        };
        std::fs::write(&self.path, toml::to_string_pretty(&file)?)?;
        Ok(())
    }

    fn key(account: &str, field: &str) -> String {
        format!("{}_{}", account, field)
    }

    pub fn token(&self, account: &str) -> StoredToken {
        let field = |name: &str| self.entries.get(&Self::key(account, name)).cloned();
        StoredToken {
            access_token: field("access_token"),
            refresh_token: field("refresh_token"),
            expires_at: field("token_expires")
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }

    /// Replace every field of the account's token; `None` fields are removed.
    pub fn set_token(&mut self, account: &str, token: &StoredToken) {
        let fields = [
            ("access_token", token.access_token.clone()),
            ("refresh_token", token.refresh_token.clone()),
            ("token_expires", token.expires_at.map(|t| t.to_rfc3339())),
        ];
        for (name, value) in fields {
            let key = Self::key(account, name);
            match value {
                Some(value) => {
                    self.entries.insert(key, value);
                }
                None => {
                    self.entries.remove(&key);
                }
            }
        }
    }
}
