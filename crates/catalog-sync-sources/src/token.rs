use async_trait::async_trait;
use catalog_sync_config::{CredentialStore, TraktConfig};
use chrono::{Duration, Utc};
use reqwest::Client;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::traits::TokenProvider;
use crate::trakt::{auth, refresh_access_token};

/// Token provider backed by the credential file.
///
/// Tokens expiring within the refresh margin are refreshed through the
/// OAuth refresh grant and written back before being handed out.
pub struct CredentialTokenProvider {
    credentials_path: PathBuf,
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    refresh_margin: Duration,
    // Serializes load-check-refresh-save so two callers never burn the same refresh token
    refresh_lock: Mutex<()>,
}

impl CredentialTokenProvider {
    pub fn new(credentials_path: PathBuf, config: &TraktConfig, timeout: std::time::Duration) -> Self {
        Self {
            credentials_path,
            client: auth::http_client(timeout),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            refresh_margin: Duration::minutes(5),
            refresh_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl TokenProvider for CredentialTokenProvider {
    async fn valid_access_token(&self, account: &str) -> Option<String> {
        if account != "trakt" {
            warn!(account, "No token source for account type");
            return None;
        }

        let _guard = self.refresh_lock.lock().await;

        let mut store = match CredentialStore::load(self.credentials_path.clone()) {
            Ok(store) => store,
            Err(e) => {
                warn!(account, error = %e, "Failed to load credentials");
                return None;
            }
        };

        let saved = store.token(account);
        if let Some(token) = saved.usable(Utc::now(), self.refresh_margin) {
            debug!(account, expires_at = ?saved.expires_at, "Using saved access token");
            return Some(token.to_string());
        }

        let Some(refresh_token) = saved.refresh_token.as_deref() else {
            debug!(account, "No usable access token and no refresh token");
            return None;
        };
        info!(account, expires_at = ?saved.expires_at, "Access token expiring, refreshing");

        match refresh_access_token(
            &self.client,
            &self.base_url,
            &self.client_id,
            &self.client_secret,
            refresh_token,
        )
        .await
        {
            Ok(fresh) => {
                store.set_token(account, &fresh);
                if let Err(e) = store.save() {
                    warn!(account, error = %e, "Refreshed token but failed to save credentials");
                }
                info!(account, "Refreshed access token");
                fresh.access_token
            }
            Err(e) => {
                warn!(account, error = %e, "Failed to refresh access token");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_sync_config::StoredToken;

    fn provider(path: PathBuf) -> CredentialTokenProvider {
        let config = TraktConfig {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            // Nothing listens here, so any refresh attempt fails fast
            base_url: "http://127.0.0.1:9".to_string(),
        };
        CredentialTokenProvider::new(path, &config, std::time::Duration::from_secs(2))
    }

    fn write_token(path: &PathBuf, token: StoredToken) {
        let mut store = CredentialStore::load(path.clone()).unwrap();
        store.set_token("trakt", &token);
        store.save().unwrap();
    }

    #[tokio::test]
    async fn test_returns_unexpired_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        write_token(
            &path,
            StoredToken {
                access_token: Some("live".to_string()),
                refresh_token: None,
                expires_at: Some(Utc::now() + Duration::hours(2)),
            },
        );

        assert_eq!(provider(path).valid_access_token("trakt").await.as_deref(), Some("live"));
    }

    #[tokio::test]
    async fn test_near_expiry_without_refresh_token_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        write_token(
            &path,
            StoredToken {
                access_token: Some("stale".to_string()),
                refresh_token: None,
                expires_at: Some(Utc::now() + Duration::minutes(2)),
            },
        );

        assert_eq!(provider(path).valid_access_token("trakt").await, None);
    }

    #[tokio::test]
    async fn test_failed_refresh_is_none_and_keeps_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        write_token(
            &path,
            StoredToken {
                access_token: Some("stale".to_string()),
                refresh_token: Some("refresh".to_string()),
                expires_at: Some(Utc::now() - Duration::minutes(1)),
            },
        );

        assert_eq!(provider(path.clone()).valid_access_token("trakt").await, None);

        let reloaded = CredentialStore::load(path).unwrap().token("trakt");
        assert_eq!(reloaded.refresh_token.as_deref(), Some("refresh"));
    }

    #[tokio::test]
    async fn test_unknown_account_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            provider(dir.path().join("credentials.toml")).valid_access_token("plex").await,
            None
        );
    }
}
