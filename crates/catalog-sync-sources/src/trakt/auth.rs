use catalog_sync_config::StoredToken;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

const REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Shared HTTP client for Trakt calls.
pub fn http_client(timeout: std::time::Duration) -> Client {
    Client::builder()
        .user_agent(concat!("catalogsync/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
}

impl TokenResponse {
    // Expiry is pulled in by two minutes so callers refresh early
    fn into_stored(self) -> StoredToken {
        StoredToken {
            access_token: Some(self.access_token),
            refresh_token: Some(self.refresh_token),
            expires_at: Some(Utc::now() + Duration::seconds(self.expires_in - 120)),
        }
    }
}

/// Exchange a refresh token for a new token set.
pub async fn refresh_access_token(
    client: &Client,
    base_url: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<StoredToken, SourceError> {
    let grant = RefreshGrant {
        refresh_token,
        client_id,
        client_secret,
        redirect_uri: REDIRECT_URI,
        grant_type: "refresh_token",
    };

    let response = client
        .post(format!("{}/oauth/token", base_url))
        .header("Accept", "application/json")
        .json(&grant)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::from_status(status, body));
    }

    Ok(response.json::<TokenResponse>().await?.into_stored())
}
