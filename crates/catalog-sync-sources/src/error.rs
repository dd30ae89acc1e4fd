use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to an upstream provider.
///
/// The core never retries; callers that want a retry policy can use
/// [`SourceError::is_transient`] to decide.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SourceError {
    #[error("Transient upstream failure: {0}")]
    Transient(String),
    #[error("Upstream rejected request: {status} - {body}")]
    Rejected { status: u16, body: String },
    #[error("Failed to decode upstream response: {0}")]
    Decode(String),
    #[error("Not authenticated")]
    Unauthenticated,
}

impl SourceError {
    pub fn from_status(status: StatusCode, body: String) -> Self {
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            SourceError::Transient(format!("{} - {}", status, body))
        } else if status == StatusCode::UNAUTHORIZED {
            SourceError::Unauthenticated
        } else {
            SourceError::Rejected {
                status: status.as_u16(),
                body,
            }
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Transient(_))
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            SourceError::from_status(status, err.to_string())
        } else {
            SourceError::Transient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(SourceError::from_status(StatusCode::BAD_GATEWAY, String::new()).is_transient());
        assert!(SourceError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()).is_transient());
        assert_eq!(
            SourceError::from_status(StatusCode::UNAUTHORIZED, String::new()),
            SourceError::Unauthenticated
        );
        assert_eq!(
            SourceError::from_status(StatusCode::NOT_FOUND, "missing".to_string()),
            SourceError::Rejected {
                status: 404,
                body: "missing".to_string()
            }
        );
    }
}
