use catalog_sync_sources::SourceError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// One failed branch of a concurrent fan-out.
#[derive(Debug, Error)]
pub enum BranchError {
    #[error("{label} timed out after {timeout:?}")]
    Timeout { label: String, timeout: Duration },
    #[error("{label} failed: {source}")]
    Failed {
        label: String,
        #[source]
        source: SourceError,
    },
}

/// Run one branch with its own deadline. Never panics or cancels siblings;
/// the caller decides whether a failure degrades or propagates.
pub async fn guarded<T, F>(label: &str, timeout: Duration, fut: F) -> Result<T, BranchError>
where
    F: Future<Output = Result<T, SourceError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => {
            debug!(branch = label, error = %source, "Branch failed");
            Err(BranchError::Failed {
                label: label.to_string(),
                source,
            })
        }
        Err(_) => {
            debug!(branch = label, ?timeout, "Branch timed out");
            Err(BranchError::Timeout {
                label: label.to_string(),
                timeout,
            })
        }
    }
}

/// Degrade a failed branch to its empty value.
pub fn or_empty<T: Default>(result: Result<T, BranchError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Branch degraded to empty result");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_slow_branch_times_out_without_blocking_others() {
        let slow = guarded("slow", Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, SourceError>(vec![1])
        });
        let fast = guarded("fast", Duration::from_millis(500), async {
            Ok::<_, SourceError>(vec![2])
        });
        let failing = guarded("failing", Duration::from_millis(500), async {
            Err::<Vec<i32>, _>(SourceError::Transient("503".to_string()))
        });

        let (slow, fast, failing) = tokio::join!(slow, fast, failing);

        assert!(matches!(slow, Err(BranchError::Timeout { .. })));
        assert_eq!(fast.unwrap(), vec![2]);
        assert!(matches!(failing, Err(BranchError::Failed { .. })));
    }

    #[test]
    fn test_or_empty() {
        let failed: Result<Vec<u8>, BranchError> = Err(BranchError::Timeout {
            label: "x".to_string(),
            timeout: Duration::from_millis(1),
        });
        assert!(or_empty(failed).is_empty());
    }
}
