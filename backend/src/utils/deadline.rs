use crate::errors::{ServiceError, ServiceResult};
use std::future::Future;
use std::time::Duration;

/// Runs a datastore call under `timeout`; an elapsed deadline is a storage error.
pub async fn with_deadline<T, F>(timeout: Duration, operation: &str, fut: F) -> ServiceResult<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(ServiceError::from),
        Err(_) => Err(ServiceError::storage(format!(
            "{} exceeded {}ms deadline",
            operation,
            timeout.as_millis()
        ))),
    }
}
