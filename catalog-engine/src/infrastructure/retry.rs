//! # Retry
//!
//! Exponential backoff for transient store errors, per spec.md §4.1:
//! base 100 ms, factor 2, max 5 tries. Only `CatalogError::is_recoverable`
//! errors are retried; anything else is returned immediately.

use std::time::Duration;

use catalog_domain::CatalogError;

pub struct RetryPolicy {
    pub base: Duration,
    pub factor: u32,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(100),
            factor: 2,
            max_attempts: 5,
        }
    }
}

pub async fn with_backoff<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, CatalogError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, CatalogError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_recoverable() && attempt + 1 < policy.max_attempts => {
                let delay = policy.base * policy.factor.pow(attempt);
                tracing::debug!(attempt, ?delay, error = %err, "retrying after transient error");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
