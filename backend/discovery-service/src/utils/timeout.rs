/// Timeout wrapper for store reads
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::db::{StoreError, StoreResult};

/// Run a store future, mapping an elapsed deadline to `StoreError::Timeout`
pub async fn run_with_timeout<F, T>(duration: Duration, future: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(duration)),
    }
}
