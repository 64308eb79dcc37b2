//! Timeout helper.

use std::future::Future;
use std::time::Duration;

/// Run `future` to completion within an optional limit.
///
/// Returns `None` when the limit elapsed first; the future is dropped at its
/// last await point.
pub async fn with_timeout<T>(limit: Option<Duration>, future: impl Future<Output = T>) -> Option<T> {
    match limit {
        Some(duration) => tokio::time::timeout(duration, future).await.ok(),
        None => Some(future.await),
    }
}
