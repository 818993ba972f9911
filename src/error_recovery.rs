// src/error_recovery.rs
//! Retry with exponential backoff for API operations.

use std::time::Duration;

/// Retries an async operation with exponential backoff.
///
/// Only errors for which `is_retryable` returns `true` are retried; any
/// other error, or the error of the final attempt, is returned as-is.
pub async fn retry_with_backoff<F, T, E, Fut, R>(
    mut operation: F,
    is_retryable: R,
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut delay = initial_delay;
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_attempts && is_retryable(&e) => {
                log::warn!(
                    "Attempt {} failed ({}), retrying after {:?}",
                    attempt,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;

                // Exponential backoff with cap
                delay = std::cmp::min(delay * 2, max_delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
