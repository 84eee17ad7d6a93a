//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap probe and smoke-test calls with their per-attempt timeout
//! - Cancel the wrapped operation cleanly on expiry (the future is dropped)
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timed out after {}ms", .limit.as_millis())]
pub struct TimedOut {
    pub limit: Duration,
}

/// Run `fut`, giving up after `limit`.
pub async fn enforce<F>(limit: Duration, fut: F) -> Result<F::Output, TimedOut>
where
    F: Future,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| TimedOut { limit })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_enforce_times_out() {
        let result = enforce(Duration::from_millis(50), tokio::time::sleep(Duration::from_secs(1))).await;
        let err = result.unwrap_err();
        assert_eq!(err.limit, Duration::from_millis(50));
        assert_eq!(err.to_string(), "timed out after 50ms");
    }

    #[tokio::test]
    async fn test_enforce_passes_value_through() {
        let value = enforce(Duration::from_secs(1), async { 42 }).await;
        assert_eq!(value, Ok(42));
    }
}
