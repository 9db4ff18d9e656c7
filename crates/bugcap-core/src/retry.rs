// SPDX-License-Identifier: Apache-2.0

//! Retry logic with exponential backoff for transient failures.
//!
//! Provides helpers to detect retryable errors and configure exponential backoff
//! with jitter for completion requests.

use std::time::Duration;

use backon::ExponentialBuilder;

use crate::error::BugcapError;

/// Maximum retry-after delay to prevent excessive waits (120 seconds).
const MAX_RETRY_AFTER_SECS: u64 = 120;

/// Determines if an HTTP status code is retryable.
///
/// Retryable status codes are 429, 500, 502, 503 and 504.
#[must_use]
pub fn is_retryable_http(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Determines if an anyhow error is retryable.
///
/// Checks the error for a retryable HTTP status, a reqwest timeout/connect
/// failure, or a `BugcapError` that signals a transient condition.
#[must_use]
pub fn is_retryable_anyhow(e: &anyhow::Error) -> bool {
    if let Some(req_err) = e.downcast_ref::<reqwest::Error>() {
        return is_retryable_reqwest(req_err);
    }

    if let Some(err) = e.downcast_ref::<BugcapError>() {
        return match err {
            BugcapError::RateLimited { .. } => true,
            BugcapError::Upstream {
                status: Some(status),
                ..
            } => is_retryable_http(*status),
            BugcapError::Network(req_err) => is_retryable_reqwest(req_err),
            _ => false,
        };
    }

    false
}

fn is_retryable_reqwest(err: &reqwest::Error) -> bool {
    if err.is_timeout() || err.is_connect() {
        return true;
    }
    err.status()
        .is_some_and(|status| is_retryable_http(status.as_u16()))
}

/// Creates a configured exponential backoff builder for retries.
///
/// Factor 2, 1 second minimum delay, 3 retries, jitter enabled.
#[must_use]
pub fn retry_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_factor(2.0)
        .with_min_delay(Duration::from_secs(1))
        .with_max_times(3)
        .with_jitter()
}

/// Extracts the `retry_after` delay from a `RateLimited` error, capped at
/// two minutes. Returns `None` for other errors or a zero delay.
#[must_use]
pub fn extract_retry_after(e: &anyhow::Error) -> Option<Duration> {
    if let Some(BugcapError::RateLimited { retry_after, .. }) = e.downcast_ref::<BugcapError>()
        && *retry_after > 0
    {
        let capped = (*retry_after).min(MAX_RETRY_AFTER_SECS);
        return Some(Duration::from_secs(capped));
    }
    None
}
