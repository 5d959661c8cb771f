//! Retry utilities: backoff builders and transient-error classification.
//!
//! Uses `backon` for exponential backoff with jitter. Only idempotent
//! store reads retry; writes and whole engine operations never do.

use std::time::Duration;

use backon::ExponentialBuilder;

/// Backoff for idempotent record store reads.
///
/// - Min delay: 100ms
/// - Max delay: 2s
/// - Max attempts: 3
/// - Jitter enabled
pub fn read_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_secs(2))
        .with_max_times(3)
        .with_jitter()
}

/// Whether a transport error is worth retrying (timeouts and failed
/// connects only; anything else will not improve on its own).
pub fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Whether an HTTP status is worth retrying: 429 and 5xx.
pub fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}
