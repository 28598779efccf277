//! Retry loop: run a closure until success or the configuration says stop.

use super::kind::Failure;
use super::sleep::Sleeper;
use crate::configuration::{Configuration, RetryDecision, StopReason};
use std::future::Future;
use std::time::Duration;

/// Runs `op` until it succeeds or a failure is terminal.
///
/// On a retriable, unsuppressed failure with budget left, calls `on_retry`,
/// sleeps for the next backoff interval and tries again. Every terminal
/// failure is returned exactly as `op` produced it. With `retries = N` an
/// always-failing `op` runs `N + 1` times.
pub fn run_with_retry<T, E, F>(config: &Configuration, sleeper: &dyn Sleeper, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: Failure,
{
    let mut attempts_remaining = config.retries();
    let mut attempt = 1u32;
    loop {
        let failure = match op() {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        match config.decide(&failure, attempts_remaining) {
            RetryDecision::Stop(reason) => {
                log_stop(reason, &failure, attempt);
                return Err(failure);
            }
            RetryDecision::RetryAfter(wait) => {
                log_retry(&failure, attempt, attempts_remaining, wait);
                (config.on_retry())(&failure, attempts_remaining);
                sleeper.sleep(wait);
                attempts_remaining -= 1;
                attempt += 1;
            }
        }
    }
}

/// Async form of [`run_with_retry`]: same decisions, but the wait yields to
/// the tokio runtime instead of blocking the thread. Attempts stay strictly
/// sequential.
pub async fn run_with_retry_async<T, E, F, Fut>(config: &Configuration, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Failure,
{
    let mut attempts_remaining = config.retries();
    let mut attempt = 1u32;
    loop {
        let failure = match op().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        match config.decide(&failure, attempts_remaining) {
            RetryDecision::Stop(reason) => {
                log_stop(reason, &failure, attempt);
                return Err(failure);
            }
            RetryDecision::RetryAfter(wait) => {
                log_retry(&failure, attempt, attempts_remaining, wait);
                (config.on_retry())(&failure, attempts_remaining);
                tokio::time::sleep(wait).await;
                attempts_remaining -= 1;
                attempt += 1;
            }
        }
    }
}

fn log_retry(failure: &dyn Failure, attempt: u32, remaining: u32, wait: Duration) {
    tracing::debug!(
        attempt,
        remaining,
        kind = %failure.kind(),
        wait_ms = wait_ms(wait),
        "retrying after failure: {}",
        failure
    );
}

/// Saturates instead of truncating waits past `u64::MAX` milliseconds.
fn wait_ms(wait: Duration) -> u64 {
    u64::try_from(wait.as_millis()).unwrap_or(u64::MAX)
}

fn log_stop(reason: StopReason, failure: &dyn Failure, attempts: u32) {
    match reason {
        StopReason::Exhausted => tracing::warn!(
            attempts,
            kind = %failure.kind(),
            "giving up after {} attempts: {}",
            attempts,
            failure
        ),
        StopReason::NonRetriable | StopReason::Suppressed => tracing::debug!(
            attempts,
            kind = %failure.kind(),
            ?reason,
            "not retrying: {}",
            failure
        ),
    }
}
