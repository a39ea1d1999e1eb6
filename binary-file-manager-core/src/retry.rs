//! Bounded polling.
//!
//! The host store and plugin registry can lag behind the events we react to,
//! so lookups are retried on a fixed interval until they succeed or the
//! attempt ceiling is hit. The ceiling is the only timeout; there is no
//! cancellation token.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_ATTEMPTS: u32 = 1000;
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait between two consecutive polls.
    pub interval: Duration,
    /// Maximum number of polls. Zero is treated as one.
    pub attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            attempts: DEFAULT_ATTEMPTS,
        }
    }
}

/// YAML-facing shape of a [`RetryPolicy`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub attempts: u32,
    pub interval_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            interval_ms: DEFAULT_INTERVAL.as_millis() as u64,
        }
    }
}

impl From<RetrySection> for RetryPolicy {
    fn from(section: RetrySection) -> Self {
        Self {
            interval: Duration::from_millis(section.interval_ms),
            attempts: section.attempts,
        }
    }
}

/// Poll until `accept` holds, sleeping `policy.interval` between polls.
///
/// Returns the first accepted value, or the last polled value once the
/// attempts are exhausted.
pub async fn retry<T, F, Fut, P>(mut poll: F, policy: RetryPolicy, mut accept: P) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = T>,
    P: FnMut(&T) -> bool,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        let value = poll().await;
        if accept(&value) || attempt >= attempts {
            if attempt > 1 {
                debug!(attempt, attempts, "Retry loop finished");
            }
            return value;
        }
        attempt += 1;
        tokio::time::sleep(policy.interval).await;
    }
}

/// [`retry`] with "present" as the success predicate.
pub async fn retry_until_some<T, F, Fut>(poll: F, policy: RetryPolicy) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    retry(poll, policy, Option::is_some).await
}
