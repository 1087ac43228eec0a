//! Retry policy for operations that can fail transiently.
use log::*;
use std::{future::Future, sync::Arc, time::Duration};

use crate::{CaretakerError, Result};

type Classifier = Arc<dyn Fn(&CaretakerError) -> bool + Send + Sync>;

/// Version lookups that fail because a freshly published package has not
/// reached the registry yet.
pub const VERSION_NOT_FOUND_MARKERS: &[&str] =
    &["ETARGET", "No matching version found", "notarget"];

/// How many times to run an operation, how long to wait between attempts,
/// and which errors are worth another attempt.
#[derive(Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    delay: Duration,
    is_retryable: Classifier,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        delay: Duration,
        is_retryable: impl Fn(&CaretakerError) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            is_retryable: Arc::new(is_retryable),
        }
    }

    /// Retries every error.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self::new(max_attempts, delay, |_| true)
    }

    /// Runs once.
    pub fn none() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    /// Retries only errors that look like a package version missing from
    /// the registry.
    pub fn version_not_found(max_attempts: u32, delay: Duration) -> Self {
        Self::new(max_attempts, delay, |err| {
            let message = err.to_string();
            VERSION_NOT_FOUND_MARKERS
                .iter()
                .any(|marker| message.contains(marker))
        })
    }

    /// Delay before the attempt following `attempt` (1-based).
    pub fn backoff(&self, _attempt: u32) -> Duration {
        self.delay
    }

    pub fn is_retryable(&self, err: &CaretakerError) -> bool {
        (self.is_retryable)(err)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts are used up. The last error is returned.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err)
                    if attempt < self.max_attempts && self.is_retryable(&err) =>
                {
                    let delay = self.backoff(attempt);
                    warn!(
                        "attempt {attempt}/{} failed: {err}: retrying in {}ms",
                        self.max_attempts,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
