// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exponential backoff retry for outbound calls.
//!
//! The delay before retry `n` (0-indexed) is
//! `min(base_delay * 2^n + jitter, max_delay)`, with jitter drawn uniformly
//! from `0..=max_jitter`. Whether an error is worth retrying is decided by a
//! classifier supplied at each call site.

use std::future::Future;
use std::time::Duration;

use kudos_core::types::Retryability;
use rand::Rng;
use tracing::{debug, warn};

/// Backoff parameters for [`retry_with_backoff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_jitter: Duration,
}

impl BackoffPolicy {
    pub const DEFAULT: Self = Self {
        max_attempts: 3,
        base_delay: Duration::from_millis(1000),
        max_delay: Duration::from_millis(30_000),
        max_jitter: Duration::from_millis(1000),
    };

    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
            ..Self::DEFAULT
        }
    }

    /// Replace the jitter bound. Zero makes delays deterministic.
    pub fn with_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Jitter-free lower bound for the delay before retry `attempt`.
    pub fn delay_floor(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Delay before retry `attempt` with the given jitter.
    pub fn delay_with_jitter(&self, attempt: u32, jitter: Duration) -> Duration {
        self.delay_floor(attempt)
            .saturating_add(jitter)
            .min(self.max_delay)
    }

    /// Delay before retry `attempt` with random jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        };
        self.delay_with_jitter(attempt, jitter)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The final error of a retried operation, with classification metadata.
#[derive(Debug, thiserror::Error)]
#[error("{error} (after {attempts} attempt(s))")]
pub struct RetryError<E> {
    pub error: E,
    pub attempts: u32,
    /// False when the error was classified permanent; true when retries ran out.
    pub retryable: bool,
}

/// Run `operation` until it succeeds, returns a permanent error, or
/// `max_attempts` is reached.
///
/// `operation` receives the 0-indexed attempt number.
pub async fn retry_with_backoff<T, E, F, Fut, C>(
    policy: &BackoffPolicy,
    classify: C,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> Retryability,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(attempts = attempt + 1, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => {
                let attempts = attempt + 1;
                if classify(&error) == Retryability::Permanent {
                    debug!(attempts, %error, "permanent error; not retrying");
                    return Err(RetryError {
                        error,
                        attempts,
                        retryable: false,
                    });
                }
                if attempts >= max_attempts {
                    warn!(attempts, %error, "retries exhausted");
                    return Err(RetryError {
                        error,
                        attempts,
                        retryable: true,
                    });
                }

                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    attempt = attempts,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    %error,
                    "transient error; retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
