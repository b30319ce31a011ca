// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{fmt::Display, future::Future, time::Duration};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Classification returned by a retried operation
pub enum RetryError<E> {
    /// Give up immediately and hand the error to the caller
    Failure(E),
    /// Transient problem, try again after the backoff delay
    Retry(E),
}

pub fn to_retry<E>(e: E) -> RetryError<E> {
    RetryError::Retry(e)
}

pub fn to_failure<E>(e: E) -> RetryError<E> {
    RetryError::Failure(e)
}

/// Why a retried operation did not produce a value
#[derive(Debug)]
pub enum RetryFailure<E> {
    /// The operation reported a non retryable failure
    Aborted(E),
    /// The attempt ceiling was reached, `last` is the error from the final attempt
    Exhausted { attempts: u32, last: E },
}

impl<E> RetryFailure<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryFailure::Aborted(e) => e,
            RetryFailure::Exhausted { last, .. } => last,
        }
    }
}

pub const BACKOFF_DELAY: u64 = 500;
pub const BACKOFF_MAX_DELAY: u64 = 8_000;
pub const BACKOFF_MAX_RETRIES: u32 = 4;

/// Bounded exponential backoff policy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Backoff {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_attempts: BACKOFF_MAX_RETRIES,
            initial_delay: Duration::from_millis(BACKOFF_DELAY),
            max_delay: Duration::from_millis(BACKOFF_MAX_DELAY),
        }
    }
}

impl Backoff {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay: max_delay.max(initial_delay),
        }
    }

    /// Delay to wait after the given (1-based) failed attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Retries an async operation with exponential backoff
///
/// # Arguments
/// * `operation` - Async function to retry, it classifies its own errors with [`RetryError`]
/// * `backoff` - Attempt ceiling and delay bounds
///
/// # Returns
/// * `Ok(T)` - The first successful result
/// * `Err(RetryFailure)` - Either an aborting failure or the last error once the ceiling is hit
pub async fn retry_with_backoff<F, Fut, T, E>(
    operation: F,
    backoff: Backoff,
) -> Result<T, RetryFailure<E>>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, RetryError<E>>>,
    E: Display,
{
    let mut current_attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(RetryError::Retry(e)) => {
                if current_attempt >= backoff.max_attempts {
                    warn!(
                        "Operation failed after {} attempts. Last error: {}",
                        current_attempt, e
                    );
                    return Err(RetryFailure::Exhausted {
                        attempts: current_attempt,
                        last: e,
                    });
                }

                let delay = backoff.delay_for(current_attempt);
                warn!(
                    "Attempt {}/{} failed, retrying in {}ms: {}",
                    current_attempt,
                    backoff.max_attempts,
                    delay.as_millis(),
                    e
                );

                sleep(delay).await;
                current_attempt += 1;
            }
            Err(RetryError::Failure(e)) => {
                debug!("Non retryable failure on attempt {}: {}", current_attempt, e);
                return Err(RetryFailure::Aborted(e));
            }
        }
    }
}
