//! Bounded retry for single indexer calls.
//!
//! Remote calls are independent per window and per address, so attempts
//! are immediate and strictly sequential — no backoff, no concurrency.
//! That keeps per-attempt logging in a deterministic order.

use serde::Deserialize;
use thiserror::Error;

/// What an exhausted retry for one unit of work does to the rest of the
/// run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the whole run on the first exhausted unit.
    FailFast,
    /// Log the failed unit and continue with the next one.
    SkipAndLog,
}

/// All attempts for one unit of work failed.
#[derive(Debug, Error)]
#[error("{context}: giving up after {attempts} attempt(s): {source}")]
pub struct RetryError {
    /// The unit of work that failed (a window, an address).
    pub context: String,
    /// Attempts actually made.
    pub attempts: u32,
    /// The error from the final attempt.
    #[source]
    pub source: algoscan::Error,
}

/// Bounded-attempt retry for transient indexer failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    /// Default attempt bound.
    pub const DEFAULT_ATTEMPTS: u32 = 5;

    /// Policy with the given attempt bound (clamped to at least one).
    #[must_use]
    pub const fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
        }
    }

    /// Run `op` until it succeeds or the attempt bound is reached.
    ///
    /// A success short-circuits immediately. Only transient errors are
    /// retried; a permanent error fails the unit at once with the
    /// attempts made so far. `context` names the unit of work in logs
    /// and in the returned error.
    ///
    /// # Errors
    ///
    /// [`RetryError`] after `max_attempts` transient failures, or
    /// immediately on a non-transient failure.
    pub async fn run<T, Op>(&self, context: &str, mut op: Op) -> Result<T, RetryError>
    where
        Op: AsyncFnMut() -> Result<T, algoscan::Error>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    tracing::warn!(
                        context,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "attempt failed, retrying"
                    );
                }
                Err(e) => {
                    return Err(RetryError {
                        context: context.to_owned(),
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ATTEMPTS)
    }
}
