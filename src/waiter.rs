//! Fixed-delay condition polling.
//!
//! [`wait_until`] re-fetches a remote status until a predicate holds or the
//! attempt budget runs out. Table and index waiters are built on top of it.

use std::fmt;
use std::thread;
use std::time::Duration;

use thiserror::Error;

/// Why a wait ended without the predicate being satisfied.
#[derive(Debug, Error)]
pub enum WaitError<E> {
    /// The predicate never held within the configured attempts.
    #[error("condition not satisfied after {attempts} attempts")]
    Timeout { attempts: u32 },

    /// Fetching the status failed. Not retried.
    #[error("failed to fetch status on attempt {attempt}: {source}")]
    Fetch { attempt: u32, source: E },
}

/// Delay and attempt bound for a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub delay: Duration,
    /// `None` polls until the predicate holds.
    pub max_attempts: Option<u32>,
}

impl WaitConfig {
    /// Poll forever with the given delay between attempts.
    pub fn unbounded(delay: Duration) -> Self {
        WaitConfig {
            delay,
            max_attempts: None,
        }
    }

    /// Poll at most `max_attempts` times.
    pub fn bounded(delay: Duration, max_attempts: u32) -> Self {
        WaitConfig {
            delay,
            max_attempts: Some(max_attempts),
        }
    }
}

/// Poll `fetch` until `predicate` accepts its result, returning that status.
///
/// Every unsatisfied attempt is logged with its status before sleeping.
/// A `max_attempts` of zero times out without fetching.
pub fn wait_until<S, E, F, P>(
    fetch: F,
    predicate: P,
    config: &WaitConfig,
) -> Result<S, WaitError<E>>
where
    S: fmt::Debug,
    F: FnMut() -> Result<S, E>,
    P: FnMut(&S) -> bool,
{
    wait_until_with_progress(fetch, predicate, config, |attempt, status| {
        tracing::info!(attempt, status = ?status, "condition not yet satisfied");
    })
}

/// Same as [`wait_until`], reporting each unsatisfied attempt to `on_progress`.
pub fn wait_until_with_progress<S, E, F, P, O>(
    mut fetch: F,
    mut predicate: P,
    config: &WaitConfig,
    mut on_progress: O,
) -> Result<S, WaitError<E>>
where
    F: FnMut() -> Result<S, E>,
    P: FnMut(&S) -> bool,
    O: FnMut(u32, &S),
{
    let mut attempt: u32 = 0;

    loop {
        if let Some(max) = config.max_attempts
            && attempt >= max
        {
            return Err(WaitError::Timeout { attempts: attempt });
        }
        attempt += 1;

        let status = fetch().map_err(|source| WaitError::Fetch { attempt, source })?;
        if predicate(&status) {
            return Ok(status);
        }

        on_progress(attempt, &status);

        // No sleep after the final attempt.
        if config.max_attempts.is_some_and(|max| attempt >= max) {
            return Err(WaitError::Timeout { attempts: attempt });
        }
        if !config.delay.is_zero() {
            thread::sleep(config.delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_attempts_times_out_without_fetching() {
        let mut calls = 0;
        let result: Result<(), WaitError<()>> = wait_until(
            || {
                calls += 1;
                Ok(())
            },
            |_| true,
            &WaitConfig::bounded(Duration::ZERO, 0),
        );
        assert!(matches!(result, Err(WaitError::Timeout { attempts: 0 })));
        assert_eq!(calls, 0);
    }

    #[test]
    fn returns_the_satisfying_status() {
        let mut statuses = vec!["ACTIVE", "UPDATING"];
        let status = wait_until(
            || statuses.pop().ok_or(()),
            |s| *s == "ACTIVE",
            &WaitConfig::unbounded(Duration::ZERO),
        )
        .unwrap();
        assert_eq!(status, "ACTIVE");
    }
}
