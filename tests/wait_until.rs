use std::cell::Cell;
use std::time::{Duration, Instant};

use ddbctl::{WaitConfig, WaitError, wait_until, wait_until_with_progress};

#[derive(Debug, PartialEq)]
struct FetchFailed;

/// A fetcher that replays `statuses`, repeating the last one forever.
fn replay<'a>(statuses: &'a [&'a str], calls: &'a Cell<u32>) -> impl FnMut() -> Result<&'a str, FetchFailed> {
    move || {
        let i = calls.get() as usize;
        calls.set(calls.get() + 1);
        Ok(statuses[i.min(statuses.len() - 1)])
    }
}

fn is_active(status: &&str) -> bool {
    *status == "ACTIVE"
}

#[test]
fn satisfied_first_attempt_does_not_sleep() {
    let calls = Cell::new(0);
    let started = Instant::now();

    let status = wait_until(
        replay(&["ACTIVE"], &calls),
        is_active,
        &WaitConfig::bounded(Duration::from_secs(30), 5),
    )
    .unwrap();

    assert_eq!(status, "ACTIVE");
    assert_eq!(calls.get(), 1);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn becomes_active_on_third_fetch() {
    let calls = Cell::new(0);

    let status = wait_until(
        replay(&["CREATING", "CREATING", "ACTIVE"], &calls),
        is_active,
        &WaitConfig::bounded(Duration::ZERO, 5),
    )
    .unwrap();

    assert_eq!(status, "ACTIVE");
    assert_eq!(calls.get(), 3);
}

#[test]
fn never_active_times_out_after_exactly_max_attempts() {
    let calls = Cell::new(0);

    let result = wait_until(
        replay(&["CREATING"], &calls),
        is_active,
        &WaitConfig::bounded(Duration::ZERO, 3),
    );

    assert!(matches!(result, Err(WaitError::Timeout { attempts: 3 })));
    assert_eq!(calls.get(), 3);
}

#[test]
fn timeout_fetch_count_matches_bound_for_any_n() {
    for n in 1..=8 {
        let calls = Cell::new(0);
        let result = wait_until(
            replay(&["UPDATING"], &calls),
            is_active,
            &WaitConfig::bounded(Duration::ZERO, n),
        );
        assert!(matches!(result, Err(WaitError::Timeout { attempts }) if attempts == n));
        assert_eq!(calls.get(), n, "max_attempts = {n}");
    }
}

#[test]
fn fetch_error_stops_immediately() {
    for k in 1..=4u32 {
        let calls = Cell::new(0);
        let result = wait_until(
            || {
                calls.set(calls.get() + 1);
                if calls.get() == k {
                    Err(FetchFailed)
                } else {
                    Ok("CREATING")
                }
            },
            is_active,
            &WaitConfig::unbounded(Duration::ZERO),
        );

        match result {
            Err(WaitError::Fetch { attempt, source }) => {
                assert_eq!(attempt, k);
                assert_eq!(source, FetchFailed);
            }
            other => panic!("expected fetch error, got {other:?}"),
        }
        assert_eq!(calls.get(), k);
    }
}

#[test]
fn fetch_error_is_not_retried_within_bound() {
    let calls = Cell::new(0);
    let result: Result<&str, _> = wait_until(
        || {
            calls.set(calls.get() + 1);
            Err(FetchFailed)
        },
        is_active,
        &WaitConfig::bounded(Duration::ZERO, 10),
    );

    assert!(matches!(result, Err(WaitError::Fetch { attempt: 1, .. })));
    assert_eq!(calls.get(), 1);
}

#[test]
fn progress_is_reported_for_each_unsatisfied_attempt() {
    let calls = Cell::new(0);
    let mut seen = Vec::new();

    wait_until_with_progress(
        replay(&["ABSENT", "CREATING", "CREATING", "ACTIVE"], &calls),
        is_active,
        &WaitConfig::unbounded(Duration::ZERO),
        |attempt, status| seen.push((attempt, status.to_string())),
    )
    .unwrap();

    assert_eq!(
        seen,
        vec![
            (1, "ABSENT".to_string()),
            (2, "CREATING".to_string()),
            (3, "CREATING".to_string()),
        ]
    );
}

#[test]
fn timeout_error_message_names_attempts() {
    let err: WaitError<std::io::Error> = WaitError::Timeout { attempts: 25 };
    assert_eq!(err.to_string(), "condition not satisfied after 25 attempts");
}
