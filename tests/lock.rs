mod support;

use std::time::Duration;

use horilla_installer::cmd::CommandOutcome;
use horilla_installer::lock::{
    LockDecision, LockRetry, RetryOutcome, format_age, is_lock_error, parse_lock_holders,
};
use proptest::prelude::*;

use support::lock_error;

/// Runs `retry` against a command that hits the lock `locked` times
/// before succeeding. Returns the outcome and the waits performed.
fn drive(retry: LockRetry, locked: u32) -> (RetryOutcome, Vec<Duration>) {
    let mut waits = Vec::new();
    let outcome = retry.run(
        &mut waits,
        |_, attempt| {
            if attempt <= locked {
                lock_error()
            } else {
                CommandOutcome::success("done")
            }
        },
        |waits, _, delay| waits.push(delay),
    );
    (outcome, waits)
}

#[test]
fn succeeds_on_third_attempt() {
    let retry = LockRetry::new(5, Duration::from_secs(15));

    let (outcome, waits) = drive(retry, 2);

    assert!(matches!(outcome, RetryOutcome::Succeeded { attempts: 3, .. }));
    assert_eq!(waits, vec![Duration::from_secs(15); 2]);
}

#[test]
fn exhausts_after_max_attempts() {
    let retry = LockRetry::new(3, Duration::from_secs(1));

    let (outcome, waits) = drive(retry, u32::MAX);

    assert!(matches!(outcome, RetryOutcome::Exhausted { attempts: 3, .. }));
    assert_eq!(waits.len(), 2);
}

#[test]
fn other_failures_are_not_retried() {
    let retry = LockRetry::default();
    let mut calls = 0;

    let outcome = retry.run(
        &mut calls,
        |calls, _| {
            *calls += 1;
            CommandOutcome::failure(Some(100), "E: Unable to locate package nosuch")
        },
        |_, _, _| panic!("no wait expected"),
    );

    assert!(matches!(outcome, RetryOutcome::Failed { attempts: 1, .. }));
    assert_eq!(calls, 1);
}

#[test]
fn zero_attempts_still_runs_once() {
    let (outcome, waits) = drive(LockRetry::new(0, Duration::from_secs(5)), u32::MAX);

    assert_eq!(outcome.attempts(), 1);
    assert!(waits.is_empty());
}

#[test]
fn max_wait_saturates_on_huge_settings() {
    let retry = LockRetry::new(u32::MAX, Duration::from_secs(u64::MAX / 2));

    assert_eq!(retry.max_wait(), Duration::MAX);
    assert_eq!(LockRetry::new(4, Duration::from_secs(15)).max_wait(), Duration::from_secs(45));
    assert_eq!(LockRetry::new(0, Duration::from_secs(15)).max_wait(), Duration::ZERO);
}

proptest! {
    #[test]
    fn attempts_and_waiting_are_bounded(max in 1u32..20, locked in 0u32..40, delay in 0u64..120) {
        let retry = LockRetry::new(max, Duration::from_secs(delay));

        let (outcome, waits) = drive(retry, locked);

        prop_assert!(outcome.attempts() <= max);
        prop_assert_eq!(waits.len() as u32, outcome.attempts() - 1);
        prop_assert!(waits.iter().sum::<Duration>() <= retry.max_wait());
        if locked < max {
            let succeeded = matches!(outcome, RetryOutcome::Succeeded { .. });
            prop_assert!(succeeded);
        }
    }
}

#[test]
fn lock_signatures() {
    assert!(is_lock_error(&lock_error().output));
    assert!(is_lock_error(
        "dpkg: error: dpkg frontend lock was locked by another process; Resource temporarily unavailable"
    ));
    assert!(!is_lock_error("E: Unable to locate package nosuch"));
}

#[test]
fn decisions() {
    assert_eq!(LockDecision::parse("W"), Some(LockDecision::Wait));
    assert_eq!(LockDecision::parse("abort"), Some(LockDecision::Abort));
    assert_eq!(LockDecision::parse(" c "), Some(LockDecision::Continue));
    assert_eq!(LockDecision::parse("maybe"), None);
    assert_eq!(LockDecision::unattended(false), LockDecision::Abort);
    assert_eq!(LockDecision::unattended(true), LockDecision::Continue);
}

#[test]
fn holders_from_ps() {
    let ps = "    1  86400 systemd\n  812   1325 unattended-upgr\n  901     12 apt-get\n 1000      3 bash\n";

    let holders = parse_lock_holders(ps);

    assert_eq!(holders.len(), 2);
    assert_eq!(holders[0].pid, 812);
    assert_eq!(format_age(holders[0].age), "22m 05s");
    assert_eq!(holders[1].command, "apt-get");
}
