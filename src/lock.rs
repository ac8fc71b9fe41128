//! Bounded retry for package-manager lock contention.
//!
//! apt refuses to run while another process (usually
//! `unattended-upgrades` on a fresh VPS) holds the dpkg lock. The
//! policy here is deliberately small: retry a fixed number of times
//! with a fixed delay, and hand the decision back to the caller once
//! the attempts are used up.

use std::time::Duration;

use crate::cmd::CommandOutcome;

const LOCK_SIGNATURES: [&str; 4] = [
    "could not get lock",
    "unable to acquire the dpkg frontend lock",
    "is another process using it",
    "resource temporarily unavailable",
];

const LOCK_HOLDERS: [&str; 5] = ["apt", "apt-get", "dpkg", "unattended-upgr", "aptd"];

/// Whether command output carries a "resource temporarily locked"
/// signature.
#[must_use]
pub fn is_lock_error(output: &str) -> bool {
    let lower = output.to_lowercase();
    LOCK_SIGNATURES.iter().any(|sig| lower.contains(sig))
}

/// Retry policy: at most `max_attempts` runs, `delay` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockRetry {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for LockRetry {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(15),
        }
    }
}

/// How a retry round ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    /// The command eventually succeeded.
    Succeeded { attempts: u32, last: CommandOutcome },
    /// The command failed for a reason other than the lock.
    Failed { attempts: u32, last: CommandOutcome },
    /// Every attempt hit the lock.
    Exhausted { attempts: u32, last: CommandOutcome },
}

impl RetryOutcome {
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Succeeded { attempts, .. }
            | Self::Failed { attempts, .. }
            | Self::Exhausted { attempts, .. } => *attempts,
        }
    }
}

impl LockRetry {
    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Upper bound on the time spent waiting between attempts.
    #[must_use]
    pub fn max_wait(&self) -> Duration {
        self.delay
            .checked_mul(self.max_attempts.saturating_sub(1))
            .unwrap_or(Duration::MAX)
    }

    /// Drive `attempt` until it succeeds, fails without a lock
    /// signature, or `max_attempts` is reached. `wait` is called
    /// between attempts only, so a round of `n` attempts performs
    /// `n - 1` waits. `state` is threaded through both callbacks.
    pub fn run<S, A, W>(&self, state: &mut S, mut attempt: A, mut wait: W) -> RetryOutcome
    where
        S: ?Sized,
        A: FnMut(&mut S, u32) -> CommandOutcome,
        W: FnMut(&mut S, u32, Duration),
    {
        let max = self.max_attempts.max(1);
        let mut n = 1;
        loop {
            let last = attempt(state, n);
            if last.succeeded {
                return RetryOutcome::Succeeded { attempts: n, last };
            }
            if !is_lock_error(&last.output) {
                return RetryOutcome::Failed { attempts: n, last };
            }
            if n >= max {
                return RetryOutcome::Exhausted { attempts: n, last };
            }
            wait(state, n, self.delay);
            n += 1;
        }
    }
}

/// What to do once the lock is still held after a full round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockDecision {
    /// Run another full retry round.
    Wait,
    /// Stop the installation.
    Abort,
    /// Skip the locked step and carry on.
    Continue,
}

impl LockDecision {
    /// Parse an operator answer: `w`/`wait`, `a`/`abort`,
    /// `c`/`continue`.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "w" | "wait" => Some(Self::Wait),
            "a" | "abort" => Some(Self::Abort),
            "c" | "continue" => Some(Self::Continue),
            _ => None,
        }
    }

    /// Decision for a run without a terminal.
    #[must_use]
    pub const fn unattended(force_continue: bool) -> Self {
        if force_continue {
            Self::Continue
        } else {
            Self::Abort
        }
    }
}

/// A process that probably holds the dpkg lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockHolder {
    pub pid: u32,
    pub age: Duration,
    pub command: String,
}

/// Extract package-manager processes from `ps -eo pid=,etimes=,comm=`.
#[must_use]
pub fn parse_lock_holders(ps_output: &str) -> Vec<LockHolder> {
    ps_output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let pid = parts.next()?.parse().ok()?;
            let secs = parts.next()?.parse().ok()?;
            let command = parts.next()?.to_string();
            LOCK_HOLDERS
                .contains(&command.as_str())
                .then(|| LockHolder {
                    pid,
                    age: Duration::from_secs(secs),
                    command,
                })
        })
        .collect()
}

/// Render an age like `1h 02m 05s`.
#[must_use]
pub fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h {m:02}m {s:02}s")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}
