//! apt-get invocations with lock contention handling.

use std::time::Duration;

use tracing::{info, warn};

use crate::cmd::{CommandSpec, Runner};
use crate::error::{InstallError, InstallResult};
use crate::lock::{self, LockDecision, RetryOutcome};
use crate::pipeline::{Context, PhaseStatus};
use crate::prompt;

const APT_TIMEOUT: Duration = Duration::from_secs(600);

/// Result of an apt step that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AptStatus {
    Done,
    /// Skipped because the lock stayed held and the run continues
    /// anyway.
    Skipped(String),
}

impl From<AptStatus> for PhaseStatus {
    fn from(status: AptStatus) -> Self {
        match status {
            AptStatus::Done => Self::Done,
            AptStatus::Skipped(reason) => Self::Skipped(reason),
        }
    }
}

/// `apt-get <args>` with a non-interactive frontend.
#[must_use]
pub fn command(args: &[&str]) -> CommandSpec {
    CommandSpec::new("apt-get")
        .args(args)
        .env("DEBIAN_FRONTEND", "noninteractive")
        .timeout(APT_TIMEOUT)
}

pub fn update(ctx: &mut Context<'_>) -> InstallResult<AptStatus> {
    run(ctx, &command(&["update"]))
}

pub fn upgrade(ctx: &mut Context<'_>) -> InstallResult<AptStatus> {
    run(ctx, &command(&["upgrade", "-y"]))
}

pub fn install(ctx: &mut Context<'_>, packages: &[&str]) -> InstallResult<AptStatus> {
    let mut args = vec!["install", "-y"];
    args.extend_from_slice(packages);
    info!("Installing {}", packages.join(" "));
    run(ctx, &command(&args))
}

/// Run an apt command through the lock retry loop. When the lock is
/// still held after a full round, an interactive operator chooses
/// to wait another round, abort, or skip the step; an unattended run
/// skips only under `--force-continue`.
pub fn run(ctx: &mut Context<'_>, spec: &CommandSpec) -> InstallResult<AptStatus> {
    let retry = ctx.params.lock_retry;
    let pause = ctx.pause;

    loop {
        let outcome = retry.run(
            ctx,
            |ctx, attempt| {
                if attempt > 1 {
                    info!("Retrying {} (attempt {attempt}/{})", spec.display(), retry.max_attempts);
                }
                ctx.runner.run(spec)
            },
            |ctx, attempt, delay| {
                warn!(
                    "Package manager is locked (attempt {attempt}/{}), waiting {}s",
                    retry.max_attempts,
                    delay.as_secs()
                );
                report_holders(ctx.runner);
                pause(delay);
            },
        );

        let attempts = match outcome {
            RetryOutcome::Succeeded { .. } => return Ok(AptStatus::Done),
            RetryOutcome::Failed { last, .. } => {
                last.into_result(spec)?;
                return Ok(AptStatus::Done);
            }
            RetryOutcome::Exhausted { attempts, .. } => attempts,
        };

        warn!(
            "Package manager still locked after {attempts} attempts ({}s of waiting)",
            retry.max_wait().as_secs()
        );
        report_holders(ctx.runner);

        match decide(ctx)? {
            LockDecision::Wait => {}
            LockDecision::Abort if ctx.interactive() => return Err(InstallError::Aborted),
            LockDecision::Abort => return Err(InstallError::LockContention { attempts }),
            LockDecision::Continue => {
                warn!("Skipping {} while the lock is held", spec.display());
                return Ok(AptStatus::Skipped(format!(
                    "package manager locked after {attempts} attempts"
                )));
            }
        }
    }
}

fn decide(ctx: &mut Context<'_>) -> InstallResult<LockDecision> {
    if !ctx.interactive() {
        return Ok(LockDecision::unattended(ctx.params.options.force_continue));
    }
    let answer = prompt::ask_valid(
        ctx.prompt,
        "Wait another round, abort, or continue without this step? [w/a/c]",
        Some("w"),
        |a| LockDecision::parse(a).is_some(),
    )?;
    Ok(LockDecision::parse(&answer).unwrap_or(LockDecision::Wait))
}

fn report_holders(runner: &mut dyn Runner) {
    let ps = runner.run(
        &CommandSpec::new("ps")
            .arg("-eo")
            .arg("pid=,etimes=,comm=")
            .timeout(Duration::from_secs(10)),
    );
    if !ps.succeeded {
        return;
    }
    for holder in lock::parse_lock_holders(&ps.output) {
        info!(
            "  held by {} (pid {}, running for {})",
            holder.command,
            holder.pid,
            lock::format_age(holder.age)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_noninteractive() {
        let spec = command(&["install", "-y", "nginx"]);

        assert_eq!(spec.display(), "apt-get install -y nginx");
        assert_eq!(
            spec.env,
            vec![("DEBIAN_FRONTEND".to_string(), "noninteractive".to_string())]
        );
        assert_eq!(spec.timeout, APT_TIMEOUT);
    }
}
