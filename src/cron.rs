//! Root crontab maintenance.

use std::time::Duration;

use tracing::info;

use crate::cmd::{CommandSpec, Runner, run_checked};
use crate::error::InstallResult;

/// Merge `line` into an existing crontab, dropping any previous line
/// that mentions `marker`. The result always ends in a newline, as
/// cron requires.
#[must_use]
pub fn merge(existing: &str, marker: &str, line: &str) -> String {
    let mut out: Vec<&str> = existing
        .lines()
        .filter(|l| !l.contains(marker))
        .filter(|l| !l.trim().is_empty())
        .collect();
    out.push(line);
    let mut merged = out.join("\n");
    merged.push('\n');
    merged
}

/// Install `line` into root's crontab, replacing any line that
/// mentions `marker`.
pub fn install(runner: &mut dyn Runner, marker: &str, line: &str) -> InstallResult<()> {
    // `crontab -l` fails when no crontab exists yet.
    let current = runner.run(&CommandSpec::new("crontab").arg("-l").timeout(Duration::from_secs(10)));
    let existing = if current.succeeded {
        current.output
    } else {
        String::new()
    };

    let merged = merge(&existing, marker, line);
    run_checked(
        runner,
        &CommandSpec::new("crontab")
            .arg("-")
            .stdin(&merged)
            .timeout(Duration::from_secs(10)),
    )?;
    info!("Installed cron entry: {line}");
    Ok(())
}
