use std::time::Duration;

use tracing::{info, warn};

use crate::cmd::{self, CommandSpec, run_checked};
use crate::deploy::{self, ComposeTool};
use crate::error::{InstallError, InstallResult};
use crate::pipeline::{Context, PhaseStatus};

use super::apt::{self, AptStatus};

const PREREQUISITES: [&str; 6] = [
    "ca-certificates",
    "curl",
    "git",
    "gnupg",
    "lsb-release",
    "cron",
];

/// Package sources for a compose tool, tried in order.
const COMPOSE_PACKAGES: [&str; 2] = ["docker-compose-v2", "docker-compose"];

/// Refresh apt, install Docker and a compose tool, and start the
/// daemon.
pub fn ensure_runtime(ctx: &mut Context<'_>) -> InstallResult<PhaseStatus> {
    let mut skipped = Vec::new();
    let mut note = |status: AptStatus| {
        if let AptStatus::Skipped(reason) = status {
            skipped.push(reason);
        }
    };

    note(apt::update(ctx)?);
    if ctx.params.options.skip_upgrade {
        info!("Skipping system upgrade (--skip-upgrade)");
    } else {
        note(apt::upgrade(ctx)?);
    }
    note(apt::install(ctx, &PREREQUISITES)?);

    if cmd::command_exists(ctx.runner, "docker") {
        info!("Docker is already installed");
    } else {
        note(apt::install(ctx, &["docker.io"])?);
    }

    let tool = ensure_compose(ctx)?;
    info!("Using {}", tool.invocation());
    ctx.compose = Some(tool);

    run_checked(
        ctx.runner,
        &CommandSpec::new("systemctl")
            .args(["enable", "--now", "docker"])
            .timeout(Duration::from_secs(60)),
    )?;

    if skipped.is_empty() {
        Ok(PhaseStatus::Done)
    } else {
        Ok(PhaseStatus::Skipped(skipped.join("; ")))
    }
}

fn ensure_compose(ctx: &mut Context<'_>) -> InstallResult<ComposeTool> {
    if let Some(tool) = deploy::detect_compose(ctx.runner) {
        return Ok(tool);
    }
    for package in COMPOSE_PACKAGES {
        match apt::install(ctx, &[package]) {
            Ok(AptStatus::Done) => {}
            Ok(AptStatus::Skipped(_)) => continue,
            Err(InstallError::CommandFailed { .. }) => {
                warn!("Package {package} is not available");
                continue;
            }
            Err(e) => return Err(e),
        }
        if let Some(tool) = deploy::detect_compose(ctx.runner) {
            return Ok(tool);
        }
    }
    Err(InstallError::Other(
        "could not install docker compose (tried the plugin, docker-compose-v2 and docker-compose)"
            .into(),
    ))
}
