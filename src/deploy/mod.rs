//! Application bootstrap: source checkout, containers, migrations,
//! admin account.

use std::fs;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::cmd::{self, CommandSpec, Runner, run_checked};
use crate::compose::COMPOSE_FILE;
use crate::error::{InstallError, InstallResult};
use crate::pipeline::{Context, PhaseStatus};

const CLONE_TIMEOUT: Duration = Duration::from_secs(600);
const BUILD_TIMEOUT: Duration = Duration::from_secs(1800);
const MIGRATE_TIMEOUT: Duration = Duration::from_secs(600);
const MANAGE_TIMEOUT: Duration = Duration::from_secs(300);

const READY_ATTEMPTS: u32 = 30;
const READY_INTERVAL: Duration = Duration::from_secs(5);

/// Which compose implementation is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeTool {
    /// `docker compose`
    Plugin,
    /// `docker-compose`
    Standalone,
}

impl ComposeTool {
    #[must_use]
    pub const fn invocation(self) -> &'static str {
        match self {
            Self::Plugin => "docker compose",
            Self::Standalone => "docker-compose",
        }
    }

    /// A compose command run from `dir` against the generated manifest.
    #[must_use]
    pub fn command<I, S>(self, dir: &Path, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let base = match self {
            Self::Plugin => CommandSpec::new("docker").arg("compose"),
            Self::Standalone => CommandSpec::new("docker-compose"),
        };
        base.args(["-f", COMPOSE_FILE]).args(args).cwd(dir)
    }
}

/// Find a working compose tool, preferring the Docker plugin.
pub fn detect_compose(runner: &mut dyn Runner) -> Option<ComposeTool> {
    let plugin = CommandSpec::new("docker")
        .args(["compose", "version"])
        .timeout(Duration::from_secs(30));
    if runner.run(&plugin).succeeded {
        return Some(ComposeTool::Plugin);
    }
    cmd::command_exists(runner, "docker-compose").then_some(ComposeTool::Standalone)
}

/// Clone the repository, or fast-forward an existing checkout.
pub fn fetch_source(ctx: &mut Context<'_>) -> InstallResult<PhaseStatus> {
    let dir = &ctx.params.install_dir;
    let app = ctx.app;
    let dir_arg = dir.display().to_string();

    if dir.join(".git").is_dir() {
        info!("Updating existing checkout in {dir_arg}");
        // The generated Dockerfile may shadow a tracked one; it is
        // rewritten by the render phase anyway.
        let restore = ctx.runner.run(
            &CommandSpec::new("git")
                .args(["-C", &dir_arg, "checkout", "--", "Dockerfile"])
                .timeout(Duration::from_secs(30)),
        );
        debug!(restored = restore.succeeded, "reset generated Dockerfile");
        run_checked(
            ctx.runner,
            &CommandSpec::new("git")
                .args(["-C", &dir_arg, "pull", "--ff-only"])
                .timeout(CLONE_TIMEOUT),
        )?;
        return Ok(PhaseStatus::Done);
    }

    if !is_empty_dir(dir)? {
        return Err(InstallError::Other(format!(
            "{dir_arg} exists and is not a git checkout; move it away or choose another --install-dir"
        )));
    }
    if let Some(parent) = dir.parent() {
        fs::create_dir_all(parent)?;
    }

    info!("Cloning {} ({}) into {dir_arg}", app.repository, app.branch);
    run_checked(
        ctx.runner,
        &CommandSpec::new("git")
            .args(["clone", "--branch", &app.branch, &app.repository, &dir_arg])
            .timeout(CLONE_TIMEOUT),
    )?;
    Ok(PhaseStatus::Done)
}

fn is_empty_dir(dir: &Path) -> InstallResult<bool> {
    match fs::read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_none()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e.into()),
    }
}

/// Build and start the stack, then wait for the web container.
pub fn start_containers(ctx: &mut Context<'_>) -> InstallResult<PhaseStatus> {
    let tool = ctx.compose_tool()?;
    let dir = &ctx.params.install_dir;

    info!("Building and starting containers (this can take a while)");
    run_checked(
        ctx.runner,
        &tool.command(dir, ["up", "-d", "--build"]).timeout(BUILD_TIMEOUT),
    )?;

    let container = ctx.app.web_service();
    let probe = CommandSpec::new("docker")
        .args(["inspect", "-f", "{{.State.Running}}", &container])
        .timeout(Duration::from_secs(30));
    for attempt in 1..=READY_ATTEMPTS {
        let outcome = ctx.runner.run(&probe);
        if outcome.succeeded && outcome.output.trim() == "true" {
            info!("Container {container} is running");
            return Ok(PhaseStatus::Done);
        }
        debug!(attempt, "waiting for {container}");
        if attempt < READY_ATTEMPTS {
            (ctx.pause)(READY_INTERVAL);
        }
    }
    Err(InstallError::Other(format!(
        "container {container} did not start within {}s",
        READY_INTERVAL.as_secs() * u64::from(READY_ATTEMPTS)
    )))
}

fn manage(ctx: &mut Context<'_>, args: &[&str], timeout: Duration) -> InstallResult<String> {
    let tool = ctx.compose_tool()?;
    let spec = tool
        .command(&ctx.params.install_dir, ctx.app.manage(args))
        .timeout(timeout);
    run_checked(ctx.runner, &spec)
}

pub fn migrate(ctx: &mut Context<'_>) -> InstallResult<PhaseStatus> {
    info!("Running database migrations");
    manage(ctx, &["migrate", "--noinput"], MIGRATE_TIMEOUT)?;
    info!("Collecting static files");
    manage(ctx, &["collectstatic", "--noinput"], MANAGE_TIMEOUT)?;
    Ok(PhaseStatus::Done)
}

/// Python fed to `manage.py shell`. Creates the superuser unless the
/// username is taken.
pub fn admin_script(username: &str, email: &str, password: &str) -> InstallResult<String> {
    let username = serde_json::to_string(username)?;
    let email = serde_json::to_string(email)?;
    let password = serde_json::to_string(password)?;
    Ok(format!(
        "from django.contrib.auth import get_user_model
User = get_user_model()
if User.objects.filter(username={username}).exists():
    print(\"ADMIN_EXISTS\")
else:
    User.objects.create_superuser({username}, {email}, {password})
    print(\"ADMIN_CREATED\")
"
    ))
}

/// Create the admin account. An existing account with the same
/// username is left untouched.
pub fn create_admin(ctx: &mut Context<'_>) -> InstallResult<PhaseStatus> {
    let params = ctx.params;
    let tool = ctx.compose_tool()?;
    let script = admin_script(&params.admin.username, &params.email, &params.admin.password)?;
    let spec = tool
        .command(&params.install_dir, ctx.app.manage(&["shell"]))
        .stdin(&script)
        .timeout(MANAGE_TIMEOUT);

    let output = run_checked(ctx.runner, &spec)?;
    if output.contains("ADMIN_EXISTS") {
        return Ok(PhaseStatus::Skipped(format!(
            "admin user '{}' already exists",
            params.admin.username
        )));
    }
    info!("Created admin user {}", params.admin.username);
    Ok(PhaseStatus::Done)
}
