use std::fmt;
use std::time::Duration;

use tracing::{info, warn};

use crate::app::App;
use crate::artifact::Artifact;
use crate::backup;
use crate::certbot;
use crate::cmd::Runner;
use crate::compose;
use crate::deploy::{self, ComposeTool};
use crate::envfile;
use crate::error::{InstallError, InstallResult};
use crate::nginx::{self, Nginx, SitePaths};
use crate::params::Params;
use crate::prompt::Prompt;
use crate::provision;

/// Shared state handed to every phase.
pub struct Context<'a> {
    pub params: &'a Params,
    pub app: &'a App,
    pub runner: &'a mut dyn Runner,
    pub prompt: &'a mut dyn Prompt,
    /// Compose invocation, known once the container runtime phase
    /// has run.
    pub compose: Option<ComposeTool>,
    /// Sleeps between retries and readiness polls.
    pub pause: fn(Duration),
}

impl Context<'_> {
    #[must_use]
    pub const fn interactive(&self) -> bool {
        !self.params.options.non_interactive
    }

    /// The compose tool, detecting it if the runtime phase did not
    /// record one.
    pub fn compose_tool(&mut self) -> InstallResult<ComposeTool> {
        if let Some(tool) = self.compose {
            return Ok(tool);
        }
        let tool = deploy::detect_compose(self.runner)
            .ok_or_else(|| InstallError::Other("no docker compose tool available".into()))?;
        self.compose = Some(tool);
        Ok(tool)
    }
}

/// The installation phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    CheckSystem,
    ContainerRuntime,
    ReverseProxy,
    FetchSource,
    RenderArtifacts,
    StartContainers,
    Migrate,
    CreateAdmin,
    IssueCertificate,
    ConfigureBackups,
}

impl Phase {
    pub const ALL: [Self; 10] = [
        Self::CheckSystem,
        Self::ContainerRuntime,
        Self::ReverseProxy,
        Self::FetchSource,
        Self::RenderArtifacts,
        Self::StartContainers,
        Self::Migrate,
        Self::CreateAdmin,
        Self::IssueCertificate,
        Self::ConfigureBackups,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CheckSystem => "check system",
            Self::ContainerRuntime => "container runtime",
            Self::ReverseProxy => "reverse proxy",
            Self::FetchSource => "fetch source",
            Self::RenderArtifacts => "render artifacts",
            Self::StartContainers => "start containers",
            Self::Migrate => "migrate",
            Self::CreateAdmin => "create admin",
            Self::IssueCertificate => "issue certificate",
            Self::ConfigureBackups => "configure backups",
        }
    }

    fn run(self, ctx: &mut Context<'_>) -> InstallResult<PhaseStatus> {
        match self {
            Self::CheckSystem => provision::check_system(ctx),
            Self::ContainerRuntime => provision::docker::ensure_runtime(ctx),
            Self::ReverseProxy => provision::install_proxy(ctx),
            Self::FetchSource => deploy::fetch_source(ctx),
            Self::RenderArtifacts => render_artifacts(ctx),
            Self::StartContainers => deploy::start_containers(ctx),
            Self::Migrate => deploy::migrate(ctx),
            Self::CreateAdmin => deploy::create_admin(ctx),
            Self::IssueCertificate => issue_certificate(ctx),
            Self::ConfigureBackups => backup::configure(ctx),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a phase ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseStatus {
    Done,
    Skipped(String),
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub completed: Vec<Phase>,
    pub skipped: Vec<(Phase, String)>,
    /// Phases that failed under `--force-continue`.
    pub failed: Vec<(Phase, String)>,
}

impl Report {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    #[must_use]
    pub fn skipped_phase(&self, phase: Phase) -> Option<&str> {
        self.skipped
            .iter()
            .find(|(p, _)| *p == phase)
            .map(|(_, reason)| reason.as_str())
    }
}

/// Runs the installation phases in order.
///
/// # Example
///
/// ```no_run
/// use horilla_installer::params::{HostPaths, Params, RawParams, RunOptions};
/// use horilla_installer::prompt::Terminal;
/// use horilla_installer::{Installer, LockRetry, SystemRunner};
///
/// let raw = RawParams {
///     domain: Some("hrms.example.com".into()),
///     ..RawParams::default()
/// };
/// let params = Params::resolve(
///     &raw,
///     RunOptions::default(),
///     LockRetry::default(),
///     HostPaths::default(),
/// )?;
///
/// let report = Installer::new(&params)
///     .run(&mut SystemRunner, &mut Terminal)?;
/// assert!(report.is_clean());
/// # Ok::<(), horilla_installer::InstallError>(())
/// ```
pub struct Installer<'a> {
    params: &'a Params,
    app: App,
    pause: fn(Duration),
}

impl<'a> Installer<'a> {
    #[must_use]
    pub fn new(params: &'a Params) -> Self {
        Self {
            params,
            app: App::horilla(),
            pause: std::thread::sleep,
        }
    }

    #[must_use]
    pub fn with_app(mut self, app: App) -> Self {
        self.app = app;
        self
    }

    /// Replace the sleep used between retries and polls.
    #[must_use]
    pub fn pause(mut self, pause: fn(Duration)) -> Self {
        self.pause = pause;
        self
    }

    /// Run every phase. A failing phase stops the run unless
    /// `--force-continue` is set; an operator abort always stops it.
    pub fn run(&self, runner: &mut dyn Runner, prompt: &mut dyn Prompt) -> InstallResult<Report> {
        let mut ctx = Context {
            params: self.params,
            app: &self.app,
            runner,
            prompt,
            compose: None,
            pause: self.pause,
        };
        let force_continue = self.params.options.force_continue;
        let mut report = Report::default();

        for (i, phase) in Phase::ALL.into_iter().enumerate() {
            info!("[{}/{}] {}", i + 1, Phase::ALL.len(), phase);
            match phase.run(&mut ctx) {
                Ok(PhaseStatus::Done) => report.completed.push(phase),
                Ok(PhaseStatus::Skipped(reason)) => {
                    info!("Skipping {phase}: {reason}");
                    report.skipped.push((phase, reason));
                }
                Err(InstallError::Aborted) => return Err(InstallError::Aborted),
                Err(e) if force_continue => {
                    warn!("{phase} failed: {e}");
                    warn!("Continuing anyway as --force-continue is set");
                    report.failed.push((phase, e.to_string()));
                }
                Err(e) => {
                    return Err(InstallError::PhaseFailed {
                        phase: phase.label(),
                        source: Box::new(e),
                    });
                }
            }
        }

        self.print_summary(&report);
        Ok(report)
    }

    /// Print what a run would do without running any command.
    pub fn preview(&self) -> InstallResult<()> {
        println!("Dry run: no command will be executed.");
        println!();
        let secret = "<generated at install time>";
        let mut artifacts = artifacts(self.params, &self.app, secret)?;
        if let Some(settings) = &self.params.backup {
            artifacts.extend(backup::artifacts(
                self.params,
                &self.app,
                settings,
                ComposeTool::Plugin,
                |_| Ok("<obscured>".to_string()),
            )?);
        }
        for artifact in &artifacts {
            artifact.preview();
            println!();
        }

        println!("Phases:");
        for (i, phase) in Phase::ALL.into_iter().enumerate() {
            let note = match phase {
                Phase::IssueCertificate => {
                    certbot::skip_reason(&self.params.domain, self.params.options.force_no_ssl)
                }
                Phase::ConfigureBackups if self.params.backup.is_none() => {
                    Some("backups are disabled".to_string())
                }
                _ => None,
            };
            match note {
                Some(reason) => println!("  {:>2}. {phase} (skipped: {reason})", i + 1),
                None => println!("  {:>2}. {phase}", i + 1),
            }
        }
        Ok(())
    }

    fn print_summary(&self, report: &Report) {
        let params = self.params;
        println!();
        println!("========================================");
        if report.is_clean() {
            println!("Horilla HRMS installed successfully!");
        } else {
            println!("Horilla HRMS installed with errors");
        }
        println!("========================================");
        println!();
        println!("URL: {}", params.url());
        println!("Admin username: {}", params.admin.username);
        println!("Admin password: {}", params.admin.password);
        println!("Install directory: {}", params.install_dir.display());
        match &params.backup {
            Some(settings) => {
                println!(
                    "Backups: {} to {} ({})",
                    settings.frequency,
                    settings.provider.target(&settings.bucket),
                    settings.provider.display_name()
                );
            }
            None => println!("Backups: disabled"),
        }
        for (phase, reason) in &report.failed {
            println!("Failed: {phase}: {reason}");
        }
        println!();
        println!("Change the admin password after the first login.");
    }
}

/// Every file written by the render phase, in write order.
pub fn artifacts(params: &Params, app: &App, secret_key: &str) -> InstallResult<Vec<Artifact>> {
    let dir = &params.install_dir;
    let site = nginx::render(&Nginx::for_app(app, dir), &params.domain);
    let paths = site_paths(params, app);

    Ok(vec![
        Artifact::new(dir.join(".env"), envfile::render(params, app, secret_key)).mode(0o600),
        Artifact::new(dir.join(compose::COMPOSE_FILE), compose::render(app, &params.database)?),
        Artifact::new(dir.join("Dockerfile"), compose::dockerfile(app)),
        Artifact::new(paths.available, site),
    ])
}

fn site_paths(params: &Params, app: &App) -> SitePaths {
    SitePaths::new(
        &params.paths.nginx_sites_available,
        &params.paths.nginx_sites_enabled,
        &app.name,
    )
}

fn render_artifacts(ctx: &mut Context<'_>) -> InstallResult<PhaseStatus> {
    let env_path = ctx.params.install_dir.join(".env");
    let secret = envfile::existing_secret_key(&env_path).unwrap_or_else(envfile::generate_secret_key);

    for artifact in artifacts(ctx.params, ctx.app, &secret)? {
        artifact.write()?;
        info!("Wrote {}", artifact.path.display());
    }

    let paths = site_paths(ctx.params, ctx.app);
    provision::enable_site(&paths)?;
    provision::reload_nginx(ctx.runner)?;
    Ok(PhaseStatus::Done)
}

fn issue_certificate(ctx: &mut Context<'_>) -> InstallResult<PhaseStatus> {
    let params = ctx.params;
    if let Some(reason) = certbot::skip_reason(&params.domain, params.options.force_no_ssl) {
        return Ok(PhaseStatus::Skipped(reason));
    }
    certbot::issue(ctx.runner, &params.domain, &params.email)?;
    Ok(PhaseStatus::Done)
}
