use std::io::IsTerminal;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use tracing::{error, warn};

use horilla_installer::cli::Cli;
use horilla_installer::cmd::{DryRunner, Runner};
use horilla_installer::params::{HostPaths, ParamCache, Params};
use horilla_installer::prompt::Terminal;
use horilla_installer::{InstallError, Installer, SystemRunner, logging};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = ctrlc::set_handler(|| {
        println!();
        println!("Installation interrupted.");
        std::process::exit(1);
    }) {
        warn!("Could not install the interrupt handler: {e}");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let options = cli.options(std::io::stdin().is_terminal());

    if !options.skip_root_check && !options.dry_run && !nix::unistd::geteuid().is_root() {
        return Err(InstallError::NotRoot.into());
    }

    let cache = ParamCache::new(&cli.config_cache);
    let raw = cli.raw_params().overlay(cache.load());
    let paths = HostPaths {
        cache: cli.config_cache.clone(),
        ..HostPaths::default()
    };

    let mut system = SystemRunner;
    let mut dry = DryRunner;
    let runner: &mut dyn Runner = if options.dry_run { &mut dry } else { &mut system };

    let params = if options.non_interactive {
        Params::resolve(&raw, options, cli.lock_retry(), paths)
    } else {
        Params::resolve_interactive(
            &raw,
            options,
            cli.lock_retry(),
            paths,
            &mut Terminal,
            runner,
        )
    }
    .context("invalid installation parameters")?;

    let installer = Installer::new(&params);
    if options.dry_run {
        installer.preview()?;
        return Ok(());
    }

    if let Err(e) = cache.save(&params) {
        warn!("Could not save settings to {}: {e}", cache.path.display());
    }

    installer.run(runner, &mut Terminal)?;
    Ok(())
}
