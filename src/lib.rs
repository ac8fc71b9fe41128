//! Automated installer for Horilla HRMS on a single Ubuntu/Debian host.
//!
//! `horilla-install` takes a fresh server to a running, TLS-terminated
//! Horilla instance in one pass: apt packages, Docker and a compose
//! tool, an nginx site, a Let's Encrypt certificate, the application
//! containers with migrations and an admin account, and optionally a
//! scheduled rclone backup.
//!
//! # Overview
//!
//! An installation is driven by an [`Installer`] that wires together:
//!
//! - Validated [`Params`] built once from CLI flags, the parameter
//!   cache of a previous run, and interactive prompts
//! - An [`App`] describing the application source and container
//!   layout
//! - A [`Runner`](cmd::Runner) that executes every external command
//!   with a timeout
//! - A [`Prompt`](prompt::Prompt) used when the run is interactive
//!
//! # Architecture
//!
//! The pipeline is a fixed sequence of [`Phase`]s:
//!
//! 1. **Check system** - Ubuntu or Debian only
//! 2. **Container runtime** - apt update/upgrade, Docker, compose
//! 3. **Reverse proxy** - nginx and certbot packages
//! 4. **Fetch source** - clone or fast-forward the repository
//! 5. **Render artifacts** - `.env`, `docker-compose.yml`, nginx site
//! 6. **Start containers**, 7. **Migrate**, 8. **Create admin**
//! 9. **Issue certificate** - skipped for `nip.io` test domains
//! 10. **Configure backups** - rclone remote, script, cron entry
//!
//! A failing phase stops the run unless `--force-continue` is set.
//! Every apt invocation goes through the [`lock`] retry loop.
//!
//! # Example
//!
//! ```sh
//! sudo horilla-install --non-interactive \
//!     --domain hrms.example.com \
//!     --email admin@example.com \
//!     --admin-password 'S3cure!'
//! ```

// Allow noisy pedantic lints that don't add value for an
// installer crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod app;
pub mod artifact;
pub mod backup;
pub mod certbot;
pub mod cli;
pub mod cmd;
pub mod compose;
pub mod cron;
pub mod deploy;
pub mod envfile;
pub mod error;
pub mod lock;
pub mod logging;
pub mod nginx;
pub mod params;
pub mod pipeline;
pub mod prompt;
pub mod provision;
pub mod validate;

pub use app::App;
pub use cmd::{CommandOutcome, CommandSpec, Runner, SystemRunner};
pub use error::{InstallError, InstallResult};
pub use lock::LockRetry;
pub use params::Params;
pub use pipeline::{Installer, Phase, Report};
