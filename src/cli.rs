use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::lock::LockRetry;
use crate::params::{DEFAULT_CACHE_PATH, RawParams, RunOptions};
use crate::prompt::parse_yes_no;

/// Command-line flags. Value flags have no clap defaults so that an
/// unset flag falls through to the cache and then the prompt.
#[derive(Debug, Parser)]
#[command(name = "horilla-install")]
#[command(about = "Install Horilla HRMS on an Ubuntu or Debian server")]
#[command(version)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Public domain name, e.g. hrms.example.com
    #[arg(long)]
    pub domain: Option<String>,

    /// Email for Let's Encrypt and the admin account
    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub admin_username: Option<String>,

    #[arg(long)]
    pub admin_password: Option<String>,

    /// Where the application is checked out [default: /opt/horilla]
    #[arg(long)]
    pub install_dir: Option<String>,

    #[arg(long)]
    pub db_name: Option<String>,

    #[arg(long)]
    pub db_user: Option<String>,

    #[arg(long)]
    pub db_password: Option<String>,

    /// Never prompt; fail on missing required values
    #[arg(long)]
    pub non_interactive: bool,

    /// Log failed steps and keep going instead of aborting
    #[arg(long)]
    pub force_continue: bool,

    /// Do not request a TLS certificate
    #[arg(long)]
    pub force_no_ssl: bool,

    /// Skip `apt-get upgrade`
    #[arg(long)]
    pub skip_upgrade: bool,

    /// Allow running without root privileges
    #[arg(long)]
    pub skip_root_check: bool,

    /// Configure scheduled backups to remote storage (yes/no)
    #[arg(
        long,
        value_name = "YES|NO",
        num_args = 0..=1,
        default_missing_value = "yes",
        value_parser = parse_switch
    )]
    pub enable_backups: Option<bool>,

    /// Storage provider menu number (1-41)
    #[arg(long)]
    pub s3_provider: Option<String>,

    #[arg(long)]
    pub s3_access_key: Option<String>,

    #[arg(long)]
    pub s3_secret_key: Option<String>,

    /// Region, endpoint, host or path, depending on the provider
    #[arg(long)]
    pub s3_region: Option<String>,

    #[arg(long)]
    pub s3_bucket_name: Option<String>,

    /// 1/daily, 2/weekly or 3/monthly
    #[arg(long)]
    pub backup_frequency: Option<String>,

    /// Attempts per round while the package manager is locked
    #[arg(long, default_value_t = 10)]
    pub lock_retries: u32,

    /// Seconds between lock retries
    #[arg(long, default_value_t = 15)]
    pub lock_retry_delay: u64,

    /// Parameter cache file
    #[arg(long, default_value = DEFAULT_CACHE_PATH)]
    pub config_cache: PathBuf,

    /// Validate and print what would be written, run nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Flag values as the highest-precedence parameter source.
    #[must_use]
    pub fn raw_params(&self) -> RawParams {
        RawParams {
            domain: self.domain.clone(),
            email: self.email.clone(),
            admin_username: self.admin_username.clone(),
            admin_password: self.admin_password.clone(),
            install_dir: self.install_dir.clone(),
            db_name: self.db_name.clone(),
            db_user: self.db_user.clone(),
            db_password: self.db_password.clone(),
            enable_backups: self.enable_backups,
            s3_provider: self.s3_provider.clone(),
            s3_access_key: self.s3_access_key.clone(),
            s3_secret_key: self.s3_secret_key.clone(),
            s3_region: self.s3_region.clone(),
            s3_bucket_name: self.s3_bucket_name.clone(),
            backup_frequency: self.backup_frequency.clone(),
        }
    }

    /// Run options. `stdin_is_terminal` forces non-interactive mode
    /// when false.
    #[must_use]
    pub const fn options(&self, stdin_is_terminal: bool) -> RunOptions {
        RunOptions {
            non_interactive: self.non_interactive || !stdin_is_terminal,
            force_continue: self.force_continue,
            force_no_ssl: self.force_no_ssl,
            skip_upgrade: self.skip_upgrade,
            skip_root_check: self.skip_root_check,
            dry_run: self.dry_run,
        }
    }

    #[must_use]
    pub const fn lock_retry(&self) -> LockRetry {
        LockRetry::new(self.lock_retries, Duration::from_secs(self.lock_retry_delay))
    }
}

fn parse_switch(value: &str) -> Result<bool, String> {
    parse_yes_no(value).ok_or_else(|| format!("expected yes or no, got `{value}`"))
}
