//! Installation parameters.
//!
//! Values are merged once, in precedence order: CLI flag, the cache
//! of a previous run, an interactive prompt (whose default is the
//! cached or built-in value), then the built-in default. The result
//! is a validated [`Params`] that the pipeline only ever reads.

use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::artifact::Artifact;
use crate::backup::{
    self, BackupFrequency, BackupProvider, BackupSettings, MENU, ProviderInput,
};
use crate::cmd::{CommandSpec, Runner};
use crate::error::{InstallError, InstallResult};
use crate::lock::LockRetry;
use crate::prompt::{self, Prompt};
use crate::validate;

pub const DEFAULT_CACHE_PATH: &str = "/tmp/horilla_install_config.json";
pub const DEFAULT_INSTALL_DIR: &str = "/opt/horilla";
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "Admin@123";
pub const DEFAULT_EMAIL: &str = "admin@example.com";
pub const DEFAULT_DB: &str = "horilla";
const DEFAULT_PROVIDER: &str = "1";

/// Parameter values before merging and validation. Also the on-disk
/// shape of the parameter cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_backups: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_access_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_secret_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_bucket_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_frequency: Option<String>,
}

macro_rules! overlay_fields {
    ($upper:ident, $lower:ident, $($field:ident),+ $(,)?) => {
        Self { $($field: $upper.$field.or($lower.$field)),+ }
    };
}

impl RawParams {
    /// Fill unset fields from `lower`; fields set here win.
    #[must_use]
    pub fn overlay(self, lower: Self) -> Self {
        let upper = self;
        overlay_fields!(
            upper,
            lower,
            domain,
            email,
            admin_username,
            admin_password,
            install_dir,
            db_name,
            db_user,
            db_password,
            enable_backups,
            s3_provider,
            s3_access_key,
            s3_secret_key,
            s3_region,
            s3_bucket_name,
            backup_frequency,
        )
    }
}

/// Switches that change how the run behaves rather than what it
/// installs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunOptions {
    pub non_interactive: bool,
    pub force_continue: bool,
    pub force_no_ssl: bool,
    pub skip_upgrade: bool,
    pub skip_root_check: bool,
    pub dry_run: bool,
}

/// Host locations the installer writes to. Overridable so tests can
/// point everything at a temporary directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    pub os_release: PathBuf,
    pub nginx_sites_available: PathBuf,
    pub nginx_sites_enabled: PathBuf,
    pub rclone_config: PathBuf,
    pub cache: PathBuf,
}

impl Default for HostPaths {
    fn default() -> Self {
        Self {
            os_release: PathBuf::from("/etc/os-release"),
            nginx_sites_available: PathBuf::from("/etc/nginx/sites-available"),
            nginx_sites_enabled: PathBuf::from("/etc/nginx/sites-enabled"),
            rclone_config: PathBuf::from("/root/.config/rclone/rclone.conf"),
            cache: PathBuf::from(DEFAULT_CACHE_PATH),
        }
    }
}

impl HostPaths {
    /// Every host path rooted under `root`, for tests and sandboxes.
    #[must_use]
    pub fn under(root: &Path) -> Self {
        Self {
            os_release: root.join("etc/os-release"),
            nginx_sites_available: root.join("etc/nginx/sites-available"),
            nginx_sites_enabled: root.join("etc/nginx/sites-enabled"),
            rclone_config: root.join("root/.config/rclone/rclone.conf"),
            cache: root.join("tmp/horilla_install_config.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admin {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Database {
    pub name: String,
    pub user: String,
    pub password: String,
}

/// Validated installation parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Params {
    pub domain: String,
    pub email: String,
    pub admin: Admin,
    pub install_dir: PathBuf,
    pub database: Database,
    pub backup: Option<BackupSettings>,
    pub options: RunOptions,
    pub lock_retry: LockRetry,
    pub paths: HostPaths,
}

fn or_default(value: Option<&String>, default: &str) -> String {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn invalid(field: &'static str, value: &str) -> InstallError {
    InstallError::Invalid {
        field,
        value: value.to_string(),
    }
}

/// Django usernames: letters, digits and `@.+-_`.
#[must_use]
pub fn valid_username(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 150
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@.+-_".contains(c))
}

/// Database identifiers go unquoted into SQL and shell lines.
#[must_use]
pub fn valid_db_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 63
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit())
}

/// Passwords end up in `.env` lines; anything printable without
/// whitespace is accepted.
#[must_use]
pub fn valid_secret(value: &str) -> bool {
    !value.is_empty() && !value.chars().any(|c| c.is_whitespace() || c.is_control())
}

/// The path lands unquoted in the crontab line and nginx `alias`
/// directives, so only plain path characters are allowed.
#[must_use]
pub fn valid_install_dir(dir: &str) -> bool {
    let path = Path::new(dir);
    path.is_absolute()
        && path != Path::new("/")
        && dir
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '/' | '-'))
}

fn check(field: &'static str, value: String, ok: fn(&str) -> bool) -> InstallResult<String> {
    if ok(&value) {
        Ok(value)
    } else {
        Err(invalid(field, &value))
    }
}

impl Params {
    /// Resolve parameters without prompting. A missing domain, or
    /// missing backup credentials while backups are enabled, is an
    /// error; so is any value that fails validation.
    pub fn resolve(
        raw: &RawParams,
        options: RunOptions,
        lock_retry: LockRetry,
        paths: HostPaths,
    ) -> InstallResult<Self> {
        let domain = non_empty(raw.domain.as_ref()).ok_or(InstallError::MissingParameter("domain"))?;
        let domain = check("domain", domain, validate::validate_domain)?;
        let email = check(
            "email",
            or_default(raw.email.as_ref(), DEFAULT_EMAIL),
            validate::validate_email,
        )?;

        let admin = Admin {
            username: check(
                "admin-username",
                or_default(raw.admin_username.as_ref(), DEFAULT_ADMIN_USERNAME),
                valid_username,
            )?,
            password: check(
                "admin-password",
                or_default(raw.admin_password.as_ref(), DEFAULT_ADMIN_PASSWORD),
                valid_secret,
            )?,
        };
        let install_dir = check(
            "install-dir",
            or_default(raw.install_dir.as_ref(), DEFAULT_INSTALL_DIR),
            valid_install_dir,
        )?;
        let database = Database {
            name: check("db-name", or_default(raw.db_name.as_ref(), DEFAULT_DB), valid_db_identifier)?,
            user: check("db-user", or_default(raw.db_user.as_ref(), DEFAULT_DB), valid_db_identifier)?,
            password: check(
                "db-password",
                or_default(raw.db_password.as_ref(), DEFAULT_DB),
                valid_secret,
            )?,
        };

        let backup = if raw.enable_backups.unwrap_or(false) {
            Some(resolve_backup(raw)?)
        } else {
            None
        };

        Ok(Self {
            domain,
            email,
            admin,
            install_dir: PathBuf::from(install_dir),
            database,
            backup,
            options,
            lock_retry,
            paths,
        })
    }

    /// Resolve parameters by prompting for each value, offering the
    /// flag, cached, or built-in value as the default. Invalid
    /// answers are asked again.
    pub fn resolve_interactive(
        raw: &RawParams,
        options: RunOptions,
        lock_retry: LockRetry,
        paths: HostPaths,
        prompt: &mut dyn Prompt,
        runner: &mut dyn Runner,
    ) -> InstallResult<Self> {
        let domain_default = match non_empty(raw.domain.as_ref()) {
            Some(domain) => domain,
            None => format!("horilla.{}.nip.io", detect_server_ip(runner)),
        };

        println!();
        println!("Horilla HRMS installation settings");
        println!("Press Enter to accept the value in brackets.");
        println!();

        let domain = prompt::ask_valid(
            prompt,
            "Domain name",
            Some(&domain_default),
            validate::validate_domain,
        )?;
        let email = prompt::ask_valid(
            prompt,
            "Email address (Let's Encrypt and admin)",
            Some(&or_default(raw.email.as_ref(), DEFAULT_EMAIL)),
            validate::validate_email,
        )?;
        let username = prompt::ask_valid(
            prompt,
            "Admin username",
            Some(&or_default(raw.admin_username.as_ref(), DEFAULT_ADMIN_USERNAME)),
            valid_username,
        )?;
        let password = prompt::ask_valid(
            prompt,
            "Admin password",
            Some(&or_default(raw.admin_password.as_ref(), DEFAULT_ADMIN_PASSWORD)),
            valid_secret,
        )?;
        let install_dir = prompt::ask_valid(
            prompt,
            "Installation directory",
            Some(&or_default(raw.install_dir.as_ref(), DEFAULT_INSTALL_DIR)),
            valid_install_dir,
        )?;

        let enable_backups = prompt::confirm(
            prompt,
            "Enable automated backups to remote storage?",
            raw.enable_backups.unwrap_or(false),
        )?;
        let backup = if enable_backups {
            Some(prompt_backup(raw, prompt)?)
        } else {
            None
        };

        // Database credentials only live inside the compose network,
        // so they are not worth a prompt.
        let resolved = Self::resolve(
            &RawParams {
                domain: Some(domain),
                email: Some(email),
                admin_username: Some(username),
                admin_password: Some(password),
                install_dir: Some(install_dir),
                enable_backups: Some(false),
                ..raw.clone()
            },
            options,
            lock_retry,
            paths,
        )?;
        Ok(Self { backup, ..resolved })
    }

    /// The cacheable form of these parameters.
    #[must_use]
    pub fn to_raw(&self) -> RawParams {
        let mut raw = RawParams {
            domain: Some(self.domain.clone()),
            email: Some(self.email.clone()),
            admin_username: Some(self.admin.username.clone()),
            admin_password: Some(self.admin.password.clone()),
            install_dir: Some(self.install_dir.display().to_string()),
            db_name: Some(self.database.name.clone()),
            db_user: Some(self.database.user.clone()),
            db_password: Some(self.database.password.clone()),
            enable_backups: Some(self.backup.is_some()),
            ..RawParams::default()
        };
        if let Some(backup) = &self.backup {
            let input = backup.provider.to_input();
            raw.s3_provider = Some(backup.provider.menu_number().to_string());
            raw.s3_access_key = Some(input.access_key);
            raw.s3_secret_key = Some(input.secret_key);
            raw.s3_region = Some(input.location);
            raw.s3_bucket_name = Some(backup.bucket.clone());
            raw.backup_frequency = Some(backup.frequency.menu_number().to_string());
        }
        raw
    }

    /// Public URL of the installation.
    #[must_use]
    pub fn url(&self) -> String {
        let scheme = if crate::certbot::skip_reason(&self.domain, self.options.force_no_ssl).is_some() {
            "http"
        } else {
            "https"
        };
        format!("{scheme}://{}", self.domain)
    }
}

fn parse_provider(raw: &RawParams) -> InstallResult<u8> {
    let value = or_default(raw.s3_provider.as_ref(), DEFAULT_PROVIDER);
    value
        .parse::<u8>()
        .ok()
        .filter(|n| backup::input_labels(*n).is_some())
        .ok_or_else(|| invalid("s3-provider", &value))
}

fn parse_frequency(raw: &RawParams) -> InstallResult<BackupFrequency> {
    non_empty(raw.backup_frequency.as_ref())
        .map_or(Ok(BackupFrequency::default()), |f| f.parse())
}

fn resolve_backup(raw: &RawParams) -> InstallResult<BackupSettings> {
    let number = parse_provider(raw)?;
    let input = ProviderInput {
        access_key: raw.s3_access_key.clone().unwrap_or_default(),
        secret_key: raw.s3_secret_key.clone().unwrap_or_default(),
        location: raw.s3_region.clone().unwrap_or_default(),
    };
    let provider = BackupProvider::from_menu(number, &input)?;
    let bucket = non_empty(raw.s3_bucket_name.as_ref())
        .ok_or(InstallError::MissingParameter("s3-bucket-name"))?;
    BackupSettings::new(provider, &bucket, parse_frequency(raw)?)
}

fn prompt_backup(raw: &RawParams, prompt: &mut dyn Prompt) -> InstallResult<BackupSettings> {
    println!();
    println!("Select a storage provider:");
    for (number, name) in MENU {
        println!("  {number:>2}. {name}");
    }

    let default_provider = or_default(raw.s3_provider.as_ref(), DEFAULT_PROVIDER);
    let choice = prompt::ask_valid(prompt, "Provider", Some(&default_provider), |a| {
        a.parse::<u8>()
            .ok()
            .and_then(backup::input_labels)
            .is_some()
    })?;
    let number: u8 = choice
        .parse()
        .map_err(|_| invalid("s3-provider", &choice))?;
    let labels = backup::input_labels(number).ok_or_else(|| invalid("s3-provider", &choice))?;

    // Cached credentials only make sense for the same provider.
    let same_provider = raw.s3_provider.as_deref() == Some(choice.as_str());
    let cached = |value: Option<&String>| {
        value
            .filter(|_| same_provider)
            .cloned()
            .unwrap_or_default()
    };

    let provider = loop {
        let mut input = ProviderInput::default();
        if let Some(label) = labels.access {
            input.access_key = ask_required(prompt, label, &cached(raw.s3_access_key.as_ref()))?;
        }
        if let Some(label) = labels.secret {
            input.secret_key = ask_required(prompt, label, &cached(raw.s3_secret_key.as_ref()))?;
        }
        if let Some(label) = labels.location {
            let fallback = if label == "Region" && matches!(number, 1 | 2) {
                or_default(raw.s3_region.as_ref(), validate::DEFAULT_REGION)
            } else {
                cached(raw.s3_region.as_ref())
            };
            input.location = ask_required(prompt, label, &fallback)?;
        }
        match BackupProvider::from_menu(number, &input) {
            Ok(provider) => break provider,
            Err(e) => println!("{e}. Please try again."),
        }
    };

    let bucket = prompt::ask_valid(
        prompt,
        "Bucket or folder name",
        raw.s3_bucket_name.as_deref(),
        |b| !b.is_empty() && !b.chars().any(char::is_whitespace),
    )?;

    println!("Backup frequency: 1. Daily  2. Weekly  3. Monthly");
    let default_frequency = or_default(raw.backup_frequency.as_ref(), "1");
    let frequency = prompt::ask_valid(prompt, "Frequency", Some(&default_frequency), |f| {
        f.parse::<BackupFrequency>().is_ok()
    })?;

    BackupSettings::new(provider, &bucket, frequency.parse()?)
}

fn ask_required(prompt: &mut dyn Prompt, label: &str, default: &str) -> InstallResult<String> {
    let default = (!default.is_empty()).then_some(default);
    prompt::ask_valid(prompt, label, default, |a| !a.trim().is_empty())
}

/// Reads and writes the parameter cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamCache {
    pub path: PathBuf,
}

impl ParamCache {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load cached values. A missing file is silently empty; an
    /// unreadable one is reported and ignored.
    #[must_use]
    pub fn load(&self) -> RawParams {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return RawParams::default(),
            Err(e) => {
                warn!("Could not read {}: {e}", self.path.display());
                return RawParams::default();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(raw) => {
                info!("Loaded previous settings from {}", self.path.display());
                raw
            }
            Err(e) => {
                warn!("Ignoring malformed settings cache {}: {e}", self.path.display());
                RawParams::default()
            }
        }
    }

    pub fn save(&self, params: &Params) -> InstallResult<()> {
        let json = serde_json::to_string_pretty(&params.to_raw())?;
        Artifact::new(&self.path, json).mode(0o600).write()?;
        debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}

/// First non-loopback IPv4 address found in command output.
#[must_use]
pub fn pick_ipv4(output: &str) -> Option<Ipv4Addr> {
    output
        .split_whitespace()
        .filter_map(|token| token.parse::<Ipv4Addr>().ok())
        .find(|ip| !ip.is_loopback() && !ip.is_unspecified())
}

/// Public IPv4 of this host, used for the default `nip.io` domain.
pub fn detect_server_ip(runner: &mut dyn Runner) -> Ipv4Addr {
    let probes = [
        CommandSpec::new("curl").args(["-s", "ifconfig.me"]),
        CommandSpec::new("curl").args(["-s", "ipv4.icanhazip.com"]),
        CommandSpec::new("hostname").arg("-I"),
    ];
    for probe in probes {
        let outcome = runner.run(&probe.timeout(Duration::from_secs(10)));
        if !outcome.succeeded {
            continue;
        }
        if let Some(ip) = pick_ipv4(&outcome.output) {
            return ip;
        }
    }
    warn!("Could not detect the server IP address, using 127.0.0.1");
    Ipv4Addr::LOCALHOST
}
