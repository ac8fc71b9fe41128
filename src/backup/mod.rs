//! Optional remote backups via rclone and cron.
//!
//! Storage backends need different credentials: an S3 bucket wants
//! an access key pair and a region, Storj wants an access grant,
//! SFTP wants a host and a login. [`BackupProvider`] carries exactly
//! the fields its backend needs; the flat numbered menu shown to the
//! operator lives in [`MENU`].

pub mod rclone;
pub mod script;

use std::fmt;
use std::str::FromStr;

use tracing::{info, warn};

use crate::app::App;
use crate::artifact::Artifact;
use crate::cmd::run_checked;
use crate::cron;
use crate::deploy::ComposeTool;
use crate::error::{InstallError, InstallResult};
use crate::params::Params;
use crate::pipeline::{Context, PhaseStatus};
use crate::provision::apt;
use crate::validate;

/// Name of the rclone remote written by the installer.
pub const REMOTE_NAME: &str = "horilla-backup";

/// Local backups kept after each run.
pub const LOCAL_RETENTION: u32 = 7;

/// Numbered provider menu, as shown to the operator and accepted by
/// `--s3-provider`. HTTP remotes are read-only in rclone and are not
/// offered.
pub const MENU: [(u8, &str); 40] = [
    (1, "AWS S3"),
    (2, "Wasabi"),
    (3, "Backblaze B2"),
    (4, "DigitalOcean Spaces"),
    (5, "Other S3-compatible"),
    (6, "Cloudflare R2"),
    (7, "Google Cloud Storage"),
    (8, "Microsoft Azure Blob Storage"),
    (9, "OpenStack Swift"),
    (10, "Minio"),
    (11, "Alibaba Cloud OSS"),
    (12, "IBM COS S3"),
    (13, "Huawei OBS"),
    (14, "Tencent COS"),
    (15, "Oracle Cloud Storage"),
    (16, "Linode Object Storage"),
    (17, "Scaleway"),
    (18, "Storj"),
    (19, "Qiniu"),
    (20, "HDFS"),
    (21, "Local filesystem"),
    (22, "SFTP"),
    (23, "FTP"),
    (25, "WebDAV"),
    (26, "Microsoft OneDrive"),
    (27, "Google Drive"),
    (28, "Dropbox"),
    (29, "pCloud"),
    (30, "Box"),
    (31, "Mega"),
    (32, "Proton Drive"),
    (33, "Jottacloud"),
    (34, "Koofr"),
    (35, "Yandex Disk"),
    (36, "Nextcloud"),
    (37, "ownCloud"),
    (38, "Seafile"),
    (39, "SMB / CIFS"),
    (40, "Ceph"),
    (41, "Other S3 compatible"),
];

/// Display name of a menu entry.
#[must_use]
pub fn menu_name(number: u8) -> Option<&'static str> {
    MENU.iter().find(|(n, _)| *n == number).map(|(_, name)| *name)
}

/// S3-compatible object stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum S3Vendor {
    Aws,
    Wasabi,
    DigitalOcean,
    Cloudflare,
    GoogleCloud,
    Minio,
    Alibaba,
    IbmCos,
    HuaweiObs,
    TencentCos,
    Oracle,
    Linode,
    Scaleway,
    Qiniu,
    Ceph,
    Other,
}

/// What the free-form location field means for a vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationKind {
    /// An AWS-style region, checked with the region corrector.
    AwsRegion,
    /// A vendor-specific region or account id used in the endpoint.
    VendorRegion,
    /// A full endpoint host or URL.
    Endpoint,
    /// Not used.
    None,
}

impl S3Vendor {
    /// rclone `provider` value.
    #[must_use]
    pub const fn rclone_provider(self) -> &'static str {
        match self {
            Self::Aws => "AWS",
            Self::Wasabi => "Wasabi",
            Self::DigitalOcean => "DigitalOcean",
            Self::Cloudflare => "Cloudflare",
            Self::GoogleCloud => "GCS",
            Self::Minio => "Minio",
            Self::Alibaba => "Alibaba",
            Self::IbmCos => "IBMCOS",
            Self::HuaweiObs => "HuaweiOBS",
            Self::TencentCos => "TencentCOS",
            Self::Linode => "Linode",
            Self::Scaleway => "Scaleway",
            Self::Qiniu => "Qiniu",
            Self::Ceph => "Ceph",
            Self::Oracle | Self::Other => "Other",
        }
    }

    #[must_use]
    pub const fn location_kind(self) -> LocationKind {
        match self {
            Self::Aws | Self::Wasabi => LocationKind::AwsRegion,
            Self::GoogleCloud => LocationKind::None,
            Self::Minio | Self::Ceph | Self::Other => LocationKind::Endpoint,
            _ => LocationKind::VendorRegion,
        }
    }

    /// Endpoint derived from the location, if the vendor needs one.
    #[must_use]
    pub fn endpoint(self, location: &str) -> Option<String> {
        let l = location;
        match self {
            Self::Aws => None,
            Self::Wasabi => Some(format!("s3.{l}.wasabisys.com")),
            Self::DigitalOcean => Some(format!("{l}.digitaloceanspaces.com")),
            Self::Cloudflare => Some(format!("{l}.r2.cloudflarestorage.com")),
            Self::GoogleCloud => Some("https://storage.googleapis.com".to_string()),
            Self::Alibaba => Some(format!("oss-{l}.aliyuncs.com")),
            Self::IbmCos => Some(format!("s3.{l}.cloud-object-storage.appdomain.cloud")),
            Self::HuaweiObs => Some(format!("obs.{l}.myhuaweicloud.com")),
            Self::TencentCos => Some(format!("cos.{l}.myqcloud.com")),
            Self::Oracle => Some(format!("{l}.storage.oracle.com")),
            Self::Linode => Some(format!("{l}.linodeobjects.com")),
            Self::Scaleway => Some(format!("s3.{l}.scw.cloud")),
            Self::Qiniu => Some(format!("s3-{l}.qiniucs.com")),
            Self::Minio | Self::Ceph | Self::Other => Some(l.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferProtocol {
    Sftp,
    Ftp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebDavVendor {
    Generic,
    Nextcloud,
    Owncloud,
    Seafile,
}

impl WebDavVendor {
    #[must_use]
    pub const fn rclone_vendor(self) -> &'static str {
        match self {
            Self::Nextcloud => "nextcloud",
            Self::Owncloud => "owncloud",
            Self::Generic | Self::Seafile => "other",
        }
    }
}

/// Backends that log in with a username and password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginBackend {
    Mega,
    ProtonDrive,
    Koofr,
}

/// Backends that need an OAuth token from `rclone authorize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthBackend {
    OneDrive,
    Drive,
    Dropbox,
    PCloud,
    Box,
    Jottacloud,
    Yandex,
}

impl OAuthBackend {
    #[must_use]
    pub const fn rclone_type(self) -> &'static str {
        match self {
            Self::OneDrive => "onedrive",
            Self::Drive => "drive",
            Self::Dropbox => "dropbox",
            Self::PCloud => "pcloud",
            Self::Box => "box",
            Self::Jottacloud => "jottacloud",
            Self::Yandex => "yandex",
        }
    }
}

/// Remote storage backend with exactly the fields it requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupProvider {
    S3 {
        vendor: S3Vendor,
        access_key_id: String,
        secret_access_key: String,
        location: String,
    },
    B2 {
        account: String,
        key: String,
    },
    AzureBlob {
        account: String,
        key: String,
    },
    Swift {
        user: String,
        key: String,
        auth_url: String,
    },
    Storj {
        access_grant: String,
    },
    FileTransfer {
        protocol: TransferProtocol,
        host: String,
        user: String,
        pass: String,
    },
    WebDav {
        vendor: WebDavVendor,
        url: String,
        user: String,
        pass: String,
    },
    Smb {
        host: String,
        user: String,
        pass: String,
    },
    Hdfs {
        namenode: String,
    },
    Local {
        path: String,
    },
    Login {
        backend: LoginBackend,
        user: String,
        pass: String,
    },
    OAuth {
        backend: OAuthBackend,
        token: String,
    },
}

/// Raw credential fields as gathered from flags or prompts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderInput {
    pub access_key: String,
    pub secret_key: String,
    pub location: String,
}

/// Labels for the credential fields a menu entry asks for. `None`
/// means the field is not used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLabels {
    pub access: Option<&'static str>,
    pub secret: Option<&'static str>,
    pub location: Option<&'static str>,
}

impl InputLabels {
    const fn new(
        access: Option<&'static str>,
        secret: Option<&'static str>,
        location: Option<&'static str>,
    ) -> Self {
        Self {
            access,
            secret,
            location,
        }
    }
}

const fn s3_vendor(number: u8) -> Option<S3Vendor> {
    Some(match number {
        1 => S3Vendor::Aws,
        2 => S3Vendor::Wasabi,
        4 => S3Vendor::DigitalOcean,
        5 | 41 => S3Vendor::Other,
        6 => S3Vendor::Cloudflare,
        7 => S3Vendor::GoogleCloud,
        10 => S3Vendor::Minio,
        11 => S3Vendor::Alibaba,
        12 => S3Vendor::IbmCos,
        13 => S3Vendor::HuaweiObs,
        14 => S3Vendor::TencentCos,
        15 => S3Vendor::Oracle,
        16 => S3Vendor::Linode,
        17 => S3Vendor::Scaleway,
        19 => S3Vendor::Qiniu,
        40 => S3Vendor::Ceph,
        _ => return None,
    })
}

const fn oauth_backend(number: u8) -> Option<OAuthBackend> {
    Some(match number {
        26 => OAuthBackend::OneDrive,
        27 => OAuthBackend::Drive,
        28 => OAuthBackend::Dropbox,
        29 => OAuthBackend::PCloud,
        30 => OAuthBackend::Box,
        33 => OAuthBackend::Jottacloud,
        35 => OAuthBackend::Yandex,
        _ => return None,
    })
}

const fn login_backend(number: u8) -> Option<LoginBackend> {
    Some(match number {
        31 => LoginBackend::Mega,
        32 => LoginBackend::ProtonDrive,
        34 => LoginBackend::Koofr,
        _ => return None,
    })
}

const fn webdav_vendor(number: u8) -> Option<WebDavVendor> {
    Some(match number {
        25 => WebDavVendor::Generic,
        36 => WebDavVendor::Nextcloud,
        37 => WebDavVendor::Owncloud,
        38 => WebDavVendor::Seafile,
        _ => return None,
    })
}

/// Which credential fields a menu entry needs.
#[must_use]
pub fn input_labels(number: u8) -> Option<InputLabels> {
    const KEY: Option<&str> = Some("Access key");
    const SECRET: Option<&str> = Some("Secret key");
    const USER: Option<&str> = Some("Username");
    const PASS: Option<&str> = Some("Password");

    if let Some(vendor) = s3_vendor(number) {
        let location = match vendor.location_kind() {
            LocationKind::AwsRegion => Some("Region"),
            LocationKind::VendorRegion if vendor == S3Vendor::Cloudflare => Some("Account ID"),
            LocationKind::VendorRegion => Some("Region"),
            LocationKind::Endpoint => Some("Endpoint URL"),
            LocationKind::None => None,
        };
        return Some(InputLabels::new(KEY, SECRET, location));
    }
    if oauth_backend(number).is_some() {
        return Some(InputLabels::new(Some("OAuth token (JSON)"), None, None));
    }
    if login_backend(number).is_some() {
        return Some(InputLabels::new(USER, PASS, None));
    }
    if webdav_vendor(number).is_some() {
        return Some(InputLabels::new(USER, PASS, Some("Server URL")));
    }
    let labels = match number {
        3 => InputLabels::new(Some("Account ID"), Some("Application key"), None),
        8 => InputLabels::new(Some("Storage account"), Some("Account key"), None),
        9 => InputLabels::new(USER, Some("API key"), Some("Auth URL")),
        18 => InputLabels::new(Some("Access grant"), None, None),
        20 => InputLabels::new(None, None, Some("Namenode (host:port)")),
        21 => InputLabels::new(None, None, Some("Local path")),
        22 | 23 | 39 => InputLabels::new(USER, PASS, Some("Server address")),
        _ => return None,
    };
    Some(labels)
}

fn required(value: &str, field: &'static str) -> InstallResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(InstallError::MissingParameter(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn location_token(value: &str, field: &'static str) -> InstallResult<String> {
    let location = required(value, field)?;
    if location.chars().any(char::is_whitespace) {
        return Err(InstallError::Invalid {
            field,
            value: location,
        });
    }
    Ok(location)
}

impl BackupProvider {
    /// Build the provider for a menu entry from raw input, checking
    /// that every field the backend needs is present.
    pub fn from_menu(number: u8, input: &ProviderInput) -> InstallResult<Self> {
        const KEY: &str = "s3-access-key";
        const SECRET: &str = "s3-secret-key";
        const LOCATION: &str = "s3-region";

        if let Some(vendor) = s3_vendor(number) {
            let location = match vendor.location_kind() {
                LocationKind::AwsRegion if input.location.trim().is_empty() => {
                    validate::DEFAULT_REGION.to_string()
                }
                LocationKind::AwsRegion => validate::resolve_region(&input.location),
                LocationKind::VendorRegion | LocationKind::Endpoint => {
                    location_token(&input.location, LOCATION)?
                }
                LocationKind::None => String::new(),
            };
            return Ok(Self::S3 {
                vendor,
                access_key_id: required(&input.access_key, KEY)?,
                secret_access_key: required(&input.secret_key, SECRET)?,
                location,
            });
        }
        if let Some(backend) = oauth_backend(number) {
            return Ok(Self::OAuth {
                backend,
                token: required(&input.access_key, KEY)?,
            });
        }
        if let Some(backend) = login_backend(number) {
            return Ok(Self::Login {
                backend,
                user: required(&input.access_key, KEY)?,
                pass: required(&input.secret_key, SECRET)?,
            });
        }
        if let Some(vendor) = webdav_vendor(number) {
            return Ok(Self::WebDav {
                vendor,
                url: location_token(&input.location, LOCATION)?,
                user: required(&input.access_key, KEY)?,
                pass: required(&input.secret_key, SECRET)?,
            });
        }

        let provider = match number {
            3 => Self::B2 {
                account: required(&input.access_key, KEY)?,
                key: required(&input.secret_key, SECRET)?,
            },
            8 => Self::AzureBlob {
                account: required(&input.access_key, KEY)?,
                key: required(&input.secret_key, SECRET)?,
            },
            9 => Self::Swift {
                user: required(&input.access_key, KEY)?,
                key: required(&input.secret_key, SECRET)?,
                auth_url: location_token(&input.location, LOCATION)?,
            },
            18 => Self::Storj {
                access_grant: required(&input.access_key, KEY)?,
            },
            20 => Self::Hdfs {
                namenode: location_token(&input.location, LOCATION)?,
            },
            21 => Self::Local {
                path: location_token(&input.location, LOCATION)?,
            },
            22 | 23 => Self::FileTransfer {
                protocol: if number == 22 {
                    TransferProtocol::Sftp
                } else {
                    TransferProtocol::Ftp
                },
                host: location_token(&input.location, LOCATION)?,
                user: required(&input.access_key, KEY)?,
                pass: required(&input.secret_key, SECRET)?,
            },
            39 => Self::Smb {
                host: location_token(&input.location, LOCATION)?,
                user: required(&input.access_key, KEY)?,
                pass: required(&input.secret_key, SECRET)?,
            },
            _ => {
                return Err(InstallError::Invalid {
                    field: "s3-provider",
                    value: number.to_string(),
                });
            }
        };
        Ok(provider)
    }

    /// The menu entry this provider was built from.
    #[must_use]
    pub const fn menu_number(&self) -> u8 {
        match self {
            Self::S3 { vendor, .. } => match vendor {
                S3Vendor::Aws => 1,
                S3Vendor::Wasabi => 2,
                S3Vendor::DigitalOcean => 4,
                S3Vendor::Other => 5,
                S3Vendor::Cloudflare => 6,
                S3Vendor::GoogleCloud => 7,
                S3Vendor::Minio => 10,
                S3Vendor::Alibaba => 11,
                S3Vendor::IbmCos => 12,
                S3Vendor::HuaweiObs => 13,
                S3Vendor::TencentCos => 14,
                S3Vendor::Oracle => 15,
                S3Vendor::Linode => 16,
                S3Vendor::Scaleway => 17,
                S3Vendor::Qiniu => 19,
                S3Vendor::Ceph => 40,
            },
            Self::B2 { .. } => 3,
            Self::AzureBlob { .. } => 8,
            Self::Swift { .. } => 9,
            Self::Storj { .. } => 18,
            Self::Hdfs { .. } => 20,
            Self::Local { .. } => 21,
            Self::FileTransfer { protocol, .. } => match protocol {
                TransferProtocol::Sftp => 22,
                TransferProtocol::Ftp => 23,
            },
            Self::WebDav { vendor, .. } => match vendor {
                WebDavVendor::Generic => 25,
                WebDavVendor::Nextcloud => 36,
                WebDavVendor::Owncloud => 37,
                WebDavVendor::Seafile => 38,
            },
            Self::OAuth { backend, .. } => match backend {
                OAuthBackend::OneDrive => 26,
                OAuthBackend::Drive => 27,
                OAuthBackend::Dropbox => 28,
                OAuthBackend::PCloud => 29,
                OAuthBackend::Box => 30,
                OAuthBackend::Jottacloud => 33,
                OAuthBackend::Yandex => 35,
            },
            Self::Login { backend, .. } => match backend {
                LoginBackend::Mega => 31,
                LoginBackend::ProtonDrive => 32,
                LoginBackend::Koofr => 34,
            },
            Self::Smb { .. } => 39,
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &'static str {
        menu_name(self.menu_number()).unwrap_or("Unknown")
    }

    /// Raw input that rebuilds this provider, used for the parameter
    /// cache.
    #[must_use]
    pub fn to_input(&self) -> ProviderInput {
        let (access_key, secret_key, location) = match self {
            Self::S3 {
                access_key_id,
                secret_access_key,
                location,
                ..
            } => (access_key_id, secret_access_key.as_str(), location.as_str()),
            Self::B2 { account, key } | Self::AzureBlob { account, key } => (account, key.as_str(), ""),
            Self::Swift {
                user,
                key,
                auth_url,
            } => (user, key.as_str(), auth_url.as_str()),
            Self::Storj { access_grant } => (access_grant, "", ""),
            Self::FileTransfer {
                host, user, pass, ..
            }
            | Self::Smb { host, user, pass } => (user, pass.as_str(), host.as_str()),
            Self::WebDav { url, user, pass, .. } => (user, pass.as_str(), url.as_str()),
            Self::Hdfs { namenode } => return location_only(namenode),
            Self::Local { path } => return location_only(path),
            Self::Login { user, pass, .. } => (user, pass.as_str(), ""),
            Self::OAuth { token, .. } => (token, "", ""),
        };
        ProviderInput {
            access_key: access_key.clone(),
            secret_key: secret_key.to_string(),
            location: location.to_string(),
        }
    }

    /// OAuth backends cannot be probed until the operator finishes
    /// `rclone config` interactively.
    #[must_use]
    pub const fn needs_browser_auth(&self) -> bool {
        matches!(self, Self::OAuth { .. })
    }

    /// rclone path of the backup destination.
    #[must_use]
    pub fn target(&self, bucket: &str) -> String {
        match self {
            Self::Local { path } => {
                format!("{REMOTE_NAME}:{}/{bucket}", path.trim_end_matches('/'))
            }
            _ => format!("{REMOTE_NAME}:{bucket}"),
        }
    }
}

fn location_only(location: &str) -> ProviderInput {
    ProviderInput {
        location: location.to_string(),
        ..ProviderInput::default()
    }
}

/// How often the backup job runs. All schedules fire at 02:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackupFrequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl BackupFrequency {
    #[must_use]
    pub const fn cron_schedule(self) -> &'static str {
        match self {
            Self::Daily => "0 2 * * *",
            Self::Weekly => "0 2 * * 0",
            Self::Monthly => "0 2 1 * *",
        }
    }

    /// Menu number used in the cache and `--backup-frequency`.
    #[must_use]
    pub const fn menu_number(self) -> u8 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 2,
            Self::Monthly => 3,
        }
    }
}

impl FromStr for BackupFrequency {
    type Err = InstallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "daily" | "d" => Ok(Self::Daily),
            "2" | "weekly" | "w" => Ok(Self::Weekly),
            "3" | "monthly" | "m" => Ok(Self::Monthly),
            other => Err(InstallError::Invalid {
                field: "backup-frequency",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for BackupFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
        };
        f.write_str(name)
    }
}

/// Validated backup configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSettings {
    pub provider: BackupProvider,
    pub bucket: String,
    pub frequency: BackupFrequency,
}

impl BackupSettings {
    pub fn new(
        provider: BackupProvider,
        bucket: &str,
        frequency: BackupFrequency,
    ) -> InstallResult<Self> {
        let bucket = location_token(bucket, "s3-bucket-name")?;
        Ok(Self {
            provider,
            bucket,
            frequency,
        })
    }
}

/// The rclone config and backup script for `settings`.
pub fn artifacts<F>(
    params: &Params,
    app: &App,
    settings: &BackupSettings,
    compose: ComposeTool,
    obscure: F,
) -> InstallResult<Vec<Artifact>>
where
    F: FnMut(&str) -> InstallResult<String>,
{
    let remote = rclone::render(&settings.provider, obscure)?;
    let target = settings.provider.target(&settings.bucket);
    let script = script::render(&script::ScriptContext {
        app,
        install_dir: &params.install_dir,
        database: &params.database,
        compose: compose.invocation(),
        target: &target,
    });

    Ok(vec![
        Artifact::new(&params.paths.rclone_config, remote).mode(0o600),
        Artifact::new(script::script_path(&params.install_dir), script).mode(0o755),
    ])
}

/// Install rclone, write the remote and script, probe the remote,
/// and schedule the job.
pub fn configure(ctx: &mut Context<'_>) -> InstallResult<PhaseStatus> {
    let params = ctx.params;
    let Some(settings) = &params.backup else {
        return Ok(PhaseStatus::Skipped("backups are disabled".to_string()));
    };

    if let apt::AptStatus::Skipped(reason) = apt::install(ctx, &["rclone"])? {
        return Ok(PhaseStatus::Skipped(reason));
    }

    let compose = ctx.compose_tool()?;
    let runner = &mut *ctx.runner;
    let files = artifacts(params, ctx.app, settings, compose, |secret| {
        rclone::obscure_with(runner, secret)
    })?;
    for artifact in &files {
        artifact.write()?;
        info!("Wrote {}", artifact.path.display());
    }

    let provider = &settings.provider;
    if provider.needs_browser_auth() {
        warn!(
            "{} needs browser authentication; run 'rclone config reconnect {REMOTE_NAME}:' to finish setup",
            provider.display_name()
        );
    } else {
        info!("Testing connection to {}", provider.target(&settings.bucket));
        run_checked(ctx.runner, &rclone::probe_command(provider, &settings.bucket))?;
        info!("Connected to {}", provider.display_name());
    }

    let script = script::script_path(&params.install_dir);
    let line = script::cron_line(settings.frequency.cron_schedule(), &script);
    cron::install(ctx.runner, &script.display().to_string(), &line)?;
    info!("{} backups scheduled", settings.frequency);
    Ok(PhaseStatus::Done)
}
