use std::fmt::Write;
use std::time::Duration;

use crate::cmd::{CommandSpec, Runner, run_checked};
use crate::error::InstallResult;

use super::{BackupProvider, REMOTE_NAME, S3Vendor, TransferProtocol};

/// Render the rclone remote for `provider`.
///
/// Backends that store passwords expect them in rclone's obscured
/// form; `obscure` performs that conversion (usually via
/// [`obscure_with`]).
pub fn render<F>(provider: &BackupProvider, mut obscure: F) -> InstallResult<String>
where
    F: FnMut(&str) -> InstallResult<String>,
{
    let mut fields: Vec<(&str, String)> = Vec::new();

    match provider {
        BackupProvider::S3 {
            vendor,
            access_key_id,
            secret_access_key,
            location,
        } => {
            fields.push(("type", "s3".into()));
            fields.push(("provider", vendor.rclone_provider().into()));
            fields.push(("access_key_id", access_key_id.clone()));
            fields.push(("secret_access_key", secret_access_key.clone()));
            if let Some(endpoint) = vendor.endpoint(location) {
                fields.push(("endpoint", endpoint));
            }
            match vendor {
                S3Vendor::Aws | S3Vendor::Wasabi => fields.push(("region", location.clone())),
                S3Vendor::Cloudflare => fields.push(("region", "auto".into())),
                _ => {}
            }
        }
        BackupProvider::B2 { account, key } => {
            fields.push(("type", "b2".into()));
            fields.push(("account", account.clone()));
            fields.push(("key", key.clone()));
        }
        BackupProvider::AzureBlob { account, key } => {
            fields.push(("type", "azureblob".into()));
            fields.push(("account", account.clone()));
            fields.push(("key", key.clone()));
        }
        BackupProvider::Swift {
            user,
            key,
            auth_url,
        } => {
            fields.push(("type", "swift".into()));
            fields.push(("user", user.clone()));
            fields.push(("key", key.clone()));
            fields.push(("auth", auth_url.clone()));
        }
        BackupProvider::Storj { access_grant } => {
            fields.push(("type", "storj".into()));
            fields.push(("access_grant", access_grant.clone()));
        }
        BackupProvider::FileTransfer {
            protocol,
            host,
            user,
            pass,
        } => {
            let kind = match protocol {
                TransferProtocol::Sftp => "sftp",
                TransferProtocol::Ftp => "ftp",
            };
            fields.push(("type", kind.into()));
            fields.push(("host", host.clone()));
            fields.push(("user", user.clone()));
            fields.push(("pass", obscure(pass)?));
        }
        BackupProvider::WebDav {
            vendor,
            url,
            user,
            pass,
        } => {
            fields.push(("type", "webdav".into()));
            fields.push(("url", url.clone()));
            fields.push(("vendor", vendor.rclone_vendor().into()));
            fields.push(("user", user.clone()));
            fields.push(("pass", obscure(pass)?));
        }
        BackupProvider::Smb { host, user, pass } => {
            fields.push(("type", "smb".into()));
            fields.push(("host", host.clone()));
            fields.push(("user", user.clone()));
            fields.push(("pass", obscure(pass)?));
            fields.push(("domain", "WORKGROUP".into()));
        }
        BackupProvider::Hdfs { namenode } => {
            fields.push(("type", "hdfs".into()));
            fields.push(("namenode", namenode.clone()));
        }
        BackupProvider::Local { .. } => {
            fields.push(("type", "local".into()));
        }
        BackupProvider::Login {
            backend,
            user,
            pass,
        } => {
            let kind = match backend {
                super::LoginBackend::Mega => "mega",
                super::LoginBackend::ProtonDrive => "protondrive",
                super::LoginBackend::Koofr => "koofr",
            };
            fields.push(("type", kind.into()));
            fields.push(("user", user.clone()));
            fields.push(("pass", obscure(pass)?));
        }
        BackupProvider::OAuth { backend, token } => {
            fields.push(("type", backend.rclone_type().into()));
            fields.push(("token", token.clone()));
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "[{REMOTE_NAME}]");
    for (key, value) in fields {
        let _ = writeln!(out, "{key} = {value}");
    }
    Ok(out)
}

/// Obscure a password with `rclone obscure`.
pub fn obscure_with(runner: &mut dyn Runner, secret: &str) -> InstallResult<String> {
    let spec = CommandSpec::new("rclone")
        .arg("obscure")
        .arg("-")
        .stdin(secret)
        .timeout(Duration::from_secs(30));
    let output = run_checked(runner, &spec)?;
    Ok(output.trim().to_string())
}

/// `rclone mkdir` on the backup destination, used as a connectivity
/// probe.
#[must_use]
pub fn probe_command(provider: &BackupProvider, bucket: &str) -> CommandSpec {
    CommandSpec::new("rclone")
        .arg("mkdir")
        .arg(&format!("{}/horilla-backups", provider.target(bucket)))
        .timeout(Duration::from_secs(30))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::{OAuthBackend, WebDavVendor};

    fn fake_obscure(secret: &str) -> InstallResult<String> {
        Ok(format!("obscured({secret})"))
    }

    #[test]
    fn aws_remote() {
        let provider = BackupProvider::S3 {
            vendor: S3Vendor::Aws,
            access_key_id: "AKIA".into(),
            secret_access_key: "shh".into(),
            location: "eu-west-1".into(),
        };

        let out = render(&provider, fake_obscure).unwrap();

        assert_eq!(
            out,
            "[horilla-backup]\ntype = s3\nprovider = AWS\naccess_key_id = AKIA\nsecret_access_key = shh\nregion = eu-west-1\n"
        );
    }

    #[test]
    fn wasabi_derives_endpoint() {
        let provider = BackupProvider::S3 {
            vendor: S3Vendor::Wasabi,
            access_key_id: "k".into(),
            secret_access_key: "s".into(),
            location: "us-east-2".into(),
        };

        let out = render(&provider, fake_obscure).unwrap();

        assert!(out.contains("endpoint = s3.us-east-2.wasabisys.com\n"));
    }

    #[test]
    fn passwords_are_obscured() {
        let provider = BackupProvider::WebDav {
            vendor: WebDavVendor::Nextcloud,
            url: "https://cloud.example.com/remote.php/dav".into(),
            user: "hr".into(),
            pass: "hunter2".into(),
        };

        let out = render(&provider, fake_obscure).unwrap();

        assert!(out.contains("vendor = nextcloud\n"));
        assert!(out.contains("pass = obscured(hunter2)\n"));
        assert!(!out.contains("pass = hunter2"));
    }

    #[test]
    fn oauth_carries_token() {
        let provider = BackupProvider::OAuth {
            backend: OAuthBackend::Dropbox,
            token: "{\"access_token\":\"x\"}".into(),
        };

        let out = render(&provider, fake_obscure).unwrap();

        assert!(out.contains("type = dropbox\n"));
        assert!(out.contains("token = {\"access_token\":\"x\"}\n"));
    }

    #[test]
    fn probe_targets_backup_folder() {
        let provider = BackupProvider::Storj {
            access_grant: "grant".into(),
        };

        assert_eq!(
            probe_command(&provider, "hr-backups").display(),
            "rclone mkdir horilla-backup:hr-backups/horilla-backups"
        );
    }
}
