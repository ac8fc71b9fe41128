//! Host preparation: OS check, apt packages, Docker, nginx.

pub mod apt;
pub mod docker;

use std::fs;
use std::os::unix::fs::symlink;
use std::time::Duration;

use tracing::info;

use crate::cmd::{CommandSpec, Runner, run_checked};
use crate::error::{InstallError, InstallResult};
use crate::nginx::SitePaths;
use crate::pipeline::{Context, PhaseStatus};

const SUPPORTED: [&str; 2] = ["ubuntu", "debian"];

const PROXY_PACKAGES: [&str; 3] = ["nginx", "certbot", "python3-certbot-nginx"];

/// The fields of `/etc/os-release` the installer cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    pub id: String,
    pub id_like: Vec<String>,
    pub pretty_name: String,
}

impl OsRelease {
    #[must_use]
    pub fn parse(contents: &str) -> Self {
        let mut release = Self::default();
        for line in contents.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').trim_matches('\'');
            match key.trim() {
                "ID" => release.id = value.to_lowercase(),
                "ID_LIKE" => {
                    release.id_like = value.split_whitespace().map(str::to_lowercase).collect();
                }
                "PRETTY_NAME" => release.pretty_name = value.to_string(),
                _ => {}
            }
        }
        release
    }

    /// Ubuntu, Debian, or a derivative of either.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        SUPPORTED.contains(&self.id.as_str())
            || self.id_like.iter().any(|id| SUPPORTED.contains(&id.as_str()))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        if self.pretty_name.is_empty() {
            &self.id
        } else {
            &self.pretty_name
        }
    }
}

pub fn check_system(ctx: &mut Context<'_>) -> InstallResult<PhaseStatus> {
    let path = &ctx.params.paths.os_release;
    let contents = fs::read_to_string(path).map_err(|e| {
        InstallError::UnsupportedSystem(format!("cannot read {}: {e}", path.display()))
    })?;
    let release = OsRelease::parse(&contents);
    if !release.is_supported() {
        return Err(InstallError::UnsupportedSystem(release.name().to_string()));
    }
    info!("Detected {}", release.name());
    Ok(PhaseStatus::Done)
}

pub fn install_proxy(ctx: &mut Context<'_>) -> InstallResult<PhaseStatus> {
    Ok(apt::install(ctx, &PROXY_PACKAGES)?.into())
}

/// Link the site into `sites-enabled`, replacing a stale link.
pub fn enable_site(paths: &SitePaths) -> InstallResult<()> {
    if let Some(parent) = paths.enabled.parent() {
        fs::create_dir_all(parent)?;
    }
    if fs::symlink_metadata(&paths.enabled).is_ok() {
        fs::remove_file(&paths.enabled)?;
    }
    symlink(&paths.available, &paths.enabled)?;
    Ok(())
}

/// Validate the nginx configuration, then reload it.
pub fn reload_nginx(runner: &mut dyn Runner) -> InstallResult<()> {
    run_checked(runner, &CommandSpec::new("nginx").arg("-t").timeout(Duration::from_secs(30)))?;
    run_checked(
        runner,
        &CommandSpec::new("systemctl")
            .args(["reload", "nginx"])
            .timeout(Duration::from_secs(30)),
    )?;
    info!("nginx reloaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ubuntu() {
        let release = OsRelease::parse(
            "NAME=\"Ubuntu\"\nVERSION_ID=\"22.04\"\nID=ubuntu\nID_LIKE=debian\nPRETTY_NAME=\"Ubuntu 22.04.4 LTS\"\n",
        );

        assert_eq!(release.id, "ubuntu");
        assert_eq!(release.id_like, vec!["debian"]);
        assert_eq!(release.name(), "Ubuntu 22.04.4 LTS");
        assert!(release.is_supported());
    }

    #[test]
    fn derivatives_are_supported() {
        let release = OsRelease::parse("ID=linuxmint\nID_LIKE=\"ubuntu debian\"\n");

        assert!(release.is_supported());
    }

    #[test]
    fn rejects_other_distributions() {
        let release = OsRelease::parse("ID=fedora\nPRETTY_NAME=\"Fedora Linux 40\"\n");

        assert!(!release.is_supported());
        assert_eq!(release.name(), "Fedora Linux 40");
    }

    #[test]
    fn enable_site_replaces_link() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SitePaths::new(
            &dir.path().join("available"),
            &dir.path().join("enabled"),
            "horilla",
        );
        fs::create_dir_all(dir.path().join("available")).unwrap();
        fs::write(&paths.available, "server {}").unwrap();

        enable_site(&paths).unwrap();
        enable_site(&paths).unwrap();

        assert_eq!(fs::read_link(&paths.enabled).unwrap(), paths.available);
    }
}
