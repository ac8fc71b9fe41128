mod support;

use std::cell::RefCell;

use horilla_installer::App;
use horilla_installer::backup::{
    self, BackupFrequency, BackupProvider, BackupSettings, LoginBackend, MENU, ProviderInput,
    input_labels, menu_name, rclone,
};
use horilla_installer::deploy::ComposeTool;
use horilla_installer::error::InstallError;
use horilla_installer::params::RawParams;

use support::{Sandbox, unattended};

fn input(access: &str, secret: &str, location: &str) -> ProviderInput {
    ProviderInput {
        access_key: access.into(),
        secret_key: secret.into(),
        location: location.into(),
    }
}

#[test]
fn menu_skips_http_and_is_sorted() {
    let numbers: Vec<u8> = MENU.iter().map(|(n, _)| *n).collect();

    assert!(!numbers.contains(&24));
    assert!(numbers.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(menu_name(1), Some("AWS S3"));
    assert_eq!(menu_name(24), None);
}

#[test]
fn storj_needs_only_an_access_grant() {
    let labels = input_labels(18).unwrap();

    assert!(labels.access.is_some());
    assert!(labels.secret.is_none());
    assert!(labels.location.is_none());
    assert_eq!(
        BackupProvider::from_menu(18, &input("grant", "", "")).unwrap(),
        BackupProvider::Storj {
            access_grant: "grant".into()
        }
    );
}

#[test]
fn aws_without_region_uses_default() {
    let provider = BackupProvider::from_menu(1, &input("AKIA", "shh", "")).unwrap();

    assert!(matches!(
        provider,
        BackupProvider::S3 { ref location, .. } if location == "us-east-1"
    ));
}

#[test]
fn endpoint_providers_require_location() {
    let err = BackupProvider::from_menu(10, &input("k", "s", " ")).unwrap_err();

    assert!(matches!(err, InstallError::MissingParameter("s3-region")));
}

#[test]
fn mega_logs_in_with_password() {
    let provider = BackupProvider::from_menu(31, &input("hr@example.com", "pw", "")).unwrap();

    assert_eq!(
        provider,
        BackupProvider::Login {
            backend: LoginBackend::Mega,
            user: "hr@example.com".into(),
            pass: "pw".into(),
        }
    );
    assert!(!provider.needs_browser_auth());
    let conf = rclone::render(&provider, |p| Ok(format!("obscured:{p}"))).unwrap();
    assert!(conf.contains("type = mega\n"));
    assert!(conf.contains("pass = obscured:pw\n"));
}

#[test]
fn oauth_providers_need_browser_auth() {
    let provider = BackupProvider::from_menu(27, &input("{\"token\":1}", "", "")).unwrap();

    assert!(provider.needs_browser_auth());
    assert_eq!(provider.display_name(), "Google Drive");
}

#[test]
fn bucket_must_be_a_single_token() {
    let provider = BackupProvider::from_menu(21, &input("", "", "/mnt/backups")).unwrap();

    let err = BackupSettings::new(provider, "hr backups", BackupFrequency::Daily).unwrap_err();

    assert!(matches!(err, InstallError::Invalid { field: "s3-bucket-name", .. }));
}

#[test]
fn artifacts_write_private_remote_and_executable_script() {
    let sandbox = Sandbox::new();
    let raw = RawParams {
        enable_backups: Some(true),
        s3_provider: Some("22".into()),
        s3_access_key: Some("backup".into()),
        s3_secret_key: Some("hunter2".into()),
        s3_region: Some("sftp.example.com".into()),
        s3_bucket_name: Some("horilla".into()),
        ..sandbox.raw("hrms.example.com")
    };
    let params = sandbox.params(&raw, unattended());
    let settings = params.backup.clone().unwrap();
    let obscured = RefCell::new(Vec::new());

    let files = backup::artifacts(
        &params,
        &App::horilla(),
        &settings,
        ComposeTool::Standalone,
        |secret| {
            obscured.borrow_mut().push(secret.to_string());
            Ok("OBSCURED".to_string())
        },
    )
    .unwrap();

    assert_eq!(obscured.into_inner(), vec!["hunter2"]);
    assert_eq!(files.len(), 2);

    let remote = &files[0];
    assert_eq!(remote.path, sandbox.paths().rclone_config);
    assert_eq!(remote.mode, 0o600);
    assert!(remote.contents.contains("type = sftp\n"));
    assert!(remote.contents.contains("host = sftp.example.com\n"));
    assert!(remote.contents.contains("pass = OBSCURED\n"));

    let script = &files[1];
    assert_eq!(script.path, sandbox.install_dir().join("backups/backup.sh"));
    assert_eq!(script.mode, 0o755);
    assert!(script.contents.contains("docker-compose -f docker-compose.yml exec -T horilla-db pg_dump"));
    assert!(script.contents.contains("TARGET=\"horilla-backup:horilla\""));
}

#[test]
fn default_frequency_is_daily() {
    assert_eq!(BackupFrequency::default(), BackupFrequency::Daily);
    assert_eq!(BackupFrequency::Daily.cron_schedule(), "0 2 * * *");
    assert_eq!(BackupFrequency::Monthly.cron_schedule(), "0 2 1 * *");
    assert_eq!(BackupFrequency::Weekly.to_string(), "Weekly");
}
