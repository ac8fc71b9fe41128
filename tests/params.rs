mod support;

use std::fs;
use std::os::unix::fs::PermissionsExt;

use horilla_installer::backup::{BackupFrequency, BackupProvider, S3Vendor};
use horilla_installer::cmd::CommandOutcome;
use horilla_installer::error::InstallError;
use horilla_installer::params::{ParamCache, Params, RawParams, RunOptions};

use support::{FakeRunner, Sandbox, Scripted, instant_retry, unattended};

fn full_flags(sandbox: &Sandbox) -> RawParams {
    RawParams {
        email: Some("ops@example.com".into()),
        admin_username: Some("hradmin".into()),
        admin_password: Some("Sup3r-Secret".into()),
        db_name: Some("hrms".into()),
        db_user: Some("hrms_user".into()),
        db_password: Some("db-pass".into()),
        enable_backups: Some(true),
        s3_provider: Some("3".into()),
        s3_access_key: Some("0012ab".into()),
        s3_secret_key: Some("K001xyz".into()),
        s3_bucket_name: Some("hr-backups".into()),
        backup_frequency: Some("monthly".into()),
        ..sandbox.raw("hrms.example.com")
    }
}

#[test]
fn non_interactive_takes_every_flag() {
    let sandbox = Sandbox::new();

    let params = Params::resolve(
        &full_flags(&sandbox),
        unattended(),
        instant_retry(3),
        sandbox.paths(),
    )
    .unwrap();

    assert_eq!(params.domain, "hrms.example.com");
    assert_eq!(params.email, "ops@example.com");
    assert_eq!(params.admin.username, "hradmin");
    assert_eq!(params.database.user, "hrms_user");
    assert_eq!(params.install_dir, sandbox.install_dir());
    let backup = params.backup.unwrap();
    assert_eq!(backup.frequency, BackupFrequency::Monthly);
    assert_eq!(
        backup.provider,
        BackupProvider::B2 {
            account: "0012ab".into(),
            key: "K001xyz".into(),
        }
    );
}

#[test]
fn non_interactive_requires_domain() {
    let sandbox = Sandbox::new();
    let raw = RawParams {
        domain: None,
        ..full_flags(&sandbox)
    };

    let err = Params::resolve(&raw, unattended(), instant_retry(3), sandbox.paths()).unwrap_err();

    assert!(matches!(err, InstallError::MissingParameter("domain")));
}

#[test]
fn invalid_domain_is_rejected() {
    let sandbox = Sandbox::new();

    let err = Params::resolve(
        &sandbox.raw("not a domain"),
        unattended(),
        instant_retry(3),
        sandbox.paths(),
    )
    .unwrap_err();

    assert!(matches!(err, InstallError::Invalid { field: "domain", .. }));
}

#[test]
fn interactive_defaults_to_nip_io_domain() {
    let sandbox = Sandbox::new();
    let raw = RawParams {
        install_dir: Some(sandbox.install_dir().display().to_string()),
        ..RawParams::default()
    };
    let mut runner = FakeRunner::default().on("ifconfig.me", CommandOutcome::success("203.0.113.7"));
    // Enter accepts every default; "n" declines backups.
    let mut prompt = Scripted::new(&["", "", "", "", "", "n"]);

    let params = Params::resolve_interactive(
        &raw,
        RunOptions::default(),
        instant_retry(3),
        sandbox.paths(),
        &mut prompt,
        &mut runner,
    )
    .unwrap();

    assert_eq!(params.domain, "horilla.203.0.113.7.nip.io");
    assert_eq!(params.url(), "http://horilla.203.0.113.7.nip.io");
    assert!(params.backup.is_none());
    assert_eq!(prompt.questions.len(), 6);
}

#[test]
fn interactive_asks_again_after_invalid_answer() {
    let sandbox = Sandbox::new();
    let mut prompt = Scripted::new(&["bad domain", "hrms.example.com", "nope", "", "", "", "", ""]);

    let params = Params::resolve_interactive(
        &sandbox.raw("hrms.example.com"),
        RunOptions::default(),
        instant_retry(3),
        sandbox.paths(),
        &mut prompt,
        &mut FakeRunner::default(),
    )
    .unwrap();

    assert_eq!(params.domain, "hrms.example.com");
    assert_eq!(params.email, "admin@example.com");
    assert_eq!(prompt.questions[0], prompt.questions[1]);
    assert_eq!(prompt.questions[2], prompt.questions[3]);
    assert_eq!(params.url(), "https://hrms.example.com");
}

#[test]
fn interactive_backup_menu() {
    let sandbox = Sandbox::new();
    let mut prompt = Scripted::new(&[
        "", "", "", "", "", // domain, email, username, password, install dir
        "y", "2", "AKIA", "shh", "Tokyo", "hr-backups", "weekly",
    ]);

    let params = Params::resolve_interactive(
        &sandbox.raw("hrms.example.com"),
        RunOptions::default(),
        instant_retry(3),
        sandbox.paths(),
        &mut prompt,
        &mut FakeRunner::default(),
    )
    .unwrap();

    let backup = params.backup.unwrap();
    assert_eq!(backup.bucket, "hr-backups");
    assert_eq!(backup.frequency, BackupFrequency::Weekly);
    assert_eq!(
        backup.provider,
        BackupProvider::S3 {
            vendor: S3Vendor::Wasabi,
            access_key_id: "AKIA".into(),
            secret_access_key: "shh".into(),
            location: "ap-northeast-1".into(),
        }
    );
}

#[test]
fn interactive_eof_aborts() {
    let sandbox = Sandbox::new();
    let mut prompt = Scripted::new(&["hrms.example.com"]);

    let err = Params::resolve_interactive(
        &sandbox.raw("hrms.example.com"),
        RunOptions::default(),
        instant_retry(3),
        sandbox.paths(),
        &mut prompt,
        &mut FakeRunner::default(),
    )
    .unwrap_err();

    assert!(matches!(err, InstallError::Aborted));
}

#[test]
fn cache_round_trip_is_private() {
    let sandbox = Sandbox::new();
    let params = Params::resolve(
        &full_flags(&sandbox),
        unattended(),
        instant_retry(3),
        sandbox.paths(),
    )
    .unwrap();
    let cache = ParamCache::new(sandbox.paths().cache);

    cache.save(&params).unwrap();
    let loaded = cache.load();

    let mode = fs::metadata(&cache.path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
    assert_eq!(loaded, params.to_raw());

    let again = Params::resolve(&loaded, unattended(), instant_retry(3), sandbox.paths()).unwrap();
    assert_eq!(again, params);
}

#[test]
fn flags_override_cache() {
    let sandbox = Sandbox::new();
    let cache = ParamCache::new(sandbox.paths().cache);
    let cached = Params::resolve(
        &full_flags(&sandbox),
        unattended(),
        instant_retry(3),
        sandbox.paths(),
    )
    .unwrap();
    cache.save(&cached).unwrap();

    let flags = RawParams {
        domain: Some("new.example.com".into()),
        ..RawParams::default()
    };
    let params = Params::resolve(
        &flags.overlay(cache.load()),
        unattended(),
        instant_retry(3),
        sandbox.paths(),
    )
    .unwrap();

    assert_eq!(params.domain, "new.example.com");
    assert_eq!(params.admin.username, "hradmin");
}

#[test]
fn missing_and_malformed_cache_are_empty() {
    let sandbox = Sandbox::new();
    let cache = ParamCache::new(sandbox.root().join("absent.json"));
    assert_eq!(cache.load(), RawParams::default());

    let path = sandbox.root().join("broken.json");
    fs::write(&path, "{ not json").unwrap();
    assert_eq!(ParamCache::new(path).load(), RawParams::default());
}
