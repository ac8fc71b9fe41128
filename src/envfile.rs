use std::fmt::Write;
use std::fs;
use std::path::Path;

use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::app::App;
use crate::params::Params;

const SECRET_KEY_LEN: usize = 50;

/// Render the Django `.env` consumed by the web container.
///
/// `ALLOWED_HOSTS` always carries the public domain alongside the
/// loopback names nginx and health probes use.
#[must_use]
pub fn render(params: &Params, app: &App, secret_key: &str) -> String {
    let domain = &params.domain;
    let db = &params.database;

    let mut out = String::new();
    let _ = writeln!(out, "DEBUG=False");
    let _ = writeln!(out, "SECRET_KEY={secret_key}");
    let _ = writeln!(out, "ALLOWED_HOSTS={domain},localhost,127.0.0.1");
    let _ = writeln!(out, "CSRF_TRUSTED_ORIGINS=https://{domain},http://{domain}");
    let _ = writeln!(out, "TIME_ZONE=UTC");
    out.push('\n');
    let _ = writeln!(out, "DB_INIT_PASSWORD={}", db.password);
    let _ = writeln!(out, "DB_ENGINE=django.db.backends.postgresql");
    let _ = writeln!(out, "DB_NAME={}", db.name);
    let _ = writeln!(out, "DB_USER={}", db.user);
    let _ = writeln!(out, "DB_PASSWORD={}", db.password);
    let _ = writeln!(out, "DB_HOST={}", app.db_service());
    let _ = writeln!(out, "DB_PORT=5432");
    out
}

/// A fresh random Django secret key.
#[must_use]
pub fn generate_secret_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_KEY_LEN)
        .map(char::from)
        .collect()
}

/// The `SECRET_KEY` of an existing `.env`, so re-runs keep sessions
/// valid.
#[must_use]
pub fn existing_secret_key(path: &Path) -> Option<String> {
    let contents = fs::read_to_string(path).ok()?;
    contents
        .lines()
        .find_map(|line| line.strip_prefix("SECRET_KEY="))
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_keys_are_random_alphanumerics() {
        let a = generate_secret_key();
        let b = generate_secret_key();

        assert_eq!(a.len(), SECRET_KEY_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn reads_existing_secret() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "DEBUG=False\nSECRET_KEY=abc123\nDB_PORT=5432\n").unwrap();

        assert_eq!(existing_secret_key(&path).as_deref(), Some("abc123"));
        assert_eq!(existing_secret_key(&dir.path().join("missing")), None);
    }
}
