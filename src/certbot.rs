use std::time::Duration;

use tracing::info;

use crate::cmd::{CommandSpec, Runner, run_checked};
use crate::cron;
use crate::error::InstallResult;
use crate::validate;

pub const RENEWAL_MARKER: &str = "certbot renew";

pub const RENEWAL_LINE: &str =
    "0 3 * * * certbot renew --quiet --deploy-hook \"systemctl reload nginx\"";

const ISSUE_TIMEOUT: Duration = Duration::from_secs(300);

/// Why certificate issuance is not attempted, if it isn't.
#[must_use]
pub fn skip_reason(domain: &str, force_no_ssl: bool) -> Option<String> {
    if force_no_ssl {
        return Some("--force-no-ssl is set".to_string());
    }
    if validate::is_test_domain(domain) {
        return Some(format!(
            "{domain} is a test domain; Let's Encrypt cannot issue for it"
        ));
    }
    None
}

/// `certbot --nginx` for `domain`, rewriting the site to redirect
/// HTTP to HTTPS.
#[must_use]
pub fn issue_command(domain: &str, email: &str) -> CommandSpec {
    CommandSpec::new("certbot")
        .args(["--nginx", "-d", domain, "--non-interactive", "--agree-tos"])
        .args(["-m", email, "--redirect"])
        .timeout(ISSUE_TIMEOUT)
}

/// Issue the certificate and schedule its renewal.
pub fn issue(runner: &mut dyn Runner, domain: &str, email: &str) -> InstallResult<()> {
    info!("Requesting certificate for {domain}");
    run_checked(runner, &issue_command(domain, email))?;
    cron::install(runner, RENEWAL_MARKER, RENEWAL_LINE)?;
    info!("Certificate installed for {domain}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_test_domains_and_forced() {
        assert!(skip_reason("horilla.127.0.0.1.nip.io", false).is_some());
        assert!(skip_reason("hrms.example.com", true).is_some());
        assert!(skip_reason("hrms.example.com", false).is_none());
    }

    #[test]
    fn issue_command_redirects() {
        let spec = issue_command("hrms.example.com", "ops@example.com");

        assert_eq!(
            spec.display(),
            "certbot --nginx -d hrms.example.com --non-interactive --agree-tos -m ops@example.com --redirect"
        );
    }
}
