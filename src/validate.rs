//! Input validators for domains, emails, and storage regions.

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use regex::Regex;

static HOSTNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z0-9][a-zA-Z0-9-]{0,61}[a-zA-Z0-9]$",
    )
    .expect("hostname pattern compiles")
});

static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$").expect("label pattern compiles")
});

static EMAIL_LOCAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+$").expect("email pattern compiles"));

static AWS_REGION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}-[a-z]+-[0-9]+$").expect("region pattern compiles"));

const MAX_DOMAIN_LEN: usize = 253;

/// Wildcard DNS services that resolve `<anything>.<ipv4>.<suffix>`
/// to the embedded address, usable without any DNS setup.
pub const TEST_DOMAIN_SUFFIXES: [&str; 2] = [".nip.io", ".sslip.io"];

pub const DEFAULT_REGION: &str = "us-east-1";

pub const KNOWN_REGIONS: [&str; 21] = [
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "af-south-1",
    "ap-east-1",
    "ap-south-1",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-southeast-1",
    "ap-southeast-2",
    "ca-central-1",
    "eu-central-1",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-south-1",
    "eu-north-1",
    "me-south-1",
    "sa-east-1",
];

const REGION_ALIASES: [(&str, &str); 20] = [
    ("US1", "us-east-1"),
    ("US2", "us-east-2"),
    ("USW1", "us-west-1"),
    ("USW2", "us-west-2"),
    ("EU", "eu-west-1"),
    ("EU1", "eu-west-1"),
    ("EU2", "eu-central-1"),
    ("AP", "ap-southeast-1"),
    ("AP1", "ap-southeast-1"),
    ("TOKYO", "ap-northeast-1"),
    ("JAPAN", "ap-northeast-1"),
    ("FRANKFURT", "eu-central-1"),
    ("IRELAND", "eu-west-1"),
    ("OREGON", "us-west-2"),
    ("VIRGINIA", "us-east-1"),
    ("OHIO", "us-east-2"),
    ("CALIFORNIA", "us-west-1"),
    ("SINGAPORE", "ap-southeast-1"),
    ("MUMBAI", "ap-south-1"),
    ("INDIA", "ap-south-1"),
];

/// Validate a domain name against the hostname grammar.
///
/// Names under a [test-domain suffix](TEST_DOMAIN_SUFFIXES) are only
/// accepted when they embed a valid IPv4 address right before the
/// suffix.
#[must_use]
pub fn validate_domain(domain: &str) -> bool {
    if domain.len() > MAX_DOMAIN_LEN {
        return false;
    }
    if test_suffix(domain).is_some() {
        return embedded_ipv4(domain).is_some();
    }
    HOSTNAME.is_match(domain)
}

/// Whether the domain is a DNS-less test domain such as
/// `horilla.203.0.113.7.nip.io`. Certificates are never requested
/// for these.
#[must_use]
pub fn is_test_domain(domain: &str) -> bool {
    embedded_ipv4(domain).is_some()
}

/// The IPv4 address embedded in a test domain.
#[must_use]
pub fn embedded_ipv4(domain: &str) -> Option<Ipv4Addr> {
    let suffix = test_suffix(domain)?;
    let rest = &domain[..domain.len() - suffix.len()];
    let labels: Vec<&str> = rest.split('.').collect();
    if labels.len() < 4 {
        return None;
    }
    let (prefix, octets) = labels.split_at(labels.len() - 4);
    if !prefix.iter().all(|l| LABEL.is_match(l)) {
        return None;
    }
    octets.join(".").parse().ok()
}

fn test_suffix(domain: &str) -> Option<&'static str> {
    let lower = domain.to_ascii_lowercase();
    TEST_DOMAIN_SUFFIXES
        .iter()
        .copied()
        .find(|s| lower.ends_with(s))
}

/// Validate an email address: a non-empty local part over
/// `[A-Za-z0-9._%+-]`, `@`, and a domain accepted by
/// [`validate_domain`].
#[must_use]
pub fn validate_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    EMAIL_LOCAL.is_match(local) && validate_domain(domain)
}

/// Result of checking a storage region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionCheck {
    /// Already a standard region name.
    Valid(String),
    /// A known alias, corrected to the canonical name.
    Corrected {
        input: String,
        region: &'static str,
    },
    /// Unrecognised; callers fall back to [`DEFAULT_REGION`].
    Unknown { input: String },
}

impl RegionCheck {
    /// The region to use.
    #[must_use]
    pub fn region(&self) -> &str {
        match self {
            Self::Valid(region) => region,
            Self::Corrected { region, .. } => region,
            Self::Unknown { .. } => DEFAULT_REGION,
        }
    }

    /// Whether the input was recognised, possibly after correction.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        !matches!(self, Self::Unknown { .. })
    }
}

/// Check a region, correcting common aliases like `Tokyo` or `EU`.
#[must_use]
pub fn check_region(input: &str) -> RegionCheck {
    let trimmed = input.trim();

    if AWS_REGION.is_match(trimmed) {
        return RegionCheck::Valid(trimmed.to_string());
    }

    let upper = trimmed.to_uppercase();
    if let Some((_, region)) = REGION_ALIASES.iter().find(|(alias, _)| *alias == upper) {
        return RegionCheck::Corrected {
            input: trimmed.to_string(),
            region,
        };
    }

    if let Some(known) = KNOWN_REGIONS
        .iter()
        .find(|r| r.eq_ignore_ascii_case(trimmed))
    {
        return RegionCheck::Valid((*known).to_string());
    }

    RegionCheck::Unknown {
        input: trimmed.to_string(),
    }
}

/// Check a region and log any correction or fallback.
#[must_use]
pub fn resolve_region(input: &str) -> String {
    let check = check_region(input);
    match &check {
        RegionCheck::Valid(_) => {}
        RegionCheck::Corrected { input, region } => {
            tracing::info!("Region '{input}' is not in the standard format, using '{region}' instead");
        }
        RegionCheck::Unknown { input } => {
            tracing::warn!("'{input}' is not a recognized region, using '{DEFAULT_REGION}'");
        }
    }
    check.region().to_string()
}
