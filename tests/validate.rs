use horilla_installer::validate::{
    DEFAULT_REGION, KNOWN_REGIONS, RegionCheck, check_region, embedded_ipv4, is_test_domain,
    resolve_region, validate_domain, validate_email,
};
use proptest::prelude::*;

fn label() -> impl Strategy<Value = String> {
    "[a-z0-9]([a-z0-9-]{0,20}[a-z0-9])?"
}

fn domain() -> impl Strategy<Value = String> {
    (prop::collection::vec(label(), 1..4), "[a-z]{2,6}")
        .prop_map(|(labels, tld)| format!("{}.{tld}", labels.join(".")))
        .prop_filter("wildcard DNS suffix", |d| !d.ends_with("nip.io") && !d.ends_with("sslip.io"))
}

proptest! {
    #[test]
    fn hostname_grammar_is_accepted(domain in domain()) {
        prop_assert!(validate_domain(&domain));
    }

    #[test]
    fn whitespace_is_rejected(domain in domain(), at in 0usize..8) {
        let at = at.min(domain.len());
        let broken = format!("{} {}", &domain[..at], &domain[at..]);
        prop_assert!(!validate_domain(&broken));
    }

    #[test]
    fn email_over_valid_domain(local in "[a-zA-Z0-9._%+-]{1,20}", domain in domain()) {
        let email = format!("{local}@{domain}");
        prop_assert!(validate_email(&email));
    }

    #[test]
    fn nip_io_embeds_its_address(prefix in label(), a: u8, b: u8, c: u8, d: u8) {
        let domain = format!("{prefix}.{a}.{b}.{c}.{d}.nip.io");
        prop_assert!(validate_domain(&domain));
        prop_assert!(is_test_domain(&domain));
        prop_assert_eq!(embedded_ipv4(&domain).map(|ip| ip.octets()), Some([a, b, c, d]));
    }

    #[test]
    fn region_resolution_is_idempotent(input in "[A-Za-z0-9-]{0,16}") {
        let once = resolve_region(&input);
        prop_assert_eq!(resolve_region(&once), once.clone());
        prop_assert!(check_region(&once).is_accepted());
    }
}

#[test]
fn real_domain_is_not_a_test_domain() {
    assert!(validate_domain("hrms.example.com"));
    assert!(!is_test_domain("hrms.example.com"));
}

#[test]
fn nip_io_without_address_is_rejected() {
    assert!(!validate_domain("horilla.nip.io"));
    assert!(!validate_domain("horilla.1.2.3.nip.io"));
    assert!(!validate_domain("horilla.1.2.3.256.nip.io"));
}

#[test]
fn sslip_io_is_a_test_domain() {
    assert!(validate_domain("hr.10.0.0.5.sslip.io"));
    assert!(is_test_domain("hr.10.0.0.5.sslip.io"));
}

#[test]
fn tokyo_is_corrected() {
    assert_eq!(
        check_region("Tokyo"),
        RegionCheck::Corrected {
            input: "Tokyo".into(),
            region: "ap-northeast-1",
        }
    );
    assert_eq!(resolve_region("tokyo"), "ap-northeast-1");
}

#[test]
fn unknown_region_falls_back() {
    let check = check_region("atlantis");

    assert!(!check.is_accepted());
    assert_eq!(check.region(), DEFAULT_REGION);
}

#[test]
fn known_regions_are_valid() {
    for region in KNOWN_REGIONS {
        assert_eq!(check_region(region), RegionCheck::Valid(region.to_string()));
    }
}

#[test]
fn emails() {
    assert!(validate_email("ops@hrms.example.com"));
    assert!(!validate_email("ops@localhost"));
    assert!(!validate_email("ops.example.com"));
}
