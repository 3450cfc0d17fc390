//! Builds the ordered, deduplicated credential list tried against a single
//! fingerprinted host: vendor defaults, then generic defaults, then
//! caller-supplied custom credentials.

use camguard_core::{Credential, Vendor};
use std::collections::HashSet;

/// Vendor-specific factory default pairs, highest hit rate first.
fn vendor_defaults(vendor: Vendor) -> Vec<Credential> {
    match vendor {
        Vendor::Hikvision => vec![Credential::new("admin", "12345"), Credential::new("admin", "")],
        Vendor::Dahua | Vendor::Amcrest => vec![
            Credential::new("admin", "admin"),
            Credential::new("admin", ""),
        ],
        Vendor::Axis => vec![Credential::new("root", "pass"), Credential::new("root", "root")],
        Vendor::Reolink => vec![Credential::new("admin", "")],
        Vendor::Foscam => vec![Credential::new("admin", ""), Credential::new("admin", "foscam")],
        Vendor::TpLink => vec![Credential::new("admin", "admin")],
        Vendor::Uniview => vec![Credential::new("admin", "123456")],
        Vendor::Vivotek => vec![Credential::new("root", "")],
        Vendor::Hanwha => vec![Credential::new("admin", "4321")],
        Vendor::Bosch => vec![Credential::new("service", "service")],
        Vendor::Unknown => Vec::new(),
    }
}

/// Vendor-agnostic defaults common across the camera industry.
fn generic_defaults() -> Vec<Credential> {
    vec![
        Credential::new("admin", "admin"),
        Credential::new("admin", "password"),
        Credential::new("admin", "12345"),
        Credential::new("admin", "123456"),
        Credential::new("admin", ""),
        Credential::new("root", "root"),
        Credential::new("root", ""),
        Credential::new("user", "user"),
    ]
}

/// `vendor` + `generic`, gated together by `defaults_enabled`, then `custom`,
/// deduplicated by `username:password`. `defaults_enabled=false` is the
/// documented way to run a custom-credentials-only assessment, so it must
/// silence both default tiers, not just the generic one.
pub fn build_credential_list(
    vendor: Vendor,
    defaults_enabled: bool,
    custom: &[Credential],
) -> Vec<Credential> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();

    let mut push = |cred: Credential, seen: &mut HashSet<String>, ordered: &mut Vec<Credential>| {
        if seen.insert(cred.dedup_key()) {
            ordered.push(cred);
        }
    };

    if defaults_enabled {
        for cred in vendor_defaults(vendor) {
            push(cred, &mut seen, &mut ordered);
        }
        for cred in generic_defaults() {
            push(cred, &mut seen, &mut ordered);
        }
    }
    for cred in custom {
        push(cred.clone(), &mut seen, &mut ordered);
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_defaults_come_before_generic() {
        let list = build_credential_list(Vendor::Hikvision, true, &[]);
        assert_eq!(list[0], Credential::new("admin", "12345"));
    }

    #[test]
    fn duplicates_across_tiers_are_removed() {
        let custom = vec![Credential::new("admin", "admin")];
        let list = build_credential_list(Vendor::Dahua, true, &custom);
        let count = list.iter().filter(|c| **c == Credential::new("admin", "admin")).count();
        assert_eq!(count, 1);
    }

    #[test]
    fn unknown_vendor_has_no_vendor_specific_tier() {
        let with_generic = build_credential_list(Vendor::Unknown, true, &[]);
        let generic_only = generic_defaults();
        assert_eq!(with_generic.len(), generic_only.len());
    }

    #[test]
    fn custom_credentials_appended_last() {
        let custom = vec![Credential::new("svc", "p@ss")];
        let list = build_credential_list(Vendor::Unknown, false, &custom);
        assert_eq!(list.last(), Some(&Credential::new("svc", "p@ss")));
    }

    #[test]
    fn disabling_defaults_silences_vendor_tier_too() {
        let list = build_credential_list(Vendor::Hikvision, false, &[]);
        assert!(list.is_empty());
    }
}
