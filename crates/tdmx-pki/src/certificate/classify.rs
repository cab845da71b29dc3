//! Shape predicates for zone, domain and user certificates.
//!
//! Each check runs its rules in a fixed order and stops at the first one
//! that fails. The predicates look only at certificate content; signatures
//! and validity are the validator's business.

use serde::Serialize;
use std::fmt;

use super::{CertificateHandle, KeyUsageSet, Subtree};
use crate::name::{values_match, DistinguishedName};

/// Organizational unit that ends every domain CA name constraint base.
pub const DOMAIN_CA_MARKER: &str = "tdmx-domain-ca";

/// Role of a certificate within a zone hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CertificateRole {
    ZoneAdmin,
    DomainAdmin,
    User,
    Unclassified,
}

impl CertificateRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ZoneAdmin => "zone administrator",
            Self::DomainAdmin => "domain administrator",
            Self::User => "user",
            Self::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for CertificateRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First shape rule a certificate failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ShapeViolation {
    #[error("basic constraints do not match the role")]
    BasicConstraints,
    #[error("key usage lacks required bits")]
    KeyUsage,
    #[error("subject and issuer should be identical")]
    NotSelfSigned,
    #[error("subject and issuer should differ")]
    SelfSigned,
    #[error("zone info extension is missing")]
    MissingZoneInfo,
    #[error("common name is outside the zone")]
    CommonNameOutsideZone,
    #[error("last organizational unit is outside the zone")]
    UnitOutsideZone,
    #[error("name constraints do not mirror the subject")]
    NameConstraints,
}

type Check = Result<(), ShapeViolation>;

const CA_USAGES: KeyUsageSet = KeyUsageSet(
    KeyUsageSet::KEY_CERT_SIGN.0 | KeyUsageSet::DIGITAL_SIGNATURE.0,
);
const USER_USAGES: KeyUsageSet = KeyUsageSet(
    KeyUsageSet::KEY_ENCIPHERMENT.0
        | KeyUsageSet::DIGITAL_SIGNATURE.0
        | KeyUsageSet::NON_REPUDIATION.0,
);

pub(super) fn classify(cert: &CertificateHandle) -> CertificateRole {
    if check_zone_admin(cert).is_ok() {
        CertificateRole::ZoneAdmin
    } else if check_domain_admin(cert).is_ok() {
        CertificateRole::DomainAdmin
    } else if check_user(cert).is_ok() {
        CertificateRole::User
    } else {
        CertificateRole::Unclassified
    }
}

pub(super) fn check_zone_admin(cert: &CertificateHandle) -> Check {
    require_ca(cert, 1)?;
    require_usages(cert, CA_USAGES)?;
    if !cert.is_self_signed() {
        return Err(ShapeViolation::NotSelfSigned);
    }
    cert.zone_info().ok_or(ShapeViolation::MissingZoneInfo)?;

    let base = single_directory_constraint(cert)?;
    let ous = base.organizational_units();
    if !mirrors_subject(base, cert.subject()) || ous.last() != Some(&DOMAIN_CA_MARKER) {
        return Err(ShapeViolation::NameConstraints);
    }
    Ok(())
}

pub(super) fn check_domain_admin(cert: &CertificateHandle) -> Check {
    require_ca(cert, 0)?;
    require_usages(cert, CA_USAGES)?;
    if cert.is_self_signed() {
        return Err(ShapeViolation::SelfSigned);
    }
    let zone = cert.zone_info().ok_or(ShapeViolation::MissingZoneInfo)?;
    let cn = cert.common_name().unwrap_or_default();
    if !in_zone(cn, zone.zone_root()) {
        return Err(ShapeViolation::CommonNameOutsideZone);
    }

    let base = single_directory_constraint(cert)?;
    let ous = base.organizational_units();
    let marker_ok = ous.len() >= 2 && ous[ous.len() - 2] == DOMAIN_CA_MARKER;
    let domain_ok = ous.last().is_some_and(|last| values_match(last, cn));
    if !mirrors_subject(base, cert.subject()) || !marker_ok || !domain_ok {
        return Err(ShapeViolation::NameConstraints);
    }
    Ok(())
}

pub(super) fn check_user(cert: &CertificateHandle) -> Check {
    if cert.is_ca() {
        return Err(ShapeViolation::BasicConstraints);
    }
    require_usages(cert, USER_USAGES)?;
    if cert.is_self_signed() {
        return Err(ShapeViolation::SelfSigned);
    }
    let zone = cert.zone_info().ok_or(ShapeViolation::MissingZoneInfo)?;
    let ous = cert.organizational_units();
    match ous.last() {
        Some(last) if in_zone(last, zone.zone_root()) => Ok(()),
        _ => Err(ShapeViolation::UnitOutsideZone),
    }
}

fn require_ca(cert: &CertificateHandle, path_len: u32) -> Check {
    match cert.basic_constraints() {
        Some(bc) if bc.ca && bc.critical && bc.path_len == Some(path_len) => Ok(()),
        _ => Err(ShapeViolation::BasicConstraints),
    }
}

fn require_usages(cert: &CertificateHandle, required: KeyUsageSet) -> Check {
    match cert.key_usage() {
        Some(ku) if ku.usages.contains(required) => Ok(()),
        _ => Err(ShapeViolation::KeyUsage),
    }
}

/// The one permitted directory subtree of a critical name constraints extension.
fn single_directory_constraint(cert: &CertificateHandle) -> Result<&DistinguishedName, ShapeViolation> {
    let nc = cert
        .name_constraints()
        .filter(|nc| nc.critical)
        .ok_or(ShapeViolation::NameConstraints)?;
    match nc.permitted.as_slice() {
        [Subtree::Directory(base)] => Ok(base),
        _ => Err(ShapeViolation::NameConstraints),
    }
}

/// C, L and O the subject has must equal the base's; the subject's OUs must
/// lead the base's OUs.
fn mirrors_subject(base: &DistinguishedName, subject: &DistinguishedName) -> bool {
    let same = |s: Option<&str>, b: Option<&str>| s.map_or(true, |s| b.is_some_and(|b| values_match(s, b)));
    let subject_ous = subject.organizational_units();
    let base_ous = base.organizational_units();
    same(subject.country(), base.country())
        && same(subject.locality(), base.locality())
        && same(subject.organization(), base.organization())
        && subject_ous.len() <= base_ous.len()
        && subject_ous
            .iter()
            .zip(&base_ous)
            .all(|(s, b)| values_match(s, b))
}

/// `name` is the zone root or one of its subdomains.
pub(crate) fn in_zone(name: &str, zone_root: &str) -> bool {
    let name = name.trim().to_ascii_lowercase();
    let root = zone_root.trim().to_ascii_lowercase();
    !root.is_empty() && (name == root || name.ends_with(&format!(".{root}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::NameAttribute;

    #[test]
    fn zone_membership() {
        assert!(in_zone("example.com", "example.com"));
        assert!(in_zone("Sales.Example.com", "example.com"));
        assert!(!in_zone("badexample.com", "example.com"));
        assert!(!in_zone("example.org", "example.com"));
        assert!(!in_zone("", ""));
    }

    #[test]
    fn mirroring_uses_only_subject_components() {
        let subject = DistinguishedName::new()
            .with(NameAttribute::Organization, "Example AG")
            .with(NameAttribute::OrganizationalUnit, "Ops")
            .with(NameAttribute::CommonName, "zone admin");
        let base = DistinguishedName::new()
            .with(NameAttribute::Country, "CH")
            .with(NameAttribute::Organization, "example ag")
            .with(NameAttribute::OrganizationalUnit, "Ops")
            .with(NameAttribute::OrganizationalUnit, DOMAIN_CA_MARKER);
        assert!(mirrors_subject(&base, &subject));

        let other_org = base.clone().with(NameAttribute::Organization, "ignored");
        assert!(mirrors_subject(&other_org, &subject));

        let wrong = DistinguishedName::new()
            .with(NameAttribute::Organization, "Other AG")
            .with(NameAttribute::OrganizationalUnit, "Ops");
        assert!(!mirrors_subject(&wrong, &subject));
    }
}
