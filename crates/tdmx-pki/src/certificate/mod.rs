//! Parsed, immutable certificate handle.

mod classify;

pub use classify::{CertificateRole, ShapeViolation, DOMAIN_CA_MARKER};
pub(crate) use classify::in_zone;

use chrono::{DateTime, TimeZone, Utc};
use std::fmt;
use std::ops::BitOr;
use std::sync::OnceLock;
use tracing::debug;
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::{GeneralName, GeneralSubtree, ParsedExtension};

use crate::error::{PkiError, Result};
use crate::hash::sha256_bytes;
use crate::name::DistinguishedName;
use crate::oids;
use crate::zone_info::ZoneInfo;

/// Basic constraints extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicConstraints {
    pub ca: bool,
    pub path_len: Option<u32>,
    pub critical: bool,
}

/// Key usage bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyUsageSet(u16);

impl KeyUsageSet {
    pub const DIGITAL_SIGNATURE: Self = Self(1);
    pub const NON_REPUDIATION: Self = Self(1 << 1);
    pub const KEY_ENCIPHERMENT: Self = Self(1 << 2);
    pub const DATA_ENCIPHERMENT: Self = Self(1 << 3);
    pub const KEY_AGREEMENT: Self = Self(1 << 4);
    pub const KEY_CERT_SIGN: Self = Self(1 << 5);
    pub const CRL_SIGN: Self = Self(1 << 6);

    const NAMES: [(Self, &'static str); 7] = [
        (Self::DIGITAL_SIGNATURE, "digitalSignature"),
        (Self::NON_REPUDIATION, "nonRepudiation"),
        (Self::KEY_ENCIPHERMENT, "keyEncipherment"),
        (Self::DATA_ENCIPHERMENT, "dataEncipherment"),
        (Self::KEY_AGREEMENT, "keyAgreement"),
        (Self::KEY_CERT_SIGN, "keyCertSign"),
        (Self::CRL_SIGN, "cRLSign"),
    ];

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect()
    }

    fn from_x509(ku: &x509_parser::extensions::KeyUsage) -> Self {
        let flags = [
            (ku.digital_signature(), Self::DIGITAL_SIGNATURE),
            (ku.non_repudiation(), Self::NON_REPUDIATION),
            (ku.key_encipherment(), Self::KEY_ENCIPHERMENT),
            (ku.data_encipherment(), Self::DATA_ENCIPHERMENT),
            (ku.key_agreement(), Self::KEY_AGREEMENT),
            (ku.key_cert_sign(), Self::KEY_CERT_SIGN),
            (ku.crl_sign(), Self::CRL_SIGN),
        ];
        flags
            .into_iter()
            .filter(|(set, _)| *set)
            .fold(Self::default(), |acc, (_, bit)| acc | bit)
    }
}

impl BitOr for KeyUsageSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Key usage extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage {
    pub usages: KeyUsageSet,
    pub critical: bool,
}

/// One subtree of a name constraints extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subtree {
    Directory(DistinguishedName),
    /// Any other general name form, rendered for display.
    Other(String),
}

/// Name constraints extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameConstraints {
    pub permitted: Vec<Subtree>,
    pub excluded: Vec<Subtree>,
    pub critical: bool,
}

impl NameConstraints {
    /// Directory name bases of the permitted subtrees.
    pub fn permitted_directories(&self) -> impl Iterator<Item = &DistinguishedName> {
        directories(&self.permitted)
    }

    pub fn excluded_directories(&self) -> impl Iterator<Item = &DistinguishedName> {
        directories(&self.excluded)
    }
}

fn directories(subtrees: &[Subtree]) -> impl Iterator<Item = &DistinguishedName> {
    subtrees.iter().filter_map(|s| match s {
        Subtree::Directory(dn) => Some(dn),
        Subtree::Other(_) => None,
    })
}

/// Outcome of reading the zone info extension.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ZoneInfoState {
    Absent,
    Present(ZoneInfo),
    Malformed(String),
}

/// Immutable view of one X.509 certificate.
///
/// Everything is extracted once at construction; the raw DER is kept for
/// signature verification and serialization. Two handles are equal iff their
/// DER encodings are byte-identical.
#[derive(Clone)]
pub struct CertificateHandle {
    der: Vec<u8>,
    fingerprint: String,
    serial: Vec<u8>,
    subject: DistinguishedName,
    issuer: DistinguishedName,
    raw_subject: Vec<u8>,
    raw_issuer: Vec<u8>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    signature_algorithm: String,
    signature: Vec<u8>,
    public_key: Vec<u8>,
    basic_constraints: Option<BasicConstraints>,
    key_usage: Option<KeyUsage>,
    name_constraints: Option<NameConstraints>,
    zone_info: ZoneInfoState,
    critical_extensions: Vec<String>,
    role: OnceLock<CertificateRole>,
}

impl CertificateHandle {
    /// Parse a DER encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (rest, cert) = x509_parser::parse_x509_certificate(der)
            .map_err(|e| PkiError::malformed("certificate", e))?;
        if !rest.is_empty() {
            return Err(PkiError::malformed(
                "certificate",
                format!("{} trailing bytes", rest.len()),
            ));
        }
        Ok(Self::from_parsed(der, &cert))
    }

    fn from_parsed(der: &[u8], cert: &X509Certificate<'_>) -> Self {
        let fingerprint = sha256_bytes(cert.tbs_certificate.as_ref());
        let mut basic_constraints = None;
        let mut key_usage = None;
        let mut name_constraints = None;
        let mut zone_info = ZoneInfoState::Absent;
        let mut critical_extensions = Vec::new();

        for ext in cert.extensions() {
            let oid = ext.oid.to_id_string();
            if ext.critical {
                critical_extensions.push(oid.clone());
            }
            if oid == oids::ZONE_INFO_STR {
                zone_info = match ZoneInfo::from_der(ext.value) {
                    Ok(info) => ZoneInfoState::Present(info),
                    Err(e) => {
                        debug!(fingerprint = %fingerprint, error = %e, "malformed zone info extension");
                        ZoneInfoState::Malformed(e.to_string())
                    }
                };
                continue;
            }
            match ext.parsed_extension() {
                ParsedExtension::BasicConstraints(bc) => {
                    basic_constraints = Some(BasicConstraints {
                        ca: bc.ca,
                        path_len: bc.path_len_constraint,
                        critical: ext.critical,
                    });
                }
                ParsedExtension::KeyUsage(ku) => {
                    key_usage = Some(KeyUsage {
                        usages: KeyUsageSet::from_x509(ku),
                        critical: ext.critical,
                    });
                }
                ParsedExtension::NameConstraints(nc) => {
                    name_constraints = Some(NameConstraints {
                        permitted: subtrees(nc.permitted_subtrees.as_deref()),
                        excluded: subtrees(nc.excluded_subtrees.as_deref()),
                        critical: ext.critical,
                    });
                }
                ParsedExtension::ParseError { error } => {
                    debug!(fingerprint = %fingerprint, oid = %oid, error = ?error, "unparsable extension");
                }
                _ => {}
            }
        }

        Self {
            der: der.to_vec(),
            fingerprint,
            serial: cert.raw_serial().to_vec(),
            subject: DistinguishedName::from_x509(cert.subject()),
            issuer: DistinguishedName::from_x509(cert.issuer()),
            raw_subject: cert.subject().as_raw().to_vec(),
            raw_issuer: cert.issuer().as_raw().to_vec(),
            not_before: asn1_to_utc(cert.validity().not_before),
            not_after: asn1_to_utc(cert.validity().not_after),
            signature_algorithm: cert.signature_algorithm.algorithm.to_id_string(),
            signature: cert.signature_value.data.to_vec(),
            public_key: cert.public_key().raw.to_vec(),
            basic_constraints,
            key_usage,
            name_constraints,
            zone_info,
            critical_extensions,
            role: OnceLock::new(),
        }
    }

    /// Re-parse the stored DER for operations that need the borrowed view.
    pub(crate) fn parsed(&self) -> Result<X509Certificate<'_>> {
        x509_parser::parse_x509_certificate(&self.der)
            .map(|(_, cert)| cert)
            .map_err(|e| PkiError::malformed("certificate", e))
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Lowercase hex SHA-256 of the to-be-signed bytes.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn serial_hex(&self) -> String {
        hex::encode(&self.serial)
    }

    pub const fn subject(&self) -> &DistinguishedName {
        &self.subject
    }

    pub const fn issuer(&self) -> &DistinguishedName {
        &self.issuer
    }

    /// DER of the subject name, as encoded in the certificate.
    pub fn raw_subject(&self) -> &[u8] {
        &self.raw_subject
    }

    pub fn raw_issuer(&self) -> &[u8] {
        &self.raw_issuer
    }

    pub const fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub const fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// True if `at` lies within the validity window (inclusive).
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.not_before <= at && at <= self.not_after
    }

    /// Dotted OID of the signature algorithm.
    pub fn signature_algorithm(&self) -> &str {
        &self.signature_algorithm
    }

    pub fn signature_algorithm_name(&self) -> &str {
        oids::signature_algorithm_name(&self.signature_algorithm)
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// DER of the `SubjectPublicKeyInfo`.
    pub fn public_key_info(&self) -> &[u8] {
        &self.public_key
    }

    pub const fn basic_constraints(&self) -> Option<&BasicConstraints> {
        self.basic_constraints.as_ref()
    }

    pub const fn key_usage(&self) -> Option<&KeyUsage> {
        self.key_usage.as_ref()
    }

    pub const fn name_constraints(&self) -> Option<&NameConstraints> {
        self.name_constraints.as_ref()
    }

    /// Dotted OIDs of all extensions marked critical.
    pub fn critical_extensions(&self) -> &[String] {
        &self.critical_extensions
    }

    pub fn is_ca(&self) -> bool {
        self.basic_constraints.is_some_and(|bc| bc.ca)
    }

    pub fn path_length(&self) -> Option<u32> {
        self.basic_constraints.and_then(|bc| bc.path_len)
    }

    /// Subject and issuer names are byte-identical.
    pub fn is_self_signed(&self) -> bool {
        self.raw_subject == self.raw_issuer
    }

    pub fn common_name(&self) -> Option<&str> {
        self.subject.common_name()
    }

    pub fn email(&self) -> Option<&str> {
        self.subject.email()
    }

    pub fn telephone(&self) -> Option<&str> {
        self.subject.telephone()
    }

    pub fn organizational_units(&self) -> Vec<&str> {
        self.subject.organizational_units()
    }

    pub fn country(&self) -> Option<&str> {
        self.subject.country()
    }

    pub fn locality(&self) -> Option<&str> {
        self.subject.locality()
    }

    pub fn organization(&self) -> Option<&str> {
        self.subject.organization()
    }

    /// Zone info, if present and well formed. Never fails.
    pub const fn zone_info(&self) -> Option<&ZoneInfo> {
        match &self.zone_info {
            ZoneInfoState::Present(info) => Some(info),
            _ => None,
        }
    }

    /// Zone info, distinguishing absence (`Ok(None)`) from a malformed extension.
    pub fn zone_info_strict(&self) -> Result<Option<&ZoneInfo>> {
        match &self.zone_info {
            ZoneInfoState::Absent => Ok(None),
            ZoneInfoState::Present(info) => Ok(Some(info)),
            ZoneInfoState::Malformed(reason) => Err(PkiError::malformed("zone info", reason)),
        }
    }

    /// Role derived from certificate content, computed once.
    pub fn role(&self) -> CertificateRole {
        *self.role.get_or_init(|| classify::classify(self))
    }

    pub fn is_zone_admin(&self) -> bool {
        self.check_zone_admin().is_ok()
    }

    pub fn is_domain_admin(&self) -> bool {
        self.check_domain_admin().is_ok()
    }

    pub fn is_user(&self) -> bool {
        self.check_user().is_ok()
    }

    /// Zone administrator shape, naming the first rule that fails.
    pub fn check_zone_admin(&self) -> std::result::Result<(), ShapeViolation> {
        classify::check_zone_admin(self)
    }

    pub fn check_domain_admin(&self) -> std::result::Result<(), ShapeViolation> {
        classify::check_domain_admin(self)
    }

    pub fn check_user(&self) -> std::result::Result<(), ShapeViolation> {
        classify::check_user(self)
    }
}

impl PartialEq for CertificateHandle {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for CertificateHandle {}

impl fmt::Debug for CertificateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateHandle")
            .field("subject", &self.subject.to_string())
            .field("issuer", &self.issuer.to_string())
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for CertificateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.subject, &self.fingerprint[..16.min(self.fingerprint.len())])
    }
}

fn subtrees(list: Option<&[GeneralSubtree<'_>]>) -> Vec<Subtree> {
    list.unwrap_or_default()
        .iter()
        .map(|s| match &s.base {
            GeneralName::DirectoryName(name) => Subtree::Directory(DistinguishedName::from_x509(name)),
            other => Subtree::Other(format!("{other:?}")),
        })
        .collect()
}

/// Convert an ASN.1 `GeneralizedTime` / `UTCTime` to `DateTime<Utc>`.
fn asn1_to_utc(t: x509_parser::time::ASN1Time) -> DateTime<Utc> {
    Utc.timestamp_opt(t.timestamp(), 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_usage_bits() {
        let set = KeyUsageSet::KEY_CERT_SIGN | KeyUsageSet::DIGITAL_SIGNATURE;
        assert!(set.contains(KeyUsageSet::KEY_CERT_SIGN));
        assert!(!set.contains(KeyUsageSet::KEY_CERT_SIGN | KeyUsageSet::CRL_SIGN));
        assert_eq!(set.names(), vec!["digitalSignature", "keyCertSign"]);
    }

    #[test]
    fn garbage_is_malformed() {
        let err = CertificateHandle::from_der(b"not a certificate").unwrap_err();
        assert!(matches!(err, PkiError::Malformed { what: "certificate", .. }));
    }
}
