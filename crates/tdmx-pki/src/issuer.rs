//! Minting of zone, domain and user credentials.
//!
//! ```text
//! ZAC  self-signed, CA pathLen 1   NC: C,L,O,OU...,tdmx-domain-ca
//!  └─ DAC  CA pathLen 0            NC: C,L,O,OU...,tdmx-domain-ca,<domain>
//!      └─ UC  end entity           subject: DAC base + CN=<local name>
//! ```

use chrono::{DateTime, Datelike, Duration, Utc};
use der::asn1::{BitString, GeneralizedTime, OctetString, UtcTime};
use der::{Decode, Encode};
use ring::rand::{SecureRandom, SystemRandom};
use tracing::info;
use x509_cert::certificate::{Certificate, TbsCertificate, Version};
use x509_cert::ext::pkix::constraints::name::GeneralSubtree;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{
    AuthorityKeyIdentifier, BasicConstraints, KeyUsage, KeyUsages, NameConstraints,
    SubjectKeyIdentifier,
};
use x509_cert::ext::{AsExtension, Extension};
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::{Time, Validity};

use crate::certificate::{CertificateHandle, CertificateRole, DOMAIN_CA_MARKER};
use crate::config::IssuancePolicy;
use crate::credential::Credential;
use crate::error::{PkiError, Result};
use crate::hash::key_identifier;
use crate::keys::{KeyAlgorithm, PrivateKey, PublicKey, SignatureAlgorithm};
use crate::name::{DistinguishedName, NameAttribute};
use crate::oids;
use crate::zone_info::{ZoneInfo, DOMAIN_ADMINISTRATOR_MARKER, USER_MARKER};

/// Request for a zone administrator credential.
#[derive(Debug, Clone)]
pub struct ZoneAdministratorRequest {
    pub zone_root: String,
    /// Message relay service URL stored in the zone info (may be empty).
    pub service_url: String,
    pub common_name: String,
    pub country: Option<String>,
    pub locality: Option<String>,
    pub organization: Option<String>,
    pub organizational_units: Vec<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub key_algorithm: KeyAlgorithm,
    pub signature_algorithm: SignatureAlgorithm,
    pub zone_info_version: u32,
    pub validity_days: u32,
}

impl ZoneAdministratorRequest {
    pub fn new(zone_root: impl Into<String>, common_name: impl Into<String>) -> Self {
        Self::with_policy(zone_root, common_name, &IssuancePolicy::default())
    }

    pub fn with_policy(
        zone_root: impl Into<String>,
        common_name: impl Into<String>,
        policy: &IssuancePolicy,
    ) -> Self {
        Self {
            zone_root: zone_root.into(),
            service_url: String::new(),
            common_name: common_name.into(),
            country: None,
            locality: None,
            organization: None,
            organizational_units: Vec::new(),
            email: None,
            telephone: None,
            key_algorithm: policy.key_algorithm,
            signature_algorithm: policy.signature_algorithm,
            zone_info_version: policy.zone_info_version,
            validity_days: policy.zone_validity_days,
        }
    }
}

/// Request for a domain administrator credential.
#[derive(Debug, Clone)]
pub struct DomainAdministratorRequest {
    pub domain_name: String,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub key_algorithm: KeyAlgorithm,
    /// Algorithm the zone administrator key signs with.
    pub signature_algorithm: SignatureAlgorithm,
    pub validity_days: u32,
}

impl DomainAdministratorRequest {
    pub fn new(domain_name: impl Into<String>) -> Self {
        Self::with_policy(domain_name, &IssuancePolicy::default())
    }

    pub fn with_policy(domain_name: impl Into<String>, policy: &IssuancePolicy) -> Self {
        Self {
            domain_name: domain_name.into(),
            email: None,
            telephone: None,
            key_algorithm: policy.key_algorithm,
            signature_algorithm: policy.signature_algorithm,
            validity_days: policy.domain_validity_days,
        }
    }
}

/// Request for a user credential.
#[derive(Debug, Clone)]
pub struct UserRequest {
    /// Local part of the user's address, becomes the CN.
    pub local_name: String,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub key_algorithm: KeyAlgorithm,
    /// Algorithm the domain administrator key signs with.
    pub signature_algorithm: SignatureAlgorithm,
    pub validity_days: u32,
}

impl UserRequest {
    pub fn new(local_name: impl Into<String>) -> Self {
        Self::with_policy(local_name, &IssuancePolicy::default())
    }

    pub fn with_policy(local_name: impl Into<String>, policy: &IssuancePolicy) -> Self {
        Self {
            local_name: local_name.into(),
            email: None,
            telephone: None,
            key_algorithm: policy.key_algorithm,
            signature_algorithm: policy.signature_algorithm,
            validity_days: policy.user_validity_days,
        }
    }
}

/// Everything that differs between the three certificate profiles.
struct Profile<'a> {
    subject: DistinguishedName,
    issuer_name: Name,
    subject_key: &'a PublicKey,
    signer: &'a PrivateKey,
    signature_algorithm: SignatureAlgorithm,
    /// `Some(pathLen)` for CAs, `None` for end entities.
    ca_path_len: Option<u8>,
    key_usage: KeyUsage,
    /// Permitted directory subtree, CAs only.
    name_constraint: Option<DistinguishedName>,
    zone_info: Option<ZoneInfo>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

/// Mint a self-signed zone administrator credential (CA, pathLen 1).
pub fn create_zone_administrator_credential(request: &ZoneAdministratorRequest) -> Result<Credential> {
    let zone_root = normalize_domain(&request.zone_root);
    if zone_root.is_empty() {
        return Err(PkiError::InvalidRequest("zone root must not be empty".into()));
    }
    if request.common_name.trim().is_empty() {
        return Err(PkiError::InvalidRequest("common name must not be empty".into()));
    }
    if let Some(ou) = request
        .organizational_units
        .iter()
        .find(|ou| ou.trim().eq_ignore_ascii_case(DOMAIN_CA_MARKER))
    {
        return Err(PkiError::ReservedOrganizationalUnit(ou.clone()));
    }

    let mut base = DistinguishedName::new()
        .with_opt(NameAttribute::Country, request.country.as_deref())
        .with_opt(NameAttribute::Locality, request.locality.as_deref())
        .with_opt(NameAttribute::Organization, request.organization.as_deref());
    for ou in &request.organizational_units {
        base.push(NameAttribute::OrganizationalUnit, ou);
    }
    let subject = leaf_name(
        base.clone(),
        request.email.as_deref(),
        request.telephone.as_deref(),
        &request.common_name,
    );
    let name_constraint = base.with(NameAttribute::OrganizationalUnit, DOMAIN_CA_MARKER);

    let key = PrivateKey::generate(request.key_algorithm)?;
    let not_before = now();
    let not_after = expiry(not_before, request.validity_days)?;
    let certificate = build_certificate(&Profile {
        issuer_name: subject.to_x509_name()?,
        subject,
        subject_key: key.public_key(),
        signer: &key,
        signature_algorithm: request.signature_algorithm,
        ca_path_len: Some(1),
        key_usage: KeyUsage(KeyUsages::KeyCertSign | KeyUsages::DigitalSignature),
        name_constraint: Some(name_constraint),
        zone_info: Some(ZoneInfo::new(
            request.zone_info_version,
            zone_root.clone(),
            request.service_url.trim(),
        )),
        not_before,
        not_after,
    })?;

    info!(
        zone_root = %zone_root,
        fingerprint = %certificate.fingerprint(),
        "issued zone administrator certificate"
    );
    Credential::new(key, vec![certificate])
}

/// Mint a domain administrator credential signed by a zone administrator.
pub fn create_domain_administrator_credential(
    zone_admin: &Credential,
    request: &DomainAdministratorRequest,
) -> Result<Credential> {
    let issuer = zone_admin.public_certificate();
    let zone = require_issuer(issuer, CertificateRole::ZoneAdmin)?;

    let domain = normalize_domain(&request.domain_name);
    if !crate::certificate::in_zone(&domain, zone.zone_root()) {
        return Err(PkiError::OutsideZone {
            name: request.domain_name.clone(),
            zone_root: zone.zone_root().to_string(),
        });
    }

    // C, L, O, OU..., tdmx-domain-ca, <domain>
    let base = issuer
        .subject()
        .constraint_base()
        .with(NameAttribute::OrganizationalUnit, DOMAIN_CA_MARKER)
        .with(NameAttribute::OrganizationalUnit, &domain);
    let subject = leaf_name(
        base.clone(),
        request.email.as_deref(),
        request.telephone.as_deref(),
        &domain,
    );

    let key = PrivateKey::generate(request.key_algorithm)?;
    let (not_before, not_after) = window(issuer, request.validity_days)?;
    let certificate = build_certificate(&Profile {
        subject,
        issuer_name: Name::from_der(issuer.raw_subject())?,
        subject_key: key.public_key(),
        signer: zone_admin.private_key(),
        signature_algorithm: request.signature_algorithm,
        ca_path_len: Some(0),
        key_usage: KeyUsage(KeyUsages::KeyCertSign | KeyUsages::DigitalSignature),
        name_constraint: Some(base),
        zone_info: Some(zone.for_subordinate(DOMAIN_ADMINISTRATOR_MARKER)),
        not_before,
        not_after,
    })?;

    info!(
        domain = %domain,
        fingerprint = %certificate.fingerprint(),
        issuer = %issuer.fingerprint(),
        "issued domain administrator certificate"
    );
    Credential::new(key, chain_with(certificate, zone_admin))
}

/// Mint a user credential signed by a domain administrator.
pub fn create_user_credential(domain_admin: &Credential, request: &UserRequest) -> Result<Credential> {
    let issuer = domain_admin.public_certificate();
    let zone = require_issuer(issuer, CertificateRole::DomainAdmin)?;

    let local_name = request.local_name.trim();
    if local_name.is_empty() {
        return Err(PkiError::InvalidRequest("user local name must not be empty".into()));
    }

    let subject = leaf_name(
        issuer.subject().constraint_base(),
        request.email.as_deref(),
        request.telephone.as_deref(),
        local_name,
    );

    let key = PrivateKey::generate(request.key_algorithm)?;
    let (not_before, not_after) = window(issuer, request.validity_days)?;
    let certificate = build_certificate(&Profile {
        subject,
        issuer_name: Name::from_der(issuer.raw_subject())?,
        subject_key: key.public_key(),
        signer: domain_admin.private_key(),
        signature_algorithm: request.signature_algorithm,
        ca_path_len: None,
        key_usage: KeyUsage(
            KeyUsages::KeyEncipherment | KeyUsages::DigitalSignature | KeyUsages::NonRepudiation,
        ),
        name_constraint: None,
        zone_info: Some(zone.for_subordinate(USER_MARKER)),
        not_before,
        not_after,
    })?;

    info!(
        user = %local_name,
        fingerprint = %certificate.fingerprint(),
        issuer = %issuer.fingerprint(),
        "issued user certificate"
    );
    Credential::new(key, chain_with(certificate, domain_admin))
}

/// Zone info of an issuing certificate that has the expected role.
fn require_issuer(issuer: &CertificateHandle, expected: CertificateRole) -> Result<&ZoneInfo> {
    let zone = issuer.zone_info().ok_or_else(|| PkiError::MissingZoneInfo {
        fingerprint: issuer.fingerprint().to_string(),
    })?;
    let actual = issuer.role();
    if actual != expected {
        return Err(PkiError::IssuerRole {
            expected: expected.as_str(),
            actual: actual.to_string(),
        });
    }
    Ok(zone)
}

fn leaf_name(
    base: DistinguishedName,
    email: Option<&str>,
    telephone: Option<&str>,
    common_name: &str,
) -> DistinguishedName {
    base.with_opt(NameAttribute::Email, email)
        .with_opt(NameAttribute::Telephone, telephone)
        .with(NameAttribute::CommonName, common_name)
}

fn chain_with(certificate: CertificateHandle, issuer: &Credential) -> Vec<CertificateHandle> {
    std::iter::once(certificate)
        .chain(issuer.chain().iter().cloned())
        .collect()
}

fn normalize_domain(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap_or_else(Utc::now)
}

fn expiry(not_before: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>> {
    Duration::try_days(i64::from(days))
        .and_then(|lifetime| not_before.checked_add_signed(lifetime))
        .ok_or_else(|| PkiError::InvalidRequest(format!("validity of {days} days is out of range")))
}

/// Validity starting now, capped at the issuer's expiry.
fn window(issuer: &CertificateHandle, days: u32) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let not_before = now();
    let not_after = expiry(not_before, days)?.min(issuer.not_after());
    if not_after <= not_before {
        return Err(PkiError::InvalidRequest(format!(
            "issuer certificate {} expired at {}",
            issuer.fingerprint(),
            issuer.not_after()
        )));
    }
    Ok((not_before, not_after))
}

fn build_certificate(profile: &Profile<'_>) -> Result<CertificateHandle> {
    let subject_name = profile.subject.to_x509_name()?;
    let signature_alg = profile.signature_algorithm.algorithm_identifier();

    let mut extensions: Vec<Extension> = Vec::new();
    let basic_constraints = BasicConstraints {
        ca: profile.ca_path_len.is_some(),
        path_len_constraint: profile.ca_path_len,
    };
    push_extension(&mut extensions, &subject_name, &basic_constraints)?;
    push_extension(&mut extensions, &subject_name, &profile.key_usage)?;

    let ski = SubjectKeyIdentifier(key_id(profile.subject_key)?);
    push_extension(&mut extensions, &subject_name, &ski)?;
    let aki = AuthorityKeyIdentifier {
        key_identifier: Some(key_id(profile.signer.public_key())?),
        authority_cert_issuer: None,
        authority_cert_serial_number: None,
    };
    push_extension(&mut extensions, &subject_name, &aki)?;

    if let Some(base) = &profile.name_constraint {
        let constraints = NameConstraints {
            permitted_subtrees: Some(vec![GeneralSubtree {
                base: GeneralName::DirectoryName(base.to_x509_name()?),
                minimum: 0,
                maximum: None,
            }]),
            excluded_subtrees: None,
        };
        push_extension(&mut extensions, &subject_name, &constraints)?;
    }

    if let Some(zone_info) = &profile.zone_info {
        extensions.push(Extension {
            extn_id: oids::ZONE_INFO,
            critical: false,
            extn_value: OctetString::new(zone_info.to_der()?)
                .map_err(|e| PkiError::ExtensionEncoding(e.to_string()))?,
        });
    }

    let tbs_certificate = TbsCertificate {
        version: Version::V3,
        serial_number: random_serial()?,
        signature: signature_alg.clone(),
        issuer: profile.issuer_name.clone(),
        validity: Validity {
            not_before: to_time(profile.not_before)?,
            not_after: to_time(profile.not_after)?,
        },
        subject: subject_name,
        subject_public_key_info: profile.subject_key.to_spki()?,
        issuer_unique_id: None,
        subject_unique_id: None,
        extensions: Some(extensions),
    };

    let tbs_der = tbs_certificate.to_der()?;
    let signature = profile.signer.sign(profile.signature_algorithm, &tbs_der)?;
    let certificate = Certificate {
        tbs_certificate,
        signature_algorithm: signature_alg,
        signature: BitString::from_bytes(&signature)?,
    };
    CertificateHandle::from_der(&certificate.to_der()?)
}

fn push_extension<T: AsExtension>(
    extensions: &mut Vec<Extension>,
    subject: &Name,
    value: &T,
) -> Result<()> {
    let ext = value
        .to_extension(subject, extensions)
        .map_err(|e| PkiError::ExtensionEncoding(e.to_string()))?;
    extensions.push(ext);
    Ok(())
}

fn key_id(key: &PublicKey) -> Result<OctetString> {
    OctetString::new(key_identifier(key.as_bytes()))
        .map_err(|e| PkiError::ExtensionEncoding(e.to_string()))
}

/// 16 random bytes, positive and non-zero.
fn random_serial() -> Result<SerialNumber> {
    let mut bytes = [0u8; 16];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|e| PkiError::KeyGeneration(format!("serial number: {e}")))?;
    bytes[0] &= 0x7F;
    bytes[0] |= 0x01;
    Ok(SerialNumber::new(&bytes)?)
}

/// `UTCTime` through 2049, `GeneralizedTime` after.
fn to_time(at: DateTime<Utc>) -> Result<Time> {
    let since_epoch = std::time::Duration::from_secs(u64::try_from(at.timestamp()).map_err(|_| {
        PkiError::InvalidRequest(format!("validity instant {at} precedes 1970"))
    })?);
    if at.year() < 2050 {
        Ok(Time::UtcTime(UtcTime::from_unix_duration(since_epoch)?))
    } else {
        Ok(Time::GeneralTime(GeneralizedTime::from_unix_duration(since_epoch)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::{KeyUsageSet, ShapeViolation};
    use crate::validation::{validate_path, ChainValidator, PathError, Rejection};
    use crate::zone_info::ZoneInfoSlot;

    fn zone_request() -> ZoneAdministratorRequest {
        let mut request = ZoneAdministratorRequest::new("Example.com", "Zone Admin");
        request.country = Some("CH".into());
        request.organization = Some("Example AG".into());
        request.organizational_units = vec!["Ops".into()];
        request.service_url = "https://mrs.example.com/api".into();
        request
    }

    /// Self-signed CA with the zone administrator layout but explicit zone info and window.
    fn self_signed_ca(
        zone_info: Option<ZoneInfo>,
        not_before: DateTime<Utc>,
        not_after: DateTime<Utc>,
    ) -> Credential {
        let base = DistinguishedName::new().with(NameAttribute::Country, "CH");
        let subject = base.clone().with(NameAttribute::CommonName, "Zone Admin");
        let key = PrivateKey::generate(KeyAlgorithm::EcdsaP256).unwrap();
        let certificate = build_certificate(&Profile {
            issuer_name: subject.to_x509_name().unwrap(),
            subject,
            subject_key: key.public_key(),
            signer: &key,
            signature_algorithm: SignatureAlgorithm::EcdsaSha256,
            ca_path_len: Some(1),
            key_usage: KeyUsage(KeyUsages::KeyCertSign | KeyUsages::DigitalSignature),
            name_constraint: Some(base.with(NameAttribute::OrganizationalUnit, DOMAIN_CA_MARKER)),
            zone_info,
            not_before,
            not_after,
        })
        .unwrap();
        Credential::new(key, vec![certificate]).unwrap()
    }

    #[test]
    fn zone_administrator_profile() {
        let zac = create_zone_administrator_credential(&zone_request()).unwrap();
        let cert = zac.public_certificate();
        assert_eq!(zac.chain().len(), 1);
        assert!(cert.is_self_signed());
        assert_eq!(cert.path_length(), Some(1));
        assert_eq!(cert.role(), CertificateRole::ZoneAdmin);
        assert_eq!(
            cert.subject().to_string(),
            "C=CH, O=Example AG, OU=Ops, CN=Zone Admin"
        );
        let zone = cert.zone_info().unwrap();
        assert_eq!(zone.zone_root(), "example.com");
        assert_eq!(zone.slot(), ZoneInfoSlot::ServiceUrl("https://mrs.example.com/api"));
        let nc = cert.name_constraints().unwrap();
        assert!(nc.critical);
        assert_eq!(
            nc.permitted_directories().next().unwrap().to_string(),
            "C=CH, O=Example AG, OU=Ops, OU=tdmx-domain-ca"
        );
        assert!(cert.critical_extensions().contains(&"2.5.29.30".to_string()));
        assert!(!cert.critical_extensions().contains(&oids::ZONE_INFO_STR.to_string()));
    }

    #[test]
    fn reserved_unit_is_rejected() {
        let mut request = zone_request();
        request.organizational_units.push("TDMX-Domain-CA".into());
        let err = create_zone_administrator_credential(&request).unwrap_err();
        assert!(matches!(err, PkiError::ReservedOrganizationalUnit(_)));
        assert!(err.is_business_rule());
    }

    #[test]
    fn domain_and_user_profiles() {
        let zac = create_zone_administrator_credential(&zone_request()).unwrap();
        let dac = create_domain_administrator_credential(
            &zac,
            &DomainAdministratorRequest::new("Sales.Example.com"),
        )
        .unwrap();
        let dac_cert = dac.public_certificate();
        assert_eq!(dac_cert.role(), CertificateRole::DomainAdmin);
        assert_eq!(dac_cert.common_name(), Some("sales.example.com"));
        assert_eq!(dac_cert.raw_issuer(), zac.public_certificate().raw_subject());
        assert_eq!(dac.issuer_certificate(), Some(zac.public_certificate()));
        assert_eq!(
            dac_cert.zone_info().unwrap().slot(),
            ZoneInfoSlot::DomainAdministrator
        );

        let mut user_request = UserRequest::new("alice");
        user_request.email = Some("alice@sales.example.com".into());
        let uc = create_user_credential(&dac, &user_request).unwrap();
        let uc_cert = uc.public_certificate();
        assert_eq!(uc.chain().len(), 3);
        assert_eq!(uc_cert.role(), CertificateRole::User);
        assert!(!uc_cert.is_ca());
        assert!(uc_cert.name_constraints().is_none());
        assert!(uc_cert.key_usage().unwrap().usages.contains(
            KeyUsageSet::KEY_ENCIPHERMENT | KeyUsageSet::NON_REPUDIATION
        ));
        assert_eq!(
            uc_cert.subject().to_string(),
            "C=CH, O=Example AG, OU=Ops, OU=tdmx-domain-ca, OU=sales.example.com, \
             E=alice@sales.example.com, CN=alice"
        );
        assert!(uc_cert.not_after() <= dac_cert.not_after());
    }

    #[test]
    fn issuer_roles_are_enforced() {
        let zac = create_zone_administrator_credential(&zone_request()).unwrap();
        let err = create_user_credential(&zac, &UserRequest::new("alice")).unwrap_err();
        assert!(matches!(err, PkiError::IssuerRole { .. }));

        let dac = create_domain_administrator_credential(
            &zac,
            &DomainAdministratorRequest::new("example.com"),
        )
        .unwrap();
        let err = create_domain_administrator_credential(
            &dac,
            &DomainAdministratorRequest::new("example.com"),
        )
        .unwrap_err();
        assert!(matches!(err, PkiError::IssuerRole { .. }));
    }

    #[test]
    fn domain_outside_zone_is_rejected() {
        let zac = create_zone_administrator_credential(&zone_request()).unwrap();
        let err = create_domain_administrator_credential(
            &zac,
            &DomainAdministratorRequest::new("example.org"),
        )
        .unwrap_err();
        assert!(matches!(err, PkiError::OutsideZone { .. }));
    }

    #[test]
    fn every_key_algorithm_issues() {
        for algorithm in KeyAlgorithm::ALL {
            let mut request = zone_request();
            request.key_algorithm = algorithm;
            request.signature_algorithm = algorithm.signature_algorithm();
            let zac = create_zone_administrator_credential(&request).unwrap();
            assert!(zac.public_certificate().is_zone_admin(), "{algorithm}");
        }
    }

    #[test]
    fn incompatible_signature_algorithm_fails() {
        let mut request = zone_request();
        request.key_algorithm = KeyAlgorithm::Ed25519;
        request.signature_algorithm = SignatureAlgorithm::EcdsaSha384;
        let err = create_zone_administrator_credential(&request).unwrap_err();
        assert!(matches!(err, PkiError::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn oversized_validity_is_rejected() {
        let mut request = zone_request();
        request.validity_days = u32::MAX;
        let err = create_zone_administrator_credential(&request).unwrap_err();
        assert!(matches!(err, PkiError::InvalidRequest(_)));

        let zac = create_zone_administrator_credential(&zone_request()).unwrap();
        let mut domain_request = DomainAdministratorRequest::new("example.com");
        domain_request.validity_days = u32::MAX;
        let err = create_domain_administrator_credential(&zac, &domain_request).unwrap_err();
        assert!(matches!(err, PkiError::InvalidRequest(_)));
    }

    #[test]
    fn expired_issuer_cannot_issue() {
        let start = now() - Duration::days(30);
        let zac = self_signed_ca(
            Some(ZoneInfo::new(1, "example.com", "")),
            start,
            start + Duration::days(10),
        );
        assert!(zac.public_certificate().is_zone_admin());

        let err = create_domain_administrator_credential(
            &zac,
            &DomainAdministratorRequest::new("example.com"),
        )
        .unwrap_err();
        assert!(matches!(err, PkiError::InvalidRequest(_)));
    }

    #[test]
    fn ca_without_zone_info_is_not_a_zone_administrator() {
        let start = now();
        let ca = self_signed_ca(None, start, start + Duration::days(10));
        let cert = ca.public_certificate();
        assert!(cert.is_ca());
        assert_eq!(cert.path_length(), Some(1));
        assert!(cert.zone_info().is_none());
        assert!(!cert.is_zone_admin());
        assert_eq!(cert.role(), CertificateRole::Unclassified);
        assert_eq!(cert.check_zone_admin(), Err(ShapeViolation::MissingZoneInfo));
        assert_eq!(
            ChainValidator::new().check_zone_administrator_certificate(cert),
            Err(Rejection::Shape {
                expected: CertificateRole::ZoneAdmin,
                violation: ShapeViolation::MissingZoneInfo,
            })
        );
    }

    #[test]
    fn user_from_another_zone_root_is_rejected_despite_valid_signatures() {
        let zac = create_zone_administrator_credential(&zone_request()).unwrap();
        let dac = create_domain_administrator_credential(
            &zac,
            &DomainAdministratorRequest::new("sales.example.com"),
        )
        .unwrap();
        let dac_cert = dac.public_certificate();
        let dac_zone = dac_cert.zone_info().unwrap();

        // Signed by the genuine domain administrator, zone root narrowed to its domain.
        let key = PrivateKey::generate(KeyAlgorithm::EcdsaP256).unwrap();
        let (not_before, not_after) = window(dac_cert, 30).unwrap();
        let uc = build_certificate(&Profile {
            subject: leaf_name(dac_cert.subject().constraint_base(), None, None, "mallory"),
            issuer_name: Name::from_der(dac_cert.raw_subject()).unwrap(),
            subject_key: key.public_key(),
            signer: dac.private_key(),
            signature_algorithm: SignatureAlgorithm::EcdsaSha256,
            ca_path_len: None,
            key_usage: KeyUsage(
                KeyUsages::KeyEncipherment | KeyUsages::DigitalSignature | KeyUsages::NonRepudiation,
            ),
            name_constraint: None,
            zone_info: Some(
                ZoneInfo::new(dac_zone.version(), "sales.example.com", "").for_subordinate(USER_MARKER),
            ),
            not_before,
            not_after,
        })
        .unwrap();

        assert!(uc.is_user());
        let zac_cert = zac.public_certificate();
        validate_path(&[&uc, dac_cert], zac_cert, now()).unwrap();
        assert!(matches!(
            ChainValidator::new().check_user_certificate(zac_cert, dac_cert, &uc),
            Err(Rejection::ZoneMismatch {
                role: CertificateRole::User,
                ..
            })
        ));
        assert!(!ChainValidator::new().is_valid_user_certificate(zac_cert, dac_cert, &uc));
    }

    #[test]
    fn anchor_constraints_bind_the_path() {
        let zac = create_zone_administrator_credential(&zone_request()).unwrap();
        let zac_cert = zac.public_certificate();
        let dac = create_domain_administrator_credential(
            &zac,
            &DomainAdministratorRequest::new("example.com"),
        )
        .unwrap();
        let dac_cert = dac.public_certificate();
        let (not_before, not_after) = window(dac_cert, 30).unwrap();
        let ca_usage = || KeyUsage(KeyUsages::KeyCertSign | KeyUsages::DigitalSignature);

        // Signed by the zone key, named outside the zone's permitted subtree.
        let rogue_key = PrivateKey::generate(KeyAlgorithm::EcdsaP256).unwrap();
        let rogue = build_certificate(&Profile {
            subject: DistinguishedName::new()
                .with(NameAttribute::Country, "CH")
                .with(NameAttribute::CommonName, "example.com"),
            issuer_name: Name::from_der(zac_cert.raw_subject()).unwrap(),
            subject_key: rogue_key.public_key(),
            signer: zac.private_key(),
            signature_algorithm: SignatureAlgorithm::EcdsaSha256,
            ca_path_len: Some(0),
            key_usage: ca_usage(),
            name_constraint: None,
            zone_info: None,
            not_before,
            not_after,
        })
        .unwrap();
        assert!(matches!(
            validate_path(&[&rogue], zac_cert, now()),
            Err(PathError::NameConstraints { index: 0, .. })
        ));

        // A second CA level below the domain administrator.
        let base = dac_cert.subject().constraint_base();
        let sub_key = PrivateKey::generate(KeyAlgorithm::EcdsaP256).unwrap();
        let sub = build_certificate(&Profile {
            subject: leaf_name(base.clone(), None, None, "sub"),
            issuer_name: Name::from_der(dac_cert.raw_subject()).unwrap(),
            subject_key: sub_key.public_key(),
            signer: dac.private_key(),
            signature_algorithm: SignatureAlgorithm::EcdsaSha256,
            ca_path_len: Some(0),
            key_usage: ca_usage(),
            name_constraint: None,
            zone_info: None,
            not_before,
            not_after,
        })
        .unwrap();
        let leaf_key = PrivateKey::generate(KeyAlgorithm::EcdsaP256).unwrap();
        let leaf = build_certificate(&Profile {
            subject: leaf_name(base, None, None, "bob"),
            issuer_name: Name::from_der(sub.raw_subject()).unwrap(),
            subject_key: leaf_key.public_key(),
            signer: &sub_key,
            signature_algorithm: SignatureAlgorithm::EcdsaSha256,
            ca_path_len: None,
            key_usage: KeyUsage(KeyUsages::DigitalSignature.into()),
            name_constraint: None,
            zone_info: None,
            not_before,
            not_after,
        })
        .unwrap();
        assert_eq!(
            validate_path(&[&leaf, &sub, dac_cert], zac_cert, now()),
            Err(PathError::PathLength { index: 1 })
        );
    }

    #[test]
    fn late_dates_use_generalized_time() {
        let at = DateTime::from_timestamp(2_600_000_000, 0).unwrap();
        assert!(matches!(to_time(at).unwrap(), Time::GeneralTime(_)));
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert!(matches!(to_time(at).unwrap(), Time::UtcTime(_)));
    }
}
