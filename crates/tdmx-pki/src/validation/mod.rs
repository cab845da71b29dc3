//! Chain-of-trust validation for zone hierarchies.
//!
//! Every check builds its trust anchor set from the one zone administrator
//! certificate passed in. Three layers are applied in order:
//!
//! 1. shape: each certificate classifies as the role its position requires;
//! 2. zone consistency: all zone infos agree on version and zone root;
//! 3. path validation: signatures, validity, basic and name constraints.
//!
//! The `is_valid_*` forms never fail; "not valid" is `false`, with the
//! reason logged at `debug`.

mod path;

pub use path::{validate_path, PathError};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::certificate::{CertificateHandle, CertificateRole, ShapeViolation};

/// Why a certificate set did not validate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("certificate expected to be a {expected}: {violation}")]
    Shape {
        expected: CertificateRole,
        violation: ShapeViolation,
    },
    #[error("{role} certificate belongs to zone {found}, expected {expected}")]
    ZoneMismatch {
        role: CertificateRole,
        expected: String,
        found: String,
    },
    #[error(transparent)]
    Path(#[from] PathError),
}

/// Validates zone, domain and user certificates at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct ChainValidator {
    at: Option<DateTime<Utc>>,
}

impl Default for ChainValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainValidator {
    /// Validator that checks validity windows against the current time.
    pub const fn new() -> Self {
        Self { at: None }
    }

    /// Validator that checks validity windows against `at`.
    pub const fn at(at: DateTime<Utc>) -> Self {
        Self { at: Some(at) }
    }

    fn check_time(&self) -> DateTime<Utc> {
        self.at.unwrap_or_else(Utc::now)
    }

    pub fn is_valid_zone_administrator_certificate(&self, zac: &CertificateHandle) -> bool {
        verdict(zac, self.check_zone_administrator_certificate(zac))
    }

    pub fn is_valid_domain_administrator_certificate(
        &self,
        zac: &CertificateHandle,
        dac: &CertificateHandle,
    ) -> bool {
        verdict(dac, self.check_domain_administrator_certificate(zac, dac))
    }

    pub fn is_valid_user_certificate(
        &self,
        zac: &CertificateHandle,
        dac: &CertificateHandle,
        uc: &CertificateHandle,
    ) -> bool {
        verdict(uc, self.check_user_certificate(zac, dac, uc))
    }

    pub fn check_zone_administrator_certificate(
        &self,
        zac: &CertificateHandle,
    ) -> Result<(), Rejection> {
        shape(zac, CertificateRole::ZoneAdmin)?;
        validate_path(&[zac], zac, self.check_time())?;
        Ok(())
    }

    pub fn check_domain_administrator_certificate(
        &self,
        zac: &CertificateHandle,
        dac: &CertificateHandle,
    ) -> Result<(), Rejection> {
        shape(zac, CertificateRole::ZoneAdmin)?;
        shape(dac, CertificateRole::DomainAdmin)?;
        same_zone(zac, dac, CertificateRole::DomainAdmin)?;
        validate_path(&[dac], zac, self.check_time())?;
        Ok(())
    }

    pub fn check_user_certificate(
        &self,
        zac: &CertificateHandle,
        dac: &CertificateHandle,
        uc: &CertificateHandle,
    ) -> Result<(), Rejection> {
        shape(zac, CertificateRole::ZoneAdmin)?;
        shape(dac, CertificateRole::DomainAdmin)?;
        shape(uc, CertificateRole::User)?;
        same_zone(zac, dac, CertificateRole::DomainAdmin)?;
        same_zone(zac, uc, CertificateRole::User)?;
        validate_path(&[uc, dac], zac, self.check_time())?;
        Ok(())
    }
}

fn verdict(cert: &CertificateHandle, outcome: Result<(), Rejection>) -> bool {
    match outcome {
        Ok(()) => true,
        Err(reason) => {
            debug!(fingerprint = %cert.fingerprint(), reason = %reason, "certificate rejected");
            false
        }
    }
}

fn shape(cert: &CertificateHandle, expected: CertificateRole) -> Result<(), Rejection> {
    let check = match expected {
        CertificateRole::ZoneAdmin => cert.check_zone_admin(),
        CertificateRole::DomainAdmin => cert.check_domain_admin(),
        CertificateRole::User => cert.check_user(),
        CertificateRole::Unclassified => Ok(()),
    };
    check.map_err(|violation| Rejection::Shape {
        expected,
        violation,
    })
}

/// Version and zone root of `cert` equal the zone administrator's.
fn same_zone(
    zac: &CertificateHandle,
    cert: &CertificateHandle,
    role: CertificateRole,
) -> Result<(), Rejection> {
    let describe = |c: &CertificateHandle| {
        c.zone_info()
            .map_or_else(|| "<none>".to_string(), |z| format!("{} v{}", z.zone_root(), z.version()))
    };
    match (zac.zone_info(), cert.zone_info()) {
        (Some(expected), Some(found)) if expected.same_zone(found) => Ok(()),
        _ => Err(Rejection::ZoneMismatch {
            role,
            expected: describe(zac),
            found: describe(cert),
        }),
    }
}
