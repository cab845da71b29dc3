//! Path validation against a single trust anchor certificate.
//!
//! The anchor's own basic constraints and name constraints apply to the
//! certificates below it. A path entry byte-identical to the anchor is only
//! checked for signature, validity and critical extensions.

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::certificate::{CertificateHandle, KeyUsageSet};
use crate::name::DistinguishedName;
use crate::oids::RECOGNIZED_CRITICAL_EXTENSIONS;

/// Why a certification path failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("certification path is empty")]
    EmptyPath,
    #[error("certificate {index} was not issued by the certificate above it")]
    IssuerMismatch { index: usize },
    #[error("signature of certificate {index} does not verify: {reason}")]
    Signature { index: usize, reason: String },
    #[error("certificate {index} is not valid at {at} (valid {not_before} to {not_after})")]
    OutsideValidity {
        index: usize,
        at: DateTime<Utc>,
        not_before: DateTime<Utc>,
        not_after: DateTime<Utc>,
    },
    #[error("certificate {index} has unrecognized critical extension {oid}")]
    UnrecognizedCriticalExtension { index: usize, oid: String },
    #[error("issuer of certificate {index} is not a CA")]
    NotCa { index: usize },
    #[error("issuer of certificate {index} may not sign certificates")]
    MissingKeyCertSign { index: usize },
    #[error("certificate {index} exceeds the path length constraint")]
    PathLength { index: usize },
    #[error("subject of certificate {index} ({subject}) violates name constraints")]
    NameConstraints { index: usize, subject: String },
}

/// Position of a path entry; the anchor gets `path.len()`.
type Index = usize;

/// State carried down the path.
struct WorkingState<'a> {
    issuer: &'a CertificateHandle,
    /// Intermediates still allowed below the current issuer.
    remaining: Option<u32>,
    /// `None` means unrestricted.
    permitted: Option<Vec<DistinguishedName>>,
    excluded: Vec<DistinguishedName>,
}

/// Validate `path` (leaf first) up to `anchor` at instant `at`.
pub fn validate_path(
    path: &[&CertificateHandle],
    anchor: &CertificateHandle,
    at: DateTime<Utc>,
) -> Result<(), PathError> {
    if path.is_empty() {
        return Err(PathError::EmptyPath);
    }
    let anchor_index = path.len();
    check_validity(anchor, anchor_index, at)?;

    let mut state = WorkingState {
        issuer: anchor,
        remaining: None,
        permitted: None,
        excluded: Vec::new(),
    };
    absorb_constraints(&mut state, anchor);

    for (index, &cert) in path.iter().enumerate().rev() {
        let is_anchor = cert == anchor;
        let is_leaf = index == 0;

        check_issued_by(cert, &state, index)?;
        check_validity(cert, index, at)?;
        check_critical_extensions(cert, index)?;
        if is_anchor {
            trace!(index, "path entry is the trust anchor");
            state.issuer = cert;
            continue;
        }
        check_issuer_may_sign(&state, index)?;
        check_name_constraints(cert, &state, index)?;

        if !is_leaf {
            match state.remaining {
                Some(0) => return Err(PathError::PathLength { index }),
                Some(n) => state.remaining = Some(n - 1),
                None => {}
            }
            absorb_constraints(&mut state, cert);
        }
        state.issuer = cert;
    }
    Ok(())
}

fn check_issued_by(cert: &CertificateHandle, state: &WorkingState<'_>, index: Index) -> Result<(), PathError> {
    if cert.raw_issuer() != state.issuer.raw_subject() {
        return Err(PathError::IssuerMismatch { index });
    }
    let signature_error = |reason: String| PathError::Signature { index, reason };
    let child = cert.parsed().map_err(|e| signature_error(e.to_string()))?;
    let parent = state.issuer.parsed().map_err(|e| signature_error(e.to_string()))?;
    child
        .verify_signature(Some(parent.public_key()))
        .map_err(|e| signature_error(e.to_string()))
}

fn check_validity(cert: &CertificateHandle, index: Index, at: DateTime<Utc>) -> Result<(), PathError> {
    if cert.is_valid_at(at) {
        Ok(())
    } else {
        Err(PathError::OutsideValidity {
            index,
            at,
            not_before: cert.not_before(),
            not_after: cert.not_after(),
        })
    }
}

fn check_critical_extensions(cert: &CertificateHandle, index: Index) -> Result<(), PathError> {
    match cert
        .critical_extensions()
        .iter()
        .find(|oid| !RECOGNIZED_CRITICAL_EXTENSIONS.contains(&oid.as_str()))
    {
        Some(oid) => Err(PathError::UnrecognizedCriticalExtension {
            index,
            oid: oid.clone(),
        }),
        None => Ok(()),
    }
}

fn check_issuer_may_sign(state: &WorkingState<'_>, index: Index) -> Result<(), PathError> {
    let issuer = state.issuer;
    if !issuer.is_ca() {
        return Err(PathError::NotCa { index });
    }
    if issuer
        .key_usage()
        .is_some_and(|ku| !ku.usages.contains(KeyUsageSet::KEY_CERT_SIGN))
    {
        return Err(PathError::MissingKeyCertSign { index });
    }
    Ok(())
}

fn check_name_constraints(
    cert: &CertificateHandle,
    state: &WorkingState<'_>,
    index: Index,
) -> Result<(), PathError> {
    let subject = cert.subject();
    let permitted = state
        .permitted
        .as_ref()
        .map_or(true, |bases| bases.iter().any(|base| subject.is_within(base)));
    let excluded = state.excluded.iter().any(|base| subject.is_within(base));
    if permitted && !excluded {
        Ok(())
    } else {
        Err(PathError::NameConstraints {
            index,
            subject: subject.to_string(),
        })
    }
}

/// Fold a CA certificate's path length and name constraints into the state.
fn absorb_constraints(state: &mut WorkingState<'_>, cert: &CertificateHandle) {
    if let Some(len) = cert.path_length() {
        state.remaining = Some(state.remaining.map_or(len, |r| r.min(len)));
    }
    let Some(nc) = cert.name_constraints() else {
        return;
    };
    let bases: Vec<DistinguishedName> = nc.permitted_directories().cloned().collect();
    if !bases.is_empty() {
        state.permitted = Some(match state.permitted.take() {
            None => bases,
            Some(current) => intersect(&current, &bases),
        });
    }
    state.excluded.extend(nc.excluded_directories().cloned());
}

/// Intersection of two sets of directory subtrees.
fn intersect(a: &[DistinguishedName], b: &[DistinguishedName]) -> Vec<DistinguishedName> {
    let mut out = Vec::new();
    for x in a {
        for y in b {
            if x.is_within(y) {
                out.push(x.clone());
            } else if y.is_within(x) {
                out.push(y.clone());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::NameAttribute;

    fn dn(ous: &[&str]) -> DistinguishedName {
        ous.iter().fold(
            DistinguishedName::new().with(NameAttribute::Country, "CH"),
            |dn, ou| dn.with(NameAttribute::OrganizationalUnit, ou),
        )
    }

    #[test]
    fn intersection_keeps_narrower_subtree() {
        let wide = dn(&["a"]);
        let narrow = dn(&["a", "b"]);
        let other = dn(&["c"]);
        assert_eq!(intersect(&[wide.clone()], &[narrow.clone()]), vec![narrow.clone()]);
        assert_eq!(intersect(&[narrow.clone()], &[wide]), vec![narrow]);
        assert!(intersect(&[other], &[dn(&["a"])]).is_empty());
    }
}
