//! Platform CA store discovery.
//!
//! Only for callers that also need ordinary TLS trust; zone validation never
//! consults the platform store.

use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

use crate::certificate::CertificateHandle;
use crate::encoding::certs::CERTIFICATE_TAG;
use crate::error::{PkiError, Result};

/// Known root CA store locations across Linux distributions.
pub const CA_STORE_PATHS: &[&str] = &[
    // Arch / Fedora / RHEL bundle
    "/etc/ssl/certs/ca-certificates.crt",
    // Debian / Ubuntu bundle
    "/etc/ssl/certs/ca-bundle.crt",
    // Individual cert directory (Debian/Ubuntu)
    "/etc/ssl/certs",
    // Fedora / RHEL individual certs
    "/etc/pki/tls/certs",
    // SUSE
    "/etc/ssl/ca-bundle.pem",
    // Alpine
    "/etc/ssl/cert.pem",
    // p11-kit trust anchors
    "/etc/ca-certificates/extracted/tls-ca-bundle.pem",
];

/// All parsable certificates in the platform trust stores, deduplicated by fingerprint.
pub fn system_trust_anchors() -> Vec<CertificateHandle> {
    trust_anchors_from(CA_STORE_PATHS.iter().map(Path::new))
}

/// Scan the given bundle files and certificate directories.
pub fn trust_anchors_from<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Vec<CertificateHandle> {
    let mut certs = Vec::new();
    let mut seen = HashSet::new();

    for path in paths {
        let found = if path.is_file() {
            parse_pem_bundle(path)
        } else if path.is_dir() {
            parse_cert_directory(path)
        } else {
            debug!(path = %path.display(), "CA store path not found, skipping");
            continue;
        };
        match found {
            Ok(found) => {
                for cert in found {
                    if seen.insert(cert.fingerprint().to_string()) {
                        certs.push(cert);
                    }
                }
            }
            Err(e) => warn!(path = %path.display(), error = %e, "failed to read CA store"),
        }
    }
    certs
}

/// Parse a PEM bundle, skipping certificates that do not parse.
fn parse_pem_bundle(path: &Path) -> Result<Vec<CertificateHandle>> {
    let path_str = path.display().to_string();
    let content = std::fs::read(path).map_err(|e| PkiError::io(&path_str, e))?;
    let blocks = pem::parse_many(&content).map_err(|e| PkiError::malformed("PEM", e))?;

    let mut certs = Vec::new();
    for block in &blocks {
        if block.tag() != CERTIFICATE_TAG {
            continue;
        }
        match CertificateHandle::from_der(block.contents()) {
            Ok(cert) => certs.push(cert),
            Err(e) => debug!(path = %path_str, error = %e, "skipping cert in bundle"),
        }
    }
    Ok(certs)
}

/// Parse all .pem / .crt / .cer files in a directory.
fn parse_cert_directory(dir: &Path) -> Result<Vec<CertificateHandle>> {
    let entries =
        std::fs::read_dir(dir).map_err(|e| PkiError::io(dir.display().to_string(), e))?;
    let mut certs = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| PkiError::io(dir.display().to_string(), e))?
            .path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !matches!(ext, "pem" | "crt" | "cer") {
            continue;
        }
        match parse_pem_bundle(&path) {
            Ok(found) => certs.extend(found),
            Err(e) => debug!(path = %path.display(), error = %e, "skipping cert file"),
        }
    }
    Ok(certs)
}
