//! Certificate PEM and DER encoding.

use pem::{EncodeConfig, LineEnding, Pem};
use tracing::debug;

use crate::certificate::CertificateHandle;
use crate::error::{PkiError, Result};

pub(crate) const CERTIFICATE_TAG: &str = "CERTIFICATE";

pub fn certificate_to_der(cert: &CertificateHandle) -> Vec<u8> {
    cert.der().to_vec()
}

pub fn certificate_from_der(der: &[u8]) -> Result<CertificateHandle> {
    CertificateHandle::from_der(der)
}

pub fn certificate_to_pem(cert: &CertificateHandle) -> String {
    pem::encode_config(&to_block(cert), config())
}

/// Concatenated PEM blocks in the given order.
pub fn certificates_to_pem(chain: &[CertificateHandle]) -> String {
    let blocks: Vec<Pem> = chain.iter().map(to_block).collect();
    pem::encode_many_config(&blocks, config())
}

/// Decode exactly one certificate; zero or several is a cardinality error.
pub fn certificate_from_pem(text: &str) -> Result<CertificateHandle> {
    let mut certs = certificates_from_pem(text)?;
    if certs.len() != 1 {
        return Err(PkiError::CertificateCount { found: certs.len() });
    }
    Ok(certs.remove(0))
}

/// Decode every `CERTIFICATE` block in order. Other block types are skipped.
pub fn certificates_from_pem(text: &str) -> Result<Vec<CertificateHandle>> {
    let blocks = pem::parse_many(text).map_err(|e| PkiError::malformed("PEM", e))?;
    let mut certs = Vec::with_capacity(blocks.len());
    for block in &blocks {
        if block.tag() != CERTIFICATE_TAG {
            debug!(tag = block.tag(), "skipping non-certificate PEM block");
            continue;
        }
        certs.push(CertificateHandle::from_der(block.contents())?);
    }
    Ok(certs)
}

fn to_block(cert: &CertificateHandle) -> Pem {
    Pem::new(CERTIFICATE_TAG, cert.der().to_vec())
}

fn config() -> EncodeConfig {
    EncodeConfig::new().set_line_ending(LineEnding::LF)
}
