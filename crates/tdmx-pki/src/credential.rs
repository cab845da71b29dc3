//! A private key with its certificate chain.

use crate::certificate::CertificateHandle;
use crate::encoding;
use crate::error::{PkiError, Result};
use crate::keys::PrivateKey;
use crate::zone_info::ZoneInfo;

/// Private key plus chain, leaf first, each entry followed by its issuer.
///
/// Key/leaf correspondence is not checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    private_key: PrivateKey,
    chain: Vec<CertificateHandle>,
}

impl Credential {
    pub fn new(private_key: PrivateKey, chain: Vec<CertificateHandle>) -> Result<Self> {
        if chain.is_empty() {
            return Err(PkiError::EmptyChain);
        }
        Ok(Self { private_key, chain })
    }

    pub const fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn chain(&self) -> &[CertificateHandle] {
        &self.chain
    }

    /// The credential's own certificate.
    pub fn public_certificate(&self) -> &CertificateHandle {
        &self.chain[0]
    }

    /// The certificate that signed this one, if the chain carries it.
    pub fn issuer_certificate(&self) -> Option<&CertificateHandle> {
        self.chain.get(1)
    }

    pub fn zone_info(&self) -> Option<&ZoneInfo> {
        self.public_certificate().zone_info()
    }

    /// Whole chain as concatenated PEM blocks, leaf first.
    pub fn chain_pem(&self) -> String {
        encoding::certificates_to_pem(&self.chain)
    }

    pub fn private_key_pem(&self) -> String {
        encoding::private_key_to_pem(&self.private_key)
    }
}
