//! Issuance policy: default algorithms, lifetimes and zone info version.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PkiError, Result};
use crate::keys::{KeyAlgorithm, SignatureAlgorithm};

/// Defaults applied to credential requests that do not set them explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuancePolicy {
    /// Key pair algorithm for new credentials.
    #[serde(default = "default_key_algorithm")]
    pub key_algorithm: KeyAlgorithm,

    /// Signature algorithm; must match the issuer's key type.
    #[serde(default = "default_signature_algorithm")]
    pub signature_algorithm: SignatureAlgorithm,

    /// Version written into new zone info extensions.
    #[serde(default = "default_zone_info_version")]
    pub zone_info_version: u32,

    /// Lifetime of zone administrator certificates (days).
    #[serde(default = "default_zone_validity_days")]
    pub zone_validity_days: u32,

    /// Lifetime of domain administrator certificates (days).
    #[serde(default = "default_domain_validity_days")]
    pub domain_validity_days: u32,

    /// Lifetime of user certificates (days).
    #[serde(default = "default_user_validity_days")]
    pub user_validity_days: u32,
}

impl Default for IssuancePolicy {
    fn default() -> Self {
        Self {
            key_algorithm: default_key_algorithm(),
            signature_algorithm: default_signature_algorithm(),
            zone_info_version: default_zone_info_version(),
            zone_validity_days: default_zone_validity_days(),
            domain_validity_days: default_domain_validity_days(),
            user_validity_days: default_user_validity_days(),
        }
    }
}

impl IssuancePolicy {
    /// Load a policy from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| PkiError::io(path.display().to_string(), e))?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| PkiError::Config(e.to_string()))
    }
}

// Default value functions for serde.
const fn default_key_algorithm() -> KeyAlgorithm {
    KeyAlgorithm::EcdsaP256
}

const fn default_signature_algorithm() -> SignatureAlgorithm {
    SignatureAlgorithm::EcdsaSha256
}

const fn default_zone_info_version() -> u32 {
    1
}

const fn default_zone_validity_days() -> u32 {
    3650
}

const fn default_domain_validity_days() -> u32 {
    730
}

const fn default_user_validity_days() -> u32 {
    365
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_policy() {
        let policy = IssuancePolicy::default();
        assert_eq!(policy.key_algorithm, KeyAlgorithm::EcdsaP256);
        assert_eq!(
            policy.key_algorithm.signature_algorithm(),
            policy.signature_algorithm
        );
        assert_eq!(policy.zone_info_version, 1);
        assert!(policy.zone_validity_days > policy.domain_validity_days);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let policy = IssuancePolicy::from_toml(
            "key_algorithm = \"ed25519\"\nsignature_algorithm = \"ed25519\"\n",
        )
        .unwrap();
        assert_eq!(policy.key_algorithm, KeyAlgorithm::Ed25519);
        assert_eq!(policy.user_validity_days, 365);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let policy = IssuancePolicy::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(policy, IssuancePolicy::default());
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "key_algorithm = \"rsa\"").unwrap();
        let err = IssuancePolicy::load(file.path()).unwrap_err();
        assert!(matches!(err, PkiError::Config(_)));
    }
}
