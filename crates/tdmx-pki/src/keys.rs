//! Key pairs, signatures and subject public key info, backed by `ring`.

use der::asn1::{Any, BitString};
use der::Encode;
use pkcs8::PrivateKeyInfo;
use ring::rand::SystemRandom;
use ring::signature::{
    EcdsaKeyPair, EcdsaSigningAlgorithm, Ed25519KeyPair, KeyPair, ECDSA_P256_SHA256_ASN1_SIGNING,
    ECDSA_P384_SHA384_ASN1_SIGNING,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::error::{PkiError, Result};
use crate::oids;

/// Key pair algorithms that can be generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyAlgorithm {
    EcdsaP256,
    EcdsaP384,
    Ed25519,
}

impl KeyAlgorithm {
    pub const ALL: [Self; 3] = [Self::EcdsaP256, Self::EcdsaP384, Self::Ed25519];

    /// The one signature algorithm keys of this type can produce.
    pub const fn signature_algorithm(self) -> SignatureAlgorithm {
        match self {
            Self::EcdsaP256 => SignatureAlgorithm::EcdsaSha256,
            Self::EcdsaP384 => SignatureAlgorithm::EcdsaSha384,
            Self::Ed25519 => SignatureAlgorithm::Ed25519,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EcdsaP256 => "ecdsa-p256",
            Self::EcdsaP384 => "ecdsa-p384",
            Self::Ed25519 => "ed25519",
        }
    }

    const fn ecdsa_signing(self) -> Option<&'static EcdsaSigningAlgorithm> {
        match self {
            Self::EcdsaP256 => Some(&ECDSA_P256_SHA256_ASN1_SIGNING),
            Self::EcdsaP384 => Some(&ECDSA_P384_SHA384_ASN1_SIGNING),
            Self::Ed25519 => None,
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyAlgorithm {
    type Err = PkiError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| PkiError::UnsupportedAlgorithm(format!("key algorithm {s:?}")))
    }
}

/// Certificate signature algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureAlgorithm {
    EcdsaSha256,
    EcdsaSha384,
    Ed25519,
}

impl SignatureAlgorithm {
    pub const ALL: [Self; 3] = [Self::EcdsaSha256, Self::EcdsaSha384, Self::Ed25519];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EcdsaSha256 => "ecdsa-sha256",
            Self::EcdsaSha384 => "ecdsa-sha384",
            Self::Ed25519 => "ed25519",
        }
    }

    /// `AlgorithmIdentifier` written into the certificate (parameters absent).
    pub fn algorithm_identifier(self) -> AlgorithmIdentifierOwned {
        let oid = match self {
            Self::EcdsaSha256 => oids::ECDSA_WITH_SHA256,
            Self::EcdsaSha384 => oids::ECDSA_WITH_SHA384,
            Self::Ed25519 => oids::ED25519,
        };
        AlgorithmIdentifierOwned {
            oid,
            parameters: None,
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = PkiError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| PkiError::UnsupportedAlgorithm(format!("signature algorithm {s:?}")))
    }
}

/// Public half of a key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    algorithm: KeyAlgorithm,
    bytes: Vec<u8>,
}

impl PublicKey {
    pub const fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Raw key bytes: uncompressed EC point or the 32-byte Ed25519 key.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        let algorithm = match self.algorithm {
            KeyAlgorithm::EcdsaP256 => AlgorithmIdentifierOwned {
                oid: oids::EC_PUBLIC_KEY,
                parameters: Some(Any::encode_from(&oids::SECP256R1)?),
            },
            KeyAlgorithm::EcdsaP384 => AlgorithmIdentifierOwned {
                oid: oids::EC_PUBLIC_KEY,
                parameters: Some(Any::encode_from(&oids::SECP384R1)?),
            },
            KeyAlgorithm::Ed25519 => AlgorithmIdentifierOwned {
                oid: oids::ED25519,
                parameters: None,
            },
        };
        Ok(SubjectPublicKeyInfoOwned {
            algorithm,
            subject_public_key: BitString::from_bytes(&self.bytes)?,
        })
    }

    /// DER encoded `SubjectPublicKeyInfo`.
    pub fn to_spki_der(&self) -> Result<Vec<u8>> {
        Ok(self.to_spki()?.to_der()?)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("algorithm", &self.algorithm)
            .field("bytes", &hex::encode(&self.bytes))
            .finish()
    }
}

/// Private key held as PKCS#8 DER, with its public half.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
    pkcs8: Vec<u8>,
    public: PublicKey,
}

impl PrivateKey {
    /// Generate a fresh key pair from the system RNG.
    pub fn generate(algorithm: KeyAlgorithm) -> Result<Self> {
        let rng = SystemRandom::new();
        let document = match algorithm.ecdsa_signing() {
            Some(alg) => EcdsaKeyPair::generate_pkcs8(alg, &rng),
            None => Ed25519KeyPair::generate_pkcs8(&rng),
        }
        .map_err(|e| PkiError::KeyGeneration(format!("{algorithm}: {e}")))?;
        Self::load(algorithm, document.as_ref().to_vec())
            .map_err(|e| PkiError::KeyGeneration(e.to_string()))
    }

    /// Load a PKCS#8 `PrivateKeyInfo`, detecting the algorithm.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let info = PrivateKeyInfo::try_from(der)
            .map_err(|e| PkiError::malformed("PKCS#8 private key", e))?;
        let oid = info.algorithm.oid;
        let algorithm = if oid == oids::ED25519 {
            KeyAlgorithm::Ed25519
        } else if oid == oids::EC_PUBLIC_KEY {
            let curve = info
                .algorithm
                .parameters_oid()
                .map_err(|e| PkiError::malformed("EC private key parameters", e))?;
            if curve == oids::SECP256R1 {
                KeyAlgorithm::EcdsaP256
            } else if curve == oids::SECP384R1 {
                KeyAlgorithm::EcdsaP384
            } else {
                return Err(PkiError::UnsupportedAlgorithm(format!("EC curve {curve}")));
            }
        } else {
            return Err(PkiError::UnsupportedAlgorithm(format!("private key algorithm {oid}")));
        };
        Self::load(algorithm, der.to_vec())
    }

    fn load(algorithm: KeyAlgorithm, pkcs8: Vec<u8>) -> Result<Self> {
        let bytes = match algorithm.ecdsa_signing() {
            Some(alg) => EcdsaKeyPair::from_pkcs8(alg, &pkcs8, &SystemRandom::new())
                .map(|kp| kp.public_key().as_ref().to_vec()),
            None => Ed25519KeyPair::from_pkcs8_maybe_unchecked(&pkcs8)
                .map(|kp| kp.public_key().as_ref().to_vec()),
        }
        .map_err(|e| PkiError::malformed("private key", e))?;
        Ok(Self {
            pkcs8,
            public: PublicKey { algorithm, bytes },
        })
    }

    pub const fn algorithm(&self) -> KeyAlgorithm {
        self.public.algorithm
    }

    pub const fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn pkcs8_der(&self) -> &[u8] {
        &self.pkcs8
    }

    /// Sign `message`. The signature algorithm must match the key type.
    pub fn sign(&self, signature: SignatureAlgorithm, message: &[u8]) -> Result<Vec<u8>> {
        if self.algorithm().signature_algorithm() != signature {
            return Err(PkiError::UnsupportedAlgorithm(format!(
                "{signature} cannot be produced with a {} key",
                self.algorithm()
            )));
        }
        let rng = SystemRandom::new();
        match self.algorithm().ecdsa_signing() {
            Some(alg) => {
                let pair = EcdsaKeyPair::from_pkcs8(alg, &self.pkcs8, &rng)
                    .map_err(|e| PkiError::Signing(e.to_string()))?;
                pair.sign(&rng, message)
                    .map(|sig| sig.as_ref().to_vec())
                    .map_err(|e| PkiError::Signing(e.to_string()))
            }
            None => {
                let pair = Ed25519KeyPair::from_pkcs8_maybe_unchecked(&self.pkcs8)
                    .map_err(|e| PkiError::Signing(e.to_string()))?;
                Ok(pair.sign(message).as_ref().to_vec())
            }
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("algorithm", &self.algorithm())
            .field("pkcs8", &"<redacted>")
            .finish()
    }
}
