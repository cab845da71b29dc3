//! Password-protected key container.
//!
//! A JSON document holding private-key entries (key plus chain) and trusted
//! certificate entries under aliases. Each entry is sealed with AES-256-GCM
//! under a key derived from the passphrase with PBKDF2-HMAC-SHA256; the alias
//! and entry kind are bound as associated data. A sealed check value lets a
//! wrong passphrase be detected when the container is opened.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::path::Path;
use tracing::{debug, info};

use crate::certificate::CertificateHandle;
use crate::credential::Credential;
use crate::error::{PkiError, Result};
use crate::keys::PrivateKey;

const FORMAT: &str = "tdmx-keystore";
const FORMAT_VERSION: u32 = 1;
const KDF_NAME: &str = "PBKDF2-HMAC-SHA256";
const CHECK_AAD: &[u8] = b"tdmx-keystore/check";
const SALT_LEN: usize = 16;

/// PBKDF2 iteration count for new containers.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum EntryKind {
    PrivateKey,
    TrustedCertificate,
}

impl EntryKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::PrivateKey => "private key",
            Self::TrustedCertificate => "trusted certificate",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Kdf {
    algorithm: String,
    iterations: u32,
    salt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Sealed {
    nonce: String,
    ciphertext: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SealedEntry {
    kind: EntryKind,
    #[serde(flatten)]
    sealed: Sealed,
}

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    format: String,
    version: u32,
    kdf: Kdf,
    check: Sealed,
    entries: BTreeMap<String, SealedEntry>,
}

/// Cleartext of a private key entry.
#[derive(Serialize, Deserialize)]
struct PrivateKeyPayload {
    pkcs8: String,
    chain: Vec<String>,
}

/// Cleartext of a trusted certificate entry.
#[derive(Serialize, Deserialize)]
struct TrustedPayload {
    certificate: String,
}

/// Opened key container. Entries stay sealed until read.
pub struct KeyStore {
    key: [u8; 32],
    kdf: Kdf,
    check: Sealed,
    entries: BTreeMap<String, SealedEntry>,
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("aliases", &self.entries.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl KeyStore {
    /// New, empty container protected by `passphrase`.
    pub fn create(passphrase: &str) -> Result<Self> {
        Self::create_with_iterations(passphrase, DEFAULT_ITERATIONS)
    }

    pub fn create_with_iterations(passphrase: &str, iterations: u32) -> Result<Self> {
        let mut salt = [0u8; SALT_LEN];
        SystemRandom::new()
            .fill(&mut salt)
            .map_err(|e| PkiError::KeyStore(format!("salt generation failed: {e}")))?;
        let kdf = Kdf {
            algorithm: KDF_NAME.to_string(),
            iterations,
            salt: BASE64.encode(salt),
        };
        let key = derive_key(&kdf, passphrase)?;
        let check = seal(&key, CHECK_AAD, FORMAT.as_bytes())?;
        Ok(Self {
            key,
            kdf,
            check,
            entries: BTreeMap::new(),
        })
    }

    /// Open a container document. A wrong passphrase is an integrity failure.
    pub fn from_json(document: &str, passphrase: &str) -> Result<Self> {
        let doc: Document = serde_json::from_str(document)
            .map_err(|e| PkiError::KeyStore(format!("invalid container document: {e}")))?;
        if doc.format != FORMAT || doc.version != FORMAT_VERSION {
            return Err(PkiError::KeyStore(format!(
                "unsupported container {} v{}",
                doc.format, doc.version
            )));
        }
        if doc.kdf.algorithm != KDF_NAME {
            return Err(PkiError::KeyStore(format!("unsupported KDF {}", doc.kdf.algorithm)));
        }
        let key = derive_key(&doc.kdf, passphrase)?;
        if open(&key, CHECK_AAD, &doc.check)? != FORMAT.as_bytes() {
            return Err(PkiError::KeyStoreIntegrity);
        }
        Ok(Self {
            key,
            kdf: doc.kdf,
            check: doc.check,
            entries: doc.entries,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        let doc = Document {
            format: FORMAT.to_string(),
            version: FORMAT_VERSION,
            kdf: self.kdf.clone(),
            check: self.check.clone(),
            entries: self.entries.clone(),
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    pub fn load(path: &Path, passphrase: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PkiError::io(path.display().to_string(), e))?;
        let store = Self::from_json(&content, passphrase)?;
        debug!(path = %path.display(), entries = store.entries.len(), "opened key store");
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)
            .map_err(|e| PkiError::io(path.display().to_string(), e))?;
        info!(path = %path.display(), entries = self.entries.len(), "saved key store");
        Ok(())
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    /// True if `alias` holds a private key entry.
    pub fn is_key_entry(&self, alias: &str) -> bool {
        self.entries
            .get(alias)
            .is_some_and(|e| e.kind == EntryKind::PrivateKey)
    }

    pub fn remove(&mut self, alias: &str) -> bool {
        self.entries.remove(alias).is_some()
    }

    /// Store a credential (key and full chain), replacing any entry under `alias`.
    pub fn set_credential(&mut self, alias: &str, credential: &Credential) -> Result<()> {
        let payload = PrivateKeyPayload {
            pkcs8: BASE64.encode(credential.private_key().pkcs8_der()),
            chain: credential
                .chain()
                .iter()
                .map(|c| BASE64.encode(c.der()))
                .collect(),
        };
        self.put(alias, EntryKind::PrivateKey, &serde_json::to_vec(&payload)?)
    }

    pub fn credential(&self, alias: &str) -> Result<Credential> {
        let clear = self.take(alias, EntryKind::PrivateKey)?;
        let payload: PrivateKeyPayload = serde_json::from_slice(&clear)?;
        let key = PrivateKey::from_pkcs8_der(&decode_b64(&payload.pkcs8)?)?;
        let chain = payload
            .chain
            .iter()
            .map(|c| CertificateHandle::from_der(&decode_b64(c)?))
            .collect::<Result<Vec<_>>>()?;
        Credential::new(key, chain)
    }

    pub fn set_trusted_certificate(&mut self, alias: &str, cert: &CertificateHandle) -> Result<()> {
        let payload = TrustedPayload {
            certificate: BASE64.encode(cert.der()),
        };
        self.put(alias, EntryKind::TrustedCertificate, &serde_json::to_vec(&payload)?)
    }

    pub fn trusted_certificate(&self, alias: &str) -> Result<CertificateHandle> {
        let clear = self.take(alias, EntryKind::TrustedCertificate)?;
        let payload: TrustedPayload = serde_json::from_slice(&clear)?;
        CertificateHandle::from_der(&decode_b64(&payload.certificate)?)
    }

    fn put(&mut self, alias: &str, kind: EntryKind, clear: &[u8]) -> Result<()> {
        let sealed = seal(&self.key, &entry_aad(alias, kind), clear)?;
        self.entries
            .insert(alias.to_string(), SealedEntry { kind, sealed });
        Ok(())
    }

    fn take(&self, alias: &str, kind: EntryKind) -> Result<Vec<u8>> {
        let entry = self
            .entries
            .get(alias)
            .filter(|e| e.kind == kind)
            .ok_or_else(|| PkiError::KeyStoreAlias {
                alias: alias.to_string(),
                expected: kind.as_str(),
            })?;
        open(&self.key, &entry_aad(alias, kind), &entry.sealed)
    }
}

/// Write `credential` into a new container at `path`.
pub fn store_credential(
    path: &Path,
    alias: &str,
    passphrase: &str,
    credential: &Credential,
) -> Result<()> {
    let mut store = KeyStore::create(passphrase)?;
    store.set_credential(alias, credential)?;
    store.save(path)
}

/// Read the credential under `alias` from the container at `path`.
pub fn load_credential(path: &Path, alias: &str, passphrase: &str) -> Result<Credential> {
    KeyStore::load(path, passphrase)?.credential(alias)
}

fn entry_aad(alias: &str, kind: EntryKind) -> Vec<u8> {
    format!("{FORMAT}/{}/{alias}", kind.as_str()).into_bytes()
}

fn derive_key(kdf: &Kdf, passphrase: &str) -> Result<[u8; 32]> {
    let iterations = NonZeroU32::new(kdf.iterations)
        .ok_or_else(|| PkiError::KeyStore("KDF iteration count must be positive".into()))?;
    let salt = decode_b64(&kdf.salt)?;
    let mut key = [0u8; 32];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        passphrase.as_bytes(),
        &mut key,
    );
    Ok(key)
}

fn cipher(key: &[u8; 32]) -> Result<LessSafeKey> {
    UnboundKey::new(&AES_256_GCM, key)
        .map(LessSafeKey::new)
        .map_err(|e| PkiError::KeyStore(format!("cipher setup failed: {e}")))
}

fn seal(key: &[u8; 32], aad: &[u8], clear: &[u8]) -> Result<Sealed> {
    let mut nonce = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce)
        .map_err(|e| PkiError::KeyStore(format!("nonce generation failed: {e}")))?;
    let mut in_out = clear.to_vec();
    cipher(key)?
        .seal_in_place_append_tag(
            Nonce::assume_unique_for_key(nonce),
            Aad::from(aad),
            &mut in_out,
        )
        .map_err(|e| PkiError::KeyStore(format!("sealing failed: {e}")))?;
    Ok(Sealed {
        nonce: BASE64.encode(nonce),
        ciphertext: BASE64.encode(in_out),
    })
}

fn open(key: &[u8; 32], aad: &[u8], sealed: &Sealed) -> Result<Vec<u8>> {
    let nonce: [u8; NONCE_LEN] = decode_b64(&sealed.nonce)?
        .try_into()
        .map_err(|_| PkiError::KeyStoreIntegrity)?;
    let mut in_out = decode_b64(&sealed.ciphertext)?;
    let clear = cipher(key)?
        .open_in_place(Nonce::assume_unique_for_key(nonce), Aad::from(aad), &mut in_out)
        .map_err(|_| PkiError::KeyStoreIntegrity)?;
    Ok(clear.to_vec())
}

fn decode_b64(text: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(text)
        .map_err(|e| PkiError::KeyStore(format!("invalid base64: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::{
        create_domain_administrator_credential, create_zone_administrator_credential,
        DomainAdministratorRequest, ZoneAdministratorRequest,
    };

    const FAST: u32 = 1_000;

    fn credentials() -> (Credential, Credential) {
        let zac =
            create_zone_administrator_credential(&ZoneAdministratorRequest::new("example.com", "zone"))
                .unwrap();
        let dac =
            create_domain_administrator_credential(&zac, &DomainAdministratorRequest::new("example.com"))
                .unwrap();
        (zac, dac)
    }

    #[test]
    fn credential_round_trip_preserves_chain_order() {
        let (zac, dac) = credentials();
        let mut store = KeyStore::create_with_iterations("s3cret", FAST).unwrap();
        store.set_credential("domain", &dac).unwrap();
        store
            .set_trusted_certificate("anchor", zac.public_certificate())
            .unwrap();

        let json = store.to_json().unwrap();
        let reopened = KeyStore::from_json(&json, "s3cret").unwrap();
        assert_eq!(reopened.aliases().collect::<Vec<_>>(), vec!["anchor", "domain"]);
        assert!(reopened.is_key_entry("domain"));
        assert!(!reopened.is_key_entry("anchor"));

        let back = reopened.credential("domain").unwrap();
        assert_eq!(back, dac);
        assert_eq!(back.chain()[1], *zac.public_certificate());
        assert_eq!(back.private_key().pkcs8_der(), dac.private_key().pkcs8_der());
        assert_eq!(
            reopened.trusted_certificate("anchor").unwrap(),
            *zac.public_certificate()
        );
    }

    #[test]
    fn wrong_passphrase_is_integrity_failure() {
        let store = KeyStore::create_with_iterations("right", FAST).unwrap();
        let json = store.to_json().unwrap();
        let err = KeyStore::from_json(&json, "wrong").unwrap_err();
        assert!(matches!(err, PkiError::KeyStoreIntegrity));
    }

    #[test]
    fn tampered_entry_is_integrity_failure() {
        let (zac, _) = credentials();
        let mut store = KeyStore::create_with_iterations("pw", FAST).unwrap();
        store.set_credential("zone", &zac).unwrap();
        // move the sealed entry under another alias; the AAD no longer matches
        let entry = store.entries.remove("zone").unwrap();
        store.entries.insert("other".into(), entry);
        let err = store.credential("other").unwrap_err();
        assert!(matches!(err, PkiError::KeyStoreIntegrity));
    }

    #[test]
    fn wrong_entry_kind_is_alias_error() {
        let (zac, _) = credentials();
        let mut store = KeyStore::create_with_iterations("pw", FAST).unwrap();
        store
            .set_trusted_certificate("anchor", zac.public_certificate())
            .unwrap();
        let err = store.credential("anchor").unwrap_err();
        assert!(matches!(err, PkiError::KeyStoreAlias { .. }));
        assert!(matches!(
            store.credential("missing").unwrap_err(),
            PkiError::KeyStoreAlias { .. }
        ));
    }

    #[test]
    fn file_round_trip() {
        let (zac, _) = credentials();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zone.tdmx-keystore");
        let mut store = KeyStore::create_with_iterations("pw", FAST).unwrap();
        store.set_credential("zone", &zac).unwrap();
        store.save(&path).unwrap();
        assert_eq!(load_credential(&path, "zone", "pw").unwrap(), zac);
    }

    #[test]
    fn garbage_document_is_keystore_error() {
        let err = KeyStore::from_json("{}", "pw").unwrap_err();
        assert!(matches!(err, PkiError::KeyStore(_)));
    }
}
