//! Digests via `ring::digest`.

use ring::digest::{digest, SHA1_FOR_LEGACY_USE_ONLY, SHA256};

/// Compute SHA-256 of raw bytes.
///
/// Returns lowercase hex-encoded digest.
#[must_use]
pub fn sha256_bytes(data: &[u8]) -> String {
    hex::encode(digest(&SHA256, data).as_ref())
}

/// RFC 5280 method (1) key identifier: SHA-1 over the subject public key bits.
#[must_use]
pub fn key_identifier(public_key: &[u8]) -> Vec<u8> {
    digest(&SHA1_FOR_LEGACY_USE_ONLY, public_key)
        .as_ref()
        .to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_bytes() {
        let hash = sha256_bytes(b"hello world");
        assert_eq!(
            hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            sha256_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn key_identifier_is_sha1_sized() {
        assert_eq!(key_identifier(b"abc").len(), 20);
    }
}
