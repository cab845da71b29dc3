//! Error types for the TDMX trust engine.

use thiserror::Error;

/// Result type alias for trust engine operations.
pub type Result<T> = std::result::Result<T, PkiError>;

/// Broad classes of failure, independent of the concrete variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// PEM/DER/ASN.1 input could not be parsed.
    MalformedInput,
    /// A block expected to hold exactly one certificate held zero or many.
    Cardinality,
    /// Key generation, signing or an algorithm was unavailable.
    CryptoProvider,
    /// The password-protected key container could not be opened or written.
    KeyStore,
    /// A TDMX business rule was violated.
    BusinessRule,
    /// Filesystem access failed.
    Io,
}

/// Errors that can occur while issuing, decoding or storing credentials.
#[derive(Error, Debug)]
pub enum PkiError {
    /// Input could not be decoded.
    #[error("malformed {what}: {reason}")]
    Malformed {
        /// What was being decoded (e.g. "certificate", "PEM block").
        what: &'static str,
        /// Parser diagnostic.
        reason: String,
    },

    /// Expected exactly one certificate.
    #[error("expected exactly one certificate, found {found}")]
    CertificateCount {
        /// Number of certificates actually present.
        found: usize,
    },

    /// Key algorithm or signature algorithm is not supported.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Fresh key pair could not be generated.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// The to-be-signed certificate body could not be signed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// A certificate extension could not be encoded.
    #[error("extension encoding failed: {0}")]
    ExtensionEncoding(String),

    /// Passphrase did not open the container, or the container was altered.
    #[error("key store integrity check failed (wrong passphrase or corrupted container)")]
    KeyStoreIntegrity,

    /// No entry under the requested alias.
    #[error("key store has no {expected} entry under alias {alias:?}")]
    KeyStoreAlias {
        /// Alias that was looked up.
        alias: String,
        /// Kind of entry that was expected.
        expected: &'static str,
    },

    /// Container document is structurally invalid.
    #[error("key store error: {0}")]
    KeyStore(String),

    /// Caller supplied the reserved domain-CA organizational unit.
    #[error("organizational unit {0:?} is reserved for domain CA name constraints")]
    ReservedOrganizationalUnit(String),

    /// Issuer certificate carries no zone info.
    #[error("issuer certificate {fingerprint} carries no zone info")]
    MissingZoneInfo {
        /// Fingerprint of the certificate without zone info.
        fingerprint: String,
    },

    /// Issuing credential has the wrong role for the requested issuance.
    #[error("issuer certificate is {actual}, expected {expected}")]
    IssuerRole {
        /// Role required of the issuer.
        expected: &'static str,
        /// Role the issuer actually has.
        actual: String,
    },

    /// Requested name does not belong to the zone.
    #[error("{name:?} is neither zone root {zone_root:?} nor one of its subdomains")]
    OutsideZone {
        /// Requested domain name.
        name: String,
        /// Zone root of the issuer.
        zone_root: String,
    },

    /// A request is missing a mandatory value.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Credential was constructed without any certificate.
    #[error("credential chain must contain at least one certificate")]
    EmptyChain,

    /// Configuration file could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error at {path}: {source}")]
    Io {
        /// Path being accessed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PkiError {
    /// Build an IO error tagged with the path that failed.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a malformed-input error.
    pub fn malformed(what: &'static str, reason: impl ToString) -> Self {
        Self::Malformed {
            what,
            reason: reason.to_string(),
        }
    }

    /// Classify this error into the broad taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Malformed { .. } | Self::Json(_) | Self::Config(_) => ErrorKind::MalformedInput,
            Self::CertificateCount { .. } => ErrorKind::Cardinality,
            Self::UnsupportedAlgorithm(_)
            | Self::KeyGeneration(_)
            | Self::Signing(_)
            | Self::ExtensionEncoding(_) => ErrorKind::CryptoProvider,
            Self::KeyStoreIntegrity | Self::KeyStoreAlias { .. } | Self::KeyStore(_) => {
                ErrorKind::KeyStore
            }
            Self::ReservedOrganizationalUnit(_)
            | Self::MissingZoneInfo { .. }
            | Self::IssuerRole { .. }
            | Self::OutsideZone { .. }
            | Self::InvalidRequest(_)
            | Self::EmptyChain => ErrorKind::BusinessRule,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Returns true if the caller's input broke a TDMX rule (surface it to the user).
    #[must_use]
    pub const fn is_business_rule(&self) -> bool {
        matches!(self.kind(), ErrorKind::BusinessRule)
    }

    /// Returns true for failures of the environment rather than of the input.
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::CryptoProvider | ErrorKind::KeyStore | ErrorKind::Io
        )
    }
}

impl From<der::Error> for PkiError {
    fn from(e: der::Error) -> Self {
        Self::malformed("DER structure", e)
    }
}
