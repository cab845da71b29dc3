//! # tdmx-pki
//!
//! Certificate authority and chain-of-trust engine for TDMX zones.
//!
//! A zone is administered through a three-tier X.509 hierarchy:
//!
//! - **Zone administrator (ZAC)** -- self-signed CA, path length 1
//! - **Domain administrator (DAC)** -- CA for one domain of the zone, path length 0
//! - **User (UC)** -- end entity within a domain
//!
//! Every certificate carries a zone info extension naming its zone, and every
//! CA carries a critical directory-name constraint that its descendants'
//! subjects must fall under.
//!
//! ## Data Flow
//!
//! ```text
//! Issuance
//!   ZoneAdministratorRequest -> create_zone_administrator_credential()
//!   -> create_domain_administrator_credential() -> create_user_credential()
//!   -> Credential { key, chain }
//!
//! Validation (anchors = { zac })
//!   shape (role predicates) -> zone info agreement -> path validation
//!   -> bool / Rejection
//!
//! Storage
//!   Credential <-> KeyStore (sealed JSON) ; CertificateHandle <-> PEM/DER
//!   trusted zones <-> annotated trust list
//! ```

pub mod certificate;
pub mod config;
pub mod credential;
pub mod encoding;
pub mod error;
pub mod hash;
pub mod issuer;
pub mod keys;
pub mod keystore;
pub mod name;
pub mod oids;
pub mod trust_store;
pub mod validation;
pub mod zone_info;

pub use certificate::{CertificateHandle, CertificateRole, ShapeViolation, DOMAIN_CA_MARKER};
pub use config::IssuancePolicy;
pub use credential::Credential;
pub use error::{ErrorKind, PkiError, Result};
pub use issuer::{
    create_domain_administrator_credential, create_user_credential,
    create_zone_administrator_credential, DomainAdministratorRequest, UserRequest,
    ZoneAdministratorRequest,
};
pub use keys::{KeyAlgorithm, PrivateKey, PublicKey, SignatureAlgorithm};
pub use keystore::KeyStore;
pub use name::{DistinguishedName, NameAttribute};
pub use validation::{ChainValidator, PathError, Rejection};
pub use zone_info::{ZoneInfo, ZoneInfoSlot};
