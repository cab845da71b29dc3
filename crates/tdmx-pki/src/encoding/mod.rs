//! Text and binary encodings of certificates, keys and trust lists.

pub mod certs;
pub mod keys;
pub mod trust_list;

pub use certs::{
    certificate_from_der, certificate_from_pem, certificate_to_der, certificate_to_pem,
    certificates_from_pem, certificates_to_pem,
};
pub use keys::{private_key_from_pem, private_key_to_pem};
pub use trust_list::{decode_trust_list, encode_trust_list, TrustListEntry};
