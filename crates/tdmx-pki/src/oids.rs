//! Object identifiers used by TDMX certificates.

use der::asn1::ObjectIdentifier;

/// Zone info extension (private enterprise arc).
pub const ZONE_INFO: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.50912.1.1");
/// Dotted form of [`ZONE_INFO`], for matching parsed extensions.
pub const ZONE_INFO_STR: &str = "1.3.6.1.4.1.50912.1.1";

// Name attributes
pub const COUNTRY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
pub const LOCALITY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
pub const ORGANIZATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
pub const ORGANIZATIONAL_UNIT: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
pub const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
pub const TELEPHONE_NUMBER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.20");
pub const EMAIL_ADDRESS: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1");

// Certificate extensions the path validator understands
pub const EXT_BASIC_CONSTRAINTS: &str = "2.5.29.19";
pub const EXT_KEY_USAGE: &str = "2.5.29.15";
pub const EXT_NAME_CONSTRAINTS: &str = "2.5.29.30";
pub const EXT_SUBJECT_ALT_NAME: &str = "2.5.29.17";
pub const EXT_EXTENDED_KEY_USAGE: &str = "2.5.29.37";

/// Critical extensions a certificate may carry and still pass path validation.
pub const RECOGNIZED_CRITICAL_EXTENSIONS: &[&str] = &[
    EXT_BASIC_CONSTRAINTS,
    EXT_KEY_USAGE,
    EXT_NAME_CONSTRAINTS,
    EXT_SUBJECT_ALT_NAME,
    EXT_EXTENDED_KEY_USAGE,
];

// Public key and signature algorithms
pub const EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
pub const SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
pub const SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
pub const ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");
pub const ECDSA_WITH_SHA256: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");
pub const ECDSA_WITH_SHA384: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.3");

/// Display labels for distinguished name attributes, keyed by dotted OID.
const NAME_LABELS: &[(&str, &str)] = &[
    ("2.5.4.6", "C"),
    ("2.5.4.7", "L"),
    ("2.5.4.8", "ST"),
    ("2.5.4.10", "O"),
    ("2.5.4.11", "OU"),
    ("2.5.4.3", "CN"),
    ("2.5.4.5", "SERIALNUMBER"),
    ("2.5.4.20", "TelephoneNumber"),
    ("1.2.840.113549.1.9.1", "E"),
    ("0.9.2342.19200300.100.1.25", "DC"),
    ("0.9.2342.19200300.100.1.1", "UID"),
];

/// Short label for a name attribute OID, if it is a well-known one.
#[must_use]
pub fn name_label(oid: &str) -> Option<&'static str> {
    NAME_LABELS
        .iter()
        .find(|(dotted, _)| *dotted == oid)
        .map(|(_, label)| *label)
}

/// Human-readable name of a signature algorithm OID.
#[must_use]
pub fn signature_algorithm_name(oid: &str) -> &str {
    match oid {
        "1.2.840.10045.4.3.2" => "ecdsa-with-SHA256",
        "1.2.840.10045.4.3.3" => "ecdsa-with-SHA384",
        "1.3.101.112" => "Ed25519",
        "1.2.840.113549.1.1.11" => "sha256WithRSAEncryption",
        "1.2.840.113549.1.1.12" => "sha384WithRSAEncryption",
        "1.2.840.113549.1.1.5" => "sha1WithRSAEncryption",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_info_forms_agree() {
        assert_eq!(ZONE_INFO.to_string(), ZONE_INFO_STR);
    }

    #[test]
    fn labels() {
        assert_eq!(name_label("2.5.4.11"), Some("OU"));
        assert_eq!(name_label(&EMAIL_ADDRESS.to_string()), Some("E"));
        assert_eq!(name_label("1.2.3"), None);
        assert_eq!(signature_algorithm_name("1.3.101.112"), "Ed25519");
        assert_eq!(signature_algorithm_name("1.2.3"), "1.2.3");
    }
}
