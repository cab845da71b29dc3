//! Zone info certificate extension.
//!
//! Every TDMX certificate carries a small extension binding it to its zone:
//!
//! ```text
//! ZoneInfo ::= SEQUENCE {
//!     version     INTEGER,
//!     zoneRoot    IA5String,
//!     thirdField  IA5String
//! }
//! ```
//!
//! The meaning of `thirdField` depends on the role of the certificate that
//! carries it, see [`ZoneInfoSlot`].

use der::asn1::Ia5String;
use der::{Decode, Encode, Sequence};
use serde::{Deserialize, Serialize};

use crate::error::{PkiError, Result};

/// Third-field marker written into domain administrator certificates.
pub const DOMAIN_ADMINISTRATOR_MARKER: &str = "DomainAdministrator";
/// Third-field marker written into user certificates.
pub const USER_MARKER: &str = "User";

#[derive(Sequence)]
struct ZoneInfoAsn1 {
    version: u32,
    zone_root: Ia5String,
    third_field: Ia5String,
}

/// Decoded zone info extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneInfo {
    version: u32,
    zone_root: String,
    third_field: String,
}

/// Role-dependent interpretation of the zone info third field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneInfoSlot<'a> {
    /// Zone administrator: URL of the zone's message relay service (may be empty).
    ServiceUrl(&'a str),
    /// Domain administrator marker.
    DomainAdministrator,
    /// User marker.
    User,
}

impl ZoneInfo {
    /// Zone info for a zone administrator certificate.
    pub fn new(version: u32, zone_root: impl Into<String>, service_url: impl Into<String>) -> Self {
        Self {
            version,
            zone_root: zone_root.into(),
            third_field: service_url.into(),
        }
    }

    /// Same zone, with the third field replaced by a subordinate role marker.
    #[must_use]
    pub fn for_subordinate(&self, marker: &str) -> Self {
        Self {
            version: self.version,
            zone_root: self.zone_root.clone(),
            third_field: marker.to_string(),
        }
    }

    pub const fn version(&self) -> u32 {
        self.version
    }

    pub fn zone_root(&self) -> &str {
        &self.zone_root
    }

    /// Raw third field, uninterpreted.
    pub fn third_field(&self) -> &str {
        &self.third_field
    }

    /// Interpret the third field.
    pub fn slot(&self) -> ZoneInfoSlot<'_> {
        match self.third_field.as_str() {
            DOMAIN_ADMINISTRATOR_MARKER => ZoneInfoSlot::DomainAdministrator,
            USER_MARKER => ZoneInfoSlot::User,
            url => ZoneInfoSlot::ServiceUrl(url),
        }
    }

    /// True if both describe the same zone (version and zone root).
    pub fn same_zone(&self, other: &Self) -> bool {
        self.version == other.version && self.zone_root == other.zone_root
    }

    /// Encode as the DER value of the extension.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        let ia5 = |s: &str| {
            Ia5String::new(s).map_err(|e| {
                PkiError::ExtensionEncoding(format!("zone info value {s:?} is not IA5: {e}"))
            })
        };
        ZoneInfoAsn1 {
            version: self.version,
            zone_root: ia5(&self.zone_root)?,
            third_field: ia5(&self.third_field)?,
        }
        .to_der()
        .map_err(|e| PkiError::ExtensionEncoding(e.to_string()))
    }

    /// Decode the DER value of the extension.
    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        let raw = ZoneInfoAsn1::from_der(bytes).map_err(|e| PkiError::malformed("zone info", e))?;
        Ok(Self {
            version: raw.version,
            zone_root: raw.zone_root.to_string(),
            third_field: raw.third_field.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn encode_decode_encode_is_stable() {
        let info = ZoneInfo::new(1, "example.com", "https://mrs.example.com/api");
        let der = info.to_der().unwrap();
        let decoded = ZoneInfo::from_der(&der).unwrap();
        assert_eq!(decoded, info);
        assert_eq!(decoded.to_der().unwrap(), der);
    }

    #[test]
    fn der_layout() {
        let der = ZoneInfo::new(1, "a", "").to_der().unwrap();
        // SEQUENCE { INTEGER 1, IA5String "a", IA5String "" }
        assert_eq!(der, vec![0x30, 0x08, 0x02, 0x01, 0x01, 0x16, 0x01, b'a', 0x16, 0x00]);
    }

    #[test]
    fn non_ia5_is_an_encoding_error() {
        let err = ZoneInfo::new(1, "exämple.com", "").to_der().unwrap_err();
        assert!(matches!(err, PkiError::ExtensionEncoding(_)));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = ZoneInfo::from_der(&[0x30, 0x03, 0x02, 0x01]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert!(ZoneInfo::from_der(&[]).is_err());
    }

    #[test]
    fn slot_interpretation() {
        let zone = ZoneInfo::new(2, "example.com", "https://relay.example.com");
        assert_eq!(zone.slot(), ZoneInfoSlot::ServiceUrl("https://relay.example.com"));

        let domain = zone.for_subordinate(DOMAIN_ADMINISTRATOR_MARKER);
        assert_eq!(domain.slot(), ZoneInfoSlot::DomainAdministrator);
        assert!(domain.same_zone(&zone));

        let user = zone.for_subordinate(USER_MARKER);
        assert_eq!(user.slot(), ZoneInfoSlot::User);
        assert!(!user.same_zone(&ZoneInfo::new(3, "example.com", "")));
    }
}
