//! Distinguished names as ordered, typed components.

use der::asn1::{Any, Ia5StringRef, ObjectIdentifier, PrintableStringRef, SetOfVec};
use der::Tag;
use serde::{Deserialize, Serialize};
use std::fmt;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};
use x509_parser::x509::X509Name;

use crate::error::{PkiError, Result};
use crate::oids;

/// Attribute type of one name component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NameAttribute {
    Country,
    Locality,
    Organization,
    OrganizationalUnit,
    CommonName,
    Email,
    Telephone,
    /// Any other attribute, by dotted OID.
    Other(String),
}

impl NameAttribute {
    fn from_oid(dotted: &str) -> Self {
        match dotted {
            "2.5.4.6" => Self::Country,
            "2.5.4.7" => Self::Locality,
            "2.5.4.10" => Self::Organization,
            "2.5.4.11" => Self::OrganizationalUnit,
            "2.5.4.3" => Self::CommonName,
            "1.2.840.113549.1.9.1" => Self::Email,
            "2.5.4.20" => Self::Telephone,
            other => Self::Other(other.to_string()),
        }
    }

    fn oid(&self) -> Result<ObjectIdentifier> {
        Ok(match self {
            Self::Country => oids::COUNTRY,
            Self::Locality => oids::LOCALITY,
            Self::Organization => oids::ORGANIZATION,
            Self::OrganizationalUnit => oids::ORGANIZATIONAL_UNIT,
            Self::CommonName => oids::COMMON_NAME,
            Self::Email => oids::EMAIL_ADDRESS,
            Self::Telephone => oids::TELEPHONE_NUMBER,
            Self::Other(dotted) => ObjectIdentifier::new(dotted)
                .map_err(|e| PkiError::InvalidRequest(format!("bad attribute OID {dotted}: {e}")))?,
        })
    }

    /// Directory string type used when encoding a value of this attribute.
    const fn string_tag(&self) -> Tag {
        match self {
            Self::Country => Tag::PrintableString,
            Self::Email => Tag::Ia5String,
            _ => Tag::Utf8String,
        }
    }

    /// True for the components a TDMX name constraint base carries.
    const fn is_constraint_component(&self) -> bool {
        matches!(
            self,
            Self::Country | Self::Locality | Self::Organization | Self::OrganizationalUnit
        )
    }
}

impl fmt::Display for NameAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(dotted) => f.write_str(oids::name_label(dotted).unwrap_or(dotted)),
            known => {
                let dotted = known.oid().map(|o| o.to_string()).unwrap_or_default();
                f.write_str(oids::name_label(&dotted).unwrap_or("?"))
            }
        }
    }
}

/// One attribute/value pair of a distinguished name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameComponent {
    pub attribute: NameAttribute,
    pub value: String,
}

/// Distinguished name as an ordered list of components.
///
/// Multi-valued RDNs are flattened in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistinguishedName {
    components: Vec<NameComponent>,
}

impl DistinguishedName {
    pub const fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Append a component. Empty values are skipped.
    #[must_use]
    pub fn with(mut self, attribute: NameAttribute, value: impl AsRef<str>) -> Self {
        self.push(attribute, value);
        self
    }

    /// Append a component if a value is present.
    #[must_use]
    pub fn with_opt(self, attribute: NameAttribute, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.with(attribute, v),
            None => self,
        }
    }

    /// Append a component in place. Empty values are skipped.
    pub fn push(&mut self, attribute: NameAttribute, value: impl AsRef<str>) {
        let value = value.as_ref().trim();
        if !value.is_empty() {
            self.components.push(NameComponent {
                attribute,
                value: value.to_string(),
            });
        }
    }

    /// Convert a parsed name.
    pub fn from_x509(name: &X509Name<'_>) -> Self {
        let mut components = Vec::new();
        for rdn in name.iter() {
            for attr in rdn.iter() {
                let attribute = NameAttribute::from_oid(&attr.attr_type().to_id_string());
                let value = attr.as_str().map_or_else(
                    |_| format!("#{}", hex::encode(attr.attr_value().data)),
                    str::to_string,
                );
                components.push(NameComponent { attribute, value });
            }
        }
        Self { components }
    }

    /// Encode as an X.509 `Name`, one single-valued RDN per component.
    pub fn to_x509_name(&self) -> Result<Name> {
        let mut rdns = Vec::with_capacity(self.components.len());
        for component in &self.components {
            let tag = component.attribute.string_tag();
            let value = check_charset(tag, &component.value)
                .and_then(|()| Any::new(tag, component.value.as_bytes()))
                .map_err(|e| {
                    PkiError::InvalidRequest(format!(
                        "{} value {:?} cannot be encoded: {e}",
                        component.attribute, component.value
                    ))
                })?;
            let mut set = SetOfVec::new();
            set.insert(AttributeTypeAndValue {
                oid: component.attribute.oid()?,
                value,
            })?;
            rdns.push(RelativeDistinguishedName::from(set));
        }
        Ok(RdnSequence(rdns))
    }

    pub fn components(&self) -> &[NameComponent] {
        &self.components
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    fn first(&self, attribute: &NameAttribute) -> Option<&str> {
        self.components
            .iter()
            .find(|c| &c.attribute == attribute)
            .map(|c| c.value.as_str())
    }

    pub fn country(&self) -> Option<&str> {
        self.first(&NameAttribute::Country)
    }

    pub fn locality(&self) -> Option<&str> {
        self.first(&NameAttribute::Locality)
    }

    pub fn organization(&self) -> Option<&str> {
        self.first(&NameAttribute::Organization)
    }

    pub fn common_name(&self) -> Option<&str> {
        self.first(&NameAttribute::CommonName)
    }

    pub fn email(&self) -> Option<&str> {
        self.first(&NameAttribute::Email)
    }

    pub fn telephone(&self) -> Option<&str> {
        self.first(&NameAttribute::Telephone)
    }

    /// All organizational units, in order.
    pub fn organizational_units(&self) -> Vec<&str> {
        self.components
            .iter()
            .filter(|c| c.attribute == NameAttribute::OrganizationalUnit)
            .map(|c| c.value.as_str())
            .collect()
    }

    /// The C/L/O/OU prefix of this name, as carried by name constraint bases.
    #[must_use]
    pub fn constraint_base(&self) -> Self {
        Self {
            components: self
                .components
                .iter()
                .filter(|c| c.attribute.is_constraint_component())
                .cloned()
                .collect(),
        }
    }

    /// RFC 5280 directory name subtree test: `base` is a leading prefix of this name.
    pub fn is_within(&self, base: &Self) -> bool {
        base.components.len() <= self.components.len()
            && base
                .components
                .iter()
                .zip(&self.components)
                .all(|(b, s)| b.attribute == s.attribute && values_match(&b.value, &s.value))
    }
}

/// `Any::new` does not check the character set of restricted string types.
fn check_charset(tag: Tag, value: &str) -> der::Result<()> {
    match tag {
        Tag::PrintableString => PrintableStringRef::new(value).map(|_| ()),
        Tag::Ia5String => Ia5StringRef::new(value).map(|_| ()),
        _ => Ok(()),
    }
}

/// Case-insensitive comparison of directory string values.
pub(crate) fn values_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", c.attribute, c.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::{Decode, Encode};
    use x509_parser::prelude::FromDer;

    fn sample() -> DistinguishedName {
        DistinguishedName::new()
            .with(NameAttribute::Country, "CH")
            .with(NameAttribute::Locality, "Zug")
            .with(NameAttribute::Organization, "Example AG")
            .with(NameAttribute::OrganizationalUnit, "Ops")
            .with(NameAttribute::Email, "admin@example.com")
            .with(NameAttribute::CommonName, "Zone Admin")
    }

    #[test]
    fn display_uses_labels() {
        assert_eq!(
            sample().to_string(),
            "C=CH, L=Zug, O=Example AG, OU=Ops, E=admin@example.com, CN=Zone Admin"
        );
    }

    #[test]
    fn empty_values_are_dropped() {
        let dn = DistinguishedName::new()
            .with(NameAttribute::Country, "  ")
            .with_opt(NameAttribute::Locality, None)
            .with(NameAttribute::CommonName, "x");
        assert_eq!(dn.components().len(), 1);
    }

    #[test]
    fn constraint_base_keeps_prefix_components() {
        let base = sample().constraint_base();
        assert_eq!(base.to_string(), "C=CH, L=Zug, O=Example AG, OU=Ops");
        assert!(sample().is_within(&base));
    }

    #[test]
    fn prefix_matching() {
        let base = DistinguishedName::new()
            .with(NameAttribute::Country, "CH")
            .with(NameAttribute::OrganizationalUnit, "tdmx-domain-ca");
        let inside = base
            .clone()
            .with(NameAttribute::OrganizationalUnit, "example.com")
            .with(NameAttribute::CommonName, "alice");
        let outside = DistinguishedName::new()
            .with(NameAttribute::Country, "DE")
            .with(NameAttribute::OrganizationalUnit, "tdmx-domain-ca");
        assert!(inside.is_within(&base));
        assert!(!outside.is_within(&base));
        assert!(!base.is_within(&inside));
    }

    #[test]
    fn multiple_units_survive_encoding() {
        let dn = sample()
            .with(NameAttribute::OrganizationalUnit, "tdmx-domain-ca")
            .with(NameAttribute::OrganizationalUnit, "example.com");
        let der = dn.to_x509_name().unwrap().to_der().unwrap();
        let (_, parsed) = X509Name::from_der(&der).unwrap();
        let back = DistinguishedName::from_x509(&parsed);
        assert_eq!(back, dn);
        assert_eq!(
            back.organizational_units(),
            vec!["Ops", "tdmx-domain-ca", "example.com"]
        );
        // round trip through the x509-cert type as well
        assert_eq!(Name::from_der(&der).unwrap().to_der().unwrap(), der);
    }

    #[test]
    fn country_must_be_printable() {
        let dn = DistinguishedName::new().with(NameAttribute::Country, "C@");
        assert!(matches!(dn.to_x509_name(), Err(PkiError::InvalidRequest(_))));
        let ok = DistinguishedName::new().with(NameAttribute::Country, "CH");
        assert!(ok.to_x509_name().is_ok());
    }

    #[test]
    fn email_must_be_ia5() {
        let dn = DistinguishedName::new().with(NameAttribute::Email, "zoë@example.com");
        assert!(matches!(dn.to_x509_name(), Err(PkiError::InvalidRequest(_))));
        // UTF8String attributes accept any text
        let cn = DistinguishedName::new().with(NameAttribute::CommonName, "Zoë");
        assert!(cn.to_x509_name().is_ok());
    }
}
