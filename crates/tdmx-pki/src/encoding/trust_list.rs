//! Annotated trust lists.
//!
//! A trust list is a PEM stream with metadata lines keyed by fingerprint:
//!
//! ```text
//! #friendlyName:<fingerprint> Example zone
//! #comment:<fingerprint> added after the 2024 key rollover
//! #comment:<fingerprint> replaces the 2019 zone key
//! -----BEGIN CERTIFICATE-----
//! ...
//! ```
//!
//! A comment spans one `#comment:` line per text line; repeated lines for the
//! same fingerprint are joined with `\n`.
//!
//! Decoding takes two passes: certificates first, then the metadata lines,
//! which may appear anywhere in the text.

use std::collections::HashMap;
use tracing::debug;

use super::certs::{certificate_to_pem, certificates_from_pem};
use crate::certificate::CertificateHandle;
use crate::error::Result;

const FRIENDLY_NAME_PREFIX: &str = "#friendlyName:";
const COMMENT_PREFIX: &str = "#comment:";

/// One trusted certificate with its optional annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustListEntry {
    pub certificate: CertificateHandle,
    pub friendly_name: Option<String>,
    pub comment: Option<String>,
}

impl TrustListEntry {
    pub const fn new(certificate: CertificateHandle) -> Self {
        Self {
            certificate,
            friendly_name: None,
            comment: None,
        }
    }

    #[must_use]
    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Decode a trust list, keeping certificate order.
pub fn decode_trust_list(text: &str) -> Result<Vec<TrustListEntry>> {
    let mut entries: Vec<TrustListEntry> = certificates_from_pem(text)?
        .into_iter()
        .map(TrustListEntry::new)
        .collect();
    let by_fingerprint: HashMap<String, usize> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (e.certificate.fingerprint().to_ascii_lowercase(), i))
        .collect();

    for line in text.lines().map(str::trim) {
        let (annotation, rest) = if let Some(rest) = line.strip_prefix(FRIENDLY_NAME_PREFIX) {
            (FRIENDLY_NAME_PREFIX, rest)
        } else if let Some(rest) = line.strip_prefix(COMMENT_PREFIX) {
            (COMMENT_PREFIX, rest)
        } else {
            continue;
        };
        let (fingerprint, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let Some(&index) = by_fingerprint.get(&fingerprint.to_ascii_lowercase()) else {
            debug!(fingerprint, "trust list annotation for unknown certificate");
            continue;
        };
        let value = value.trim();
        let entry = &mut entries[index];
        if annotation == FRIENDLY_NAME_PREFIX {
            entry.friendly_name = Some(value.to_string());
        } else if let Some(comment) = &mut entry.comment {
            comment.push('\n');
            comment.push_str(value);
        } else {
            entry.comment = Some(value.to_string());
        }
    }
    Ok(entries)
}

/// Encode entries, each as its annotation lines followed by the PEM block.
pub fn encode_trust_list(entries: &[TrustListEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let fingerprint = entry.certificate.fingerprint();
        if let Some(name) = &entry.friendly_name {
            out.push_str(&format!("{FRIENDLY_NAME_PREFIX}{fingerprint} {}\n", single_line(name)));
        }
        if let Some(comment) = &entry.comment {
            for line in comment.split('\n') {
                out.push_str(&format!("{COMMENT_PREFIX}{fingerprint} {}\n", line.trim()));
            }
        }
        out.push_str(&certificate_to_pem(&entry.certificate));
    }
    out
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
