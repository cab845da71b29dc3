//! Output formatting for different formats.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use tdmx_pki::{CertificateHandle, CertificateRole};

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text with colors
    #[default]
    Pretty,
    /// JSON output
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!(
                "Unknown output format: {}\n\
                 Valid formats: pretty, json",
                s
            ),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Zone info as shown to operators.
#[derive(Debug, Serialize)]
pub struct ZoneInfoSummary {
    pub version: u32,
    pub zone_root: String,
    pub third_field: String,
}

/// The displayable facts about one certificate.
#[derive(Debug, Serialize)]
pub struct CertificateSummary {
    pub subject: String,
    pub issuer: String,
    pub serial: String,
    pub fingerprint: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub signature_algorithm: String,
    pub role: CertificateRole,
    pub is_ca: bool,
    pub path_length: Option<u32>,
    pub self_signed: bool,
    pub zone_info: Option<ZoneInfoSummary>,
}

impl CertificateSummary {
    pub fn new(cert: &CertificateHandle) -> Self {
        Self {
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            serial: cert.serial_hex(),
            fingerprint: cert.fingerprint().to_string(),
            not_before: cert.not_before(),
            not_after: cert.not_after(),
            signature_algorithm: cert.signature_algorithm_name().to_string(),
            role: cert.role(),
            is_ca: cert.is_ca(),
            path_length: cert.path_length(),
            self_signed: cert.is_self_signed(),
            zone_info: cert.zone_info().map(|z| ZoneInfoSummary {
                version: z.version(),
                zone_root: z.zone_root().to_string(),
                third_field: z.third_field().to_string(),
            }),
        }
    }

    pub fn print_pretty(&self) {
        println!("{} {}", "Subject:".bold(), self.subject.cyan().bold());
        println!("  {} {}", "Issuer:".bold(), self.issuer);
        println!("  {} {}", "Role:".bold(), role_label(self.role));
        println!("  {} {}", "Fingerprint:".bold(), self.fingerprint);
        println!("  {} {}", "Serial:".bold(), self.serial);
        println!(
            "  {} {} to {}",
            "Valid:".bold(),
            self.not_before.format("%Y-%m-%d %H:%M:%S UTC"),
            self.not_after.format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!("  {} {}", "Signature:".bold(), self.signature_algorithm);
        if self.is_ca {
            let len = self
                .path_length
                .map_or_else(|| "unlimited".to_string(), |n| n.to_string());
            println!("  {} yes (path length {})", "CA:".bold(), len);
        }
        match &self.zone_info {
            Some(zone) => {
                println!("  {} {} (version {})", "Zone:".bold(), zone.zone_root, zone.version);
                if !zone.third_field.is_empty() {
                    println!("  {} {}", "Zone field:".bold(), zone.third_field);
                }
            }
            None => println!("  {} {}", "Zone:".bold(), "(none)".dimmed()),
        }
    }
}

/// Role name with a color per tier.
pub fn role_label(role: CertificateRole) -> String {
    match role {
        CertificateRole::ZoneAdmin => "zone administrator".magenta().to_string(),
        CertificateRole::DomainAdmin => "domain administrator".blue().to_string(),
        CertificateRole::User => "user".green().to_string(),
        CertificateRole::Unclassified => "unclassified".dimmed().to_string(),
    }
}

/// Print `value` as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
