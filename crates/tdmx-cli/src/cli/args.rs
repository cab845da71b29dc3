//! Command-line argument definitions using clap.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;
use tdmx_pki::{KeyAlgorithm, SignatureAlgorithm};

/// Certificate authority for TDMX zones
///
/// Mints zone administrator, domain administrator and user credentials,
/// and checks that a certificate chains back to a trusted zone.
#[derive(Parser, Debug)]
#[command(name = "tdmx-ca")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Key store passphrase (or set TDMX_KEYSTORE_PASSPHRASE env var)
    #[arg(short, long, global = true)]
    pub passphrase: Option<String>,

    /// Configuration file (defaults to the per-user config directory)
    #[arg(long, env = "TDMX_CA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Zone administrator credentials
    Zone(ZoneArgs),

    /// Domain administrator credentials
    Domain(DomainArgs),

    /// User credentials
    User(UserArgs),

    /// Check a zone, domain or user certificate against its zone
    Verify(VerifyArgs),

    /// Show the certificates in a PEM file
    Inspect(InspectArgs),

    /// Read and extend annotated trust lists
    TrustList(TrustListArgs),

    /// List the platform's trusted root certificates
    Roots(RootsArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),
}

// ============================================================================
// Shared issuance options
// ============================================================================

#[derive(Args, Debug)]
pub struct KeyOptions {
    /// Key algorithm (ecdsa-p256, ecdsa-p384, ed25519)
    #[arg(long)]
    pub key_algorithm: Option<KeyAlgorithm>,

    /// Signature algorithm; must match the issuer's key
    #[arg(long)]
    pub signature_algorithm: Option<SignatureAlgorithm>,

    /// Certificate lifetime in days
    #[arg(long)]
    pub validity_days: Option<u32>,
}

#[derive(Args, Debug)]
pub struct OutputFiles {
    /// Name of the new key store entry and output files
    #[arg(long)]
    pub alias: Option<String>,

    /// Directory for the new key store and certificate chain
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct IssuerStore {
    /// Key store holding the issuing credential
    #[arg(long)]
    pub issuer: PathBuf,

    /// Entry of the issuing credential (defaults to the key store's file stem)
    #[arg(long)]
    pub issuer_alias: Option<String>,
}

// ============================================================================
// Zone command
// ============================================================================

#[derive(Args, Debug)]
pub struct ZoneArgs {
    #[command(subcommand)]
    pub command: ZoneCommands,
}

#[derive(Subcommand, Debug)]
pub enum ZoneCommands {
    /// Create a self-signed zone administrator credential
    Create(ZoneCreateArgs),
}

#[derive(Args, Debug)]
pub struct ZoneCreateArgs {
    /// Zone root domain (e.g., example.com)
    pub zone_root: String,

    /// Common name of the zone administrator
    #[arg(long, default_value = "Zone Administrator")]
    pub common_name: String,

    /// URL of the zone's message relay service
    #[arg(long, default_value = "")]
    pub service_url: String,

    /// Country code (C)
    #[arg(long)]
    pub country: Option<String>,

    /// Locality (L)
    #[arg(long)]
    pub locality: Option<String>,

    /// Organization (O)
    #[arg(long)]
    pub organization: Option<String>,

    /// Organizational unit (OU); repeatable
    #[arg(long = "unit")]
    pub organizational_units: Vec<String>,

    /// Contact email address
    #[arg(long)]
    pub email: Option<String>,

    /// Contact telephone number
    #[arg(long)]
    pub telephone: Option<String>,

    /// Zone info version
    #[arg(long)]
    pub zone_info_version: Option<u32>,

    #[command(flatten)]
    pub key: KeyOptions,

    #[command(flatten)]
    pub files: OutputFiles,
}

// ============================================================================
// Domain command
// ============================================================================

#[derive(Args, Debug)]
pub struct DomainArgs {
    #[command(subcommand)]
    pub command: DomainCommands,
}

#[derive(Subcommand, Debug)]
pub enum DomainCommands {
    /// Create a domain administrator credential signed by a zone administrator
    Create(DomainCreateArgs),
}

#[derive(Args, Debug)]
pub struct DomainCreateArgs {
    /// Domain name within the zone (e.g., sales.example.com)
    pub domain_name: String,

    /// Contact email address
    #[arg(long)]
    pub email: Option<String>,

    /// Contact telephone number
    #[arg(long)]
    pub telephone: Option<String>,

    #[command(flatten)]
    pub issuer: IssuerStore,

    #[command(flatten)]
    pub key: KeyOptions,

    #[command(flatten)]
    pub files: OutputFiles,
}

// ============================================================================
// User command
// ============================================================================

#[derive(Args, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommands,
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Create a user credential signed by a domain administrator
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
pub struct UserCreateArgs {
    /// Local name of the user (e.g., alice)
    pub local_name: String,

    /// Contact email address
    #[arg(long)]
    pub email: Option<String>,

    /// Contact telephone number
    #[arg(long)]
    pub telephone: Option<String>,

    #[command(flatten)]
    pub issuer: IssuerStore,

    #[command(flatten)]
    pub key: KeyOptions,

    #[command(flatten)]
    pub files: OutputFiles,
}

// ============================================================================
// Verify command
// ============================================================================

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// PEM file whose first certificate is the zone administrator
    #[arg(long)]
    pub zone: PathBuf,

    /// PEM file whose first certificate is the domain administrator
    #[arg(long)]
    pub domain: Option<PathBuf>,

    /// PEM file whose first certificate is the user (requires --domain)
    #[arg(long, requires = "domain")]
    pub user: Option<PathBuf>,

    /// Check validity at this instant (RFC 3339) instead of now
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

// ============================================================================
// Inspect command
// ============================================================================

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// PEM or DER certificate file
    pub file: PathBuf,
}

// ============================================================================
// Trust list command
// ============================================================================

#[derive(Args, Debug)]
pub struct TrustListArgs {
    #[command(subcommand)]
    pub command: TrustListCommands,
}

#[derive(Subcommand, Debug)]
pub enum TrustListCommands {
    /// Show the entries of a trust list
    Show {
        /// Trust list file
        file: PathBuf,
    },

    /// Add a certificate to a trust list, creating it if needed
    Add {
        /// Trust list file
        file: PathBuf,

        /// PEM file whose first certificate is added
        certificate: PathBuf,

        /// Friendly name stored with the certificate
        #[arg(long)]
        friendly_name: Option<String>,

        /// Comment stored with the certificate
        #[arg(long)]
        comment: Option<String>,
    },
}

// ============================================================================
// Roots command
// ============================================================================

#[derive(Args, Debug)]
pub struct RootsArgs {
    /// Scan these bundle files or directories instead of the platform defaults
    #[arg(long = "path")]
    pub paths: Vec<PathBuf>,
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Value to set
        value: String,
    },

    /// Show configuration file path
    Path,
}
