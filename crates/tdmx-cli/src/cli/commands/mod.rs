//! Command implementations.

pub mod config;
pub mod domain;
pub mod inspect;
pub mod roots;
pub mod trust_list;
pub mod user;
pub mod verify;
pub mod zone;

use anyhow::{Context as _, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use tdmx_pki::encoding::{certificate_from_der, certificates_from_pem};
use tdmx_pki::keystore::{load_credential, store_credential};
use tdmx_pki::{CertificateHandle, Credential};

use crate::cli::args::{IssuerStore, KeyOptions, OutputFiles};
use crate::config::Config;
use crate::output::{self, CertificateSummary, OutputFormat};

/// File extension of key stores written by the CLI.
pub const KEYSTORE_EXTENSION: &str = "tdmx-keystore";
/// File extension of certificate chains written by the CLI.
pub const CHAIN_EXTENSION: &str = "crt";

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Key store passphrase
    pub passphrase: Option<String>,

    /// Output format
    pub output_format: OutputFormat,

    /// Verbose output
    pub verbose: bool,

    /// Loaded configuration
    pub config: Config,

    /// Where the configuration lives
    pub config_path: PathBuf,
}

impl Context {
    /// Get the passphrase, returning an error if not set.
    pub fn require_passphrase(&self) -> Result<&str> {
        self.passphrase.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "Key store passphrase required.\n\n\
                 Set it with one of:\n  \
                 1. --passphrase <PASSPHRASE>\n  \
                 2. {} environment variable",
                self.config.passphrase_env()
            )
        })
    }

    /// Open the issuing credential named by `store`.
    pub fn load_issuer(&self, store: &IssuerStore) -> Result<Credential> {
        let alias = match &store.issuer_alias {
            Some(alias) => alias.clone(),
            None => file_alias(&store.issuer)?,
        };
        load_credential(&store.issuer, &alias, self.require_passphrase()?)
            .with_context(|| format!("opening {} entry {alias}", store.issuer.display()))
    }

    /// Seal `credential` into `<alias>.tdmx-keystore` and write `<alias>.crt`.
    pub fn write_credential(
        &self,
        files: &OutputFiles,
        default_alias: &str,
        credential: &Credential,
    ) -> Result<IssuedFiles> {
        let alias = files.alias.as_deref().unwrap_or(default_alias);
        let keystore = files.out_dir.join(format!("{alias}.{KEYSTORE_EXTENSION}"));
        let chain = files.out_dir.join(format!("{alias}.{CHAIN_EXTENSION}"));
        for path in [&keystore, &chain] {
            if path.exists() && !files.force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
        }

        std::fs::create_dir_all(&files.out_dir)
            .with_context(|| format!("creating {}", files.out_dir.display()))?;
        store_credential(&keystore, alias, self.require_passphrase()?, credential)
            .with_context(|| format!("writing {}", keystore.display()))?;
        std::fs::write(&chain, credential.chain_pem())
            .with_context(|| format!("writing {}", chain.display()))?;

        info!(alias, keystore = %keystore.display(), chain = %chain.display(), "credential written");
        Ok(IssuedFiles {
            alias: alias.to_string(),
            keystore,
            chain,
        })
    }

    /// Report a freshly issued credential.
    pub fn report_issued(&self, credential: &Credential, files: &IssuedFiles) -> Result<()> {
        let summary = CertificateSummary::new(credential.public_certificate());
        match self.output_format {
            OutputFormat::Json => output::print_json(&IssuedReport {
                alias: &files.alias,
                keystore: &files.keystore,
                chain: &files.chain,
                certificate: summary,
            }),
            OutputFormat::Pretty => {
                println!(
                    "{} {} credential {}",
                    "Success:".green().bold(),
                    output::role_label(summary.role),
                    files.alias.cyan()
                );
                println!("  {} {}", "Key store:".bold(), files.keystore.display());
                println!("  {} {}", "Chain:".bold(), files.chain.display());
                println!();
                summary.print_pretty();
                Ok(())
            }
        }
    }
}

/// Paths written for one credential.
#[derive(Debug)]
pub struct IssuedFiles {
    pub alias: String,
    pub keystore: PathBuf,
    pub chain: PathBuf,
}

#[derive(Serialize)]
struct IssuedReport<'a> {
    alias: &'a str,
    keystore: &'a Path,
    chain: &'a Path,
    certificate: CertificateSummary,
}

/// Override policy defaults with explicit key options.
pub(crate) fn apply_key_options(
    options: &KeyOptions,
    key_algorithm: &mut tdmx_pki::KeyAlgorithm,
    signature_algorithm: &mut tdmx_pki::SignatureAlgorithm,
    validity_days: &mut u32,
) {
    if let Some(algorithm) = options.key_algorithm {
        *key_algorithm = algorithm;
    }
    if let Some(algorithm) = options.signature_algorithm {
        *signature_algorithm = algorithm;
    }
    if let Some(days) = options.validity_days {
        *validity_days = days;
    }
}

/// Every certificate in a PEM file, or the single certificate of a DER file.
pub fn read_certificates(path: &Path) -> Result<Vec<CertificateHandle>> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let certs = match std::str::from_utf8(&bytes) {
        Ok(text) if text.contains("-----BEGIN") => certificates_from_pem(text)?,
        _ => vec![certificate_from_der(&bytes)?],
    };
    if certs.is_empty() {
        anyhow::bail!("no certificates in {}", path.display());
    }
    Ok(certs)
}

/// The first certificate of a file; for a chain file that is its leaf.
pub fn read_first_certificate(path: &Path) -> Result<CertificateHandle> {
    read_certificates(path)?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("no certificates in {}", path.display()))
}

fn file_alias(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("cannot derive an alias from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_is_the_file_stem() {
        assert_eq!(
            file_alias(Path::new("/tmp/example.com.tdmx-keystore")).unwrap(),
            "example.com"
        );
    }
}
