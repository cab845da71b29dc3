//! `tdmx-ca trust-list` - Annotated trust lists.

use anyhow::{Context as _, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

use super::{read_first_certificate, Context};
use crate::cli::args::{TrustListArgs, TrustListCommands};
use crate::output::{self, CertificateSummary, OutputFormat};
use tdmx_pki::encoding::{decode_trust_list, encode_trust_list, TrustListEntry};

#[derive(Serialize)]
struct EntryReport {
    friendly_name: Option<String>,
    comment: Option<String>,
    certificate: CertificateSummary,
}

pub fn execute(ctx: &Context, args: TrustListArgs) -> Result<ExitCode> {
    match args.command {
        TrustListCommands::Show { file } => show(ctx, &file),
        TrustListCommands::Add {
            file,
            certificate,
            friendly_name,
            comment,
        } => add(&file, &certificate, friendly_name, comment),
    }
}

fn read_list(file: &Path) -> Result<Vec<TrustListEntry>> {
    if !file.exists() {
        return Ok(Vec::new());
    }
    let text =
        std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    decode_trust_list(&text).with_context(|| format!("decoding {}", file.display()))
}

fn show(ctx: &Context, file: &Path) -> Result<ExitCode> {
    if !file.exists() {
        anyhow::bail!("{} does not exist", file.display());
    }
    let entries = read_list(file)?;

    match ctx.output_format {
        OutputFormat::Json => {
            let reports: Vec<EntryReport> = entries
                .iter()
                .map(|e| EntryReport {
                    friendly_name: e.friendly_name.clone(),
                    comment: e.comment.clone(),
                    certificate: CertificateSummary::new(&e.certificate),
                })
                .collect();
            output::print_json(&reports)?;
        }
        OutputFormat::Pretty => {
            println!("{} {} entries", "Trust list:".bold(), entries.len());
            for entry in &entries {
                println!();
                if let Some(name) = &entry.friendly_name {
                    println!("{} {}", "Name:".bold(), name.yellow());
                }
                if let Some(comment) = &entry.comment {
                    println!("{} {}", "Comment:".bold(), comment.dimmed());
                }
                CertificateSummary::new(&entry.certificate).print_pretty();
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn add(
    file: &Path,
    certificate: &Path,
    friendly_name: Option<String>,
    comment: Option<String>,
) -> Result<ExitCode> {
    let mut entries = read_list(file)?;
    let cert = read_first_certificate(certificate)?;

    // replace rather than duplicate
    entries.retain(|e| e.certificate.fingerprint() != cert.fingerprint());
    let fingerprint = cert.fingerprint().to_string();
    entries.push(TrustListEntry {
        certificate: cert,
        friendly_name,
        comment,
    });

    std::fs::write(file, encode_trust_list(&entries))
        .with_context(|| format!("writing {}", file.display()))?;
    println!(
        "{} added {} to {}",
        "Success:".green().bold(),
        fingerprint.cyan(),
        file.display()
    );

    Ok(ExitCode::SUCCESS)
}
