//! `tdmx-ca verify` - Check a certificate against its zone.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::process::ExitCode;

use super::{read_first_certificate, Context};
use crate::cli::args::VerifyArgs;
use crate::output::{self, CertificateSummary, OutputFormat};
use tdmx_pki::{CertificateRole, ChainValidator};

#[derive(Serialize)]
struct VerifyReport {
    valid: bool,
    checked: CertificateRole,
    reason: Option<String>,
    certificates: Vec<CertificateSummary>,
}

pub fn execute(ctx: &Context, args: VerifyArgs) -> Result<ExitCode> {
    let validator = args.at.map_or_else(ChainValidator::new, ChainValidator::at);

    let zac = read_first_certificate(&args.zone)?;
    let dac = args.domain.as_deref().map(read_first_certificate).transpose()?;
    let uc = args.user.as_deref().map(read_first_certificate).transpose()?;

    let (checked, outcome) = match (&dac, &uc) {
        (Some(dac), Some(uc)) => (
            CertificateRole::User,
            validator.check_user_certificate(&zac, dac, uc),
        ),
        (Some(dac), None) => (
            CertificateRole::DomainAdmin,
            validator.check_domain_administrator_certificate(&zac, dac),
        ),
        _ => (
            CertificateRole::ZoneAdmin,
            validator.check_zone_administrator_certificate(&zac),
        ),
    };

    let report = VerifyReport {
        valid: outcome.is_ok(),
        checked,
        reason: outcome.err().map(|e| e.to_string()),
        certificates: [Some(&zac), dac.as_ref(), uc.as_ref()]
            .into_iter()
            .flatten()
            .map(CertificateSummary::new)
            .collect(),
    };

    match ctx.output_format {
        OutputFormat::Json => output::print_json(&report)?,
        OutputFormat::Pretty => print_pretty(&report),
    }

    Ok(if report.valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_pretty(report: &VerifyReport) {
    let leaf = report.certificates.last();
    let subject = leaf.map_or("", |c| c.subject.as_str());
    if report.valid {
        println!(
            "{} valid {} certificate",
            "OK:".green().bold(),
            output::role_label(report.checked)
        );
    } else {
        println!(
            "{} not a valid {} certificate",
            "INVALID:".red().bold(),
            output::role_label(report.checked)
        );
        if let Some(reason) = &report.reason {
            println!("  {} {}", "Reason:".bold(), reason);
        }
    }
    println!("  {} {}", "Subject:".bold(), subject);
    if let Some(zone) = leaf.and_then(|c| c.zone_info.as_ref()) {
        println!("  {} {}", "Zone:".bold(), zone.zone_root);
    }
}
