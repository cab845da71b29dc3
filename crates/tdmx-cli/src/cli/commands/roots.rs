//! `tdmx-ca roots` - Platform trust store.

use anyhow::Result;
use colored::Colorize;
use std::process::ExitCode;

use super::Context;
use crate::cli::args::RootsArgs;
use crate::output::{self, CertificateSummary, OutputFormat};
use tdmx_pki::trust_store::{system_trust_anchors, trust_anchors_from};

pub fn execute(ctx: &Context, args: RootsArgs) -> Result<ExitCode> {
    let anchors = if args.paths.is_empty() {
        system_trust_anchors()
    } else {
        trust_anchors_from(args.paths.iter().map(|p| p.as_path()))
    };

    match ctx.output_format {
        OutputFormat::Json => {
            let summaries: Vec<CertificateSummary> =
                anchors.iter().map(CertificateSummary::new).collect();
            output::print_json(&summaries)?;
        }
        OutputFormat::Pretty => {
            println!("{} {} certificates", "Trusted roots:".bold(), anchors.len());
            for anchor in &anchors {
                println!("  {} {}", anchor.fingerprint().dimmed(), anchor.subject());
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
