//! `tdmx-ca inspect` - Show the certificates in a file.

use anyhow::Result;
use std::process::ExitCode;

use super::{read_certificates, Context};
use crate::cli::args::InspectArgs;
use crate::output::{self, CertificateSummary, OutputFormat};

pub fn execute(ctx: &Context, args: InspectArgs) -> Result<ExitCode> {
    let summaries: Vec<CertificateSummary> = read_certificates(&args.file)?
        .iter()
        .map(CertificateSummary::new)
        .collect();

    match ctx.output_format {
        OutputFormat::Json => output::print_json(&summaries)?,
        OutputFormat::Pretty => {
            for (i, summary) in summaries.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                summary.print_pretty();
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
