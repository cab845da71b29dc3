//! `tdmx-ca domain` - Domain administrator credentials.

use anyhow::Result;
use std::process::ExitCode;

use super::{apply_key_options, Context};
use crate::cli::args::{DomainArgs, DomainCommands, DomainCreateArgs};
use tdmx_pki::{create_domain_administrator_credential, DomainAdministratorRequest};

pub fn execute(ctx: &Context, args: DomainArgs) -> Result<ExitCode> {
    match args.command {
        DomainCommands::Create(args) => create(ctx, args),
    }
}

fn create(ctx: &Context, args: DomainCreateArgs) -> Result<ExitCode> {
    let zone = ctx.load_issuer(&args.issuer)?;

    let mut request = DomainAdministratorRequest::with_policy(&args.domain_name, &ctx.config.policy);
    request.email = args.email;
    request.telephone = args.telephone;
    apply_key_options(
        &args.key,
        &mut request.key_algorithm,
        &mut request.signature_algorithm,
        &mut request.validity_days,
    );
    if args.key.signature_algorithm.is_none() {
        request.signature_algorithm = zone.private_key().algorithm().signature_algorithm();
    }

    let credential = create_domain_administrator_credential(&zone, &request)?;
    // sales.example.com.domain
    let domain_name = credential
        .public_certificate()
        .common_name()
        .unwrap_or(&args.domain_name);
    let default_alias = format!("{domain_name}.domain");
    let files = ctx.write_credential(&args.files, &default_alias, &credential)?;
    ctx.report_issued(&credential, &files)?;
    Ok(ExitCode::SUCCESS)
}
