//! `tdmx-ca user` - User credentials.

use anyhow::Result;
use std::process::ExitCode;

use super::{apply_key_options, Context};
use crate::cli::args::{UserArgs, UserCommands, UserCreateArgs};
use tdmx_pki::{create_user_credential, UserRequest};

pub fn execute(ctx: &Context, args: UserArgs) -> Result<ExitCode> {
    match args.command {
        UserCommands::Create(args) => create(ctx, args),
    }
}

fn create(ctx: &Context, args: UserCreateArgs) -> Result<ExitCode> {
    let domain = ctx.load_issuer(&args.issuer)?;

    let mut request = UserRequest::with_policy(&args.local_name, &ctx.config.policy);
    request.email = args.email;
    request.telephone = args.telephone;
    apply_key_options(
        &args.key,
        &mut request.key_algorithm,
        &mut request.signature_algorithm,
        &mut request.validity_days,
    );
    if args.key.signature_algorithm.is_none() {
        request.signature_algorithm = domain.private_key().algorithm().signature_algorithm();
    }

    let credential = create_user_credential(&domain, &request)?;
    // alice@sales.example.com
    let default_alias = match domain.public_certificate().common_name() {
        Some(domain_name) => format!("{}@{domain_name}", args.local_name),
        None => args.local_name.clone(),
    };
    let files = ctx.write_credential(&args.files, &default_alias, &credential)?;
    ctx.report_issued(&credential, &files)?;
    Ok(ExitCode::SUCCESS)
}
