//! `tdmx-ca zone` - Zone administrator credentials.

use anyhow::Result;
use std::process::ExitCode;

use super::{apply_key_options, Context};
use crate::cli::args::{ZoneArgs, ZoneCommands, ZoneCreateArgs};
use tdmx_pki::{create_zone_administrator_credential, ZoneAdministratorRequest};

pub fn execute(ctx: &Context, args: ZoneArgs) -> Result<ExitCode> {
    match args.command {
        ZoneCommands::Create(args) => create(ctx, args),
    }
}

fn create(ctx: &Context, args: ZoneCreateArgs) -> Result<ExitCode> {
    // fail before generating keys
    ctx.require_passphrase()?;

    let policy = &ctx.config.policy;
    let mut request =
        ZoneAdministratorRequest::with_policy(&args.zone_root, &args.common_name, policy);
    request.service_url = args.service_url;
    request.country = args.country;
    request.locality = args.locality;
    request.organization = args.organization;
    request.organizational_units = args.organizational_units;
    request.email = args.email;
    request.telephone = args.telephone;
    if let Some(version) = args.zone_info_version {
        request.zone_info_version = version;
    }
    apply_key_options(
        &args.key,
        &mut request.key_algorithm,
        &mut request.signature_algorithm,
        &mut request.validity_days,
    );
    // self-signed: the new key signs
    if args.key.signature_algorithm.is_none() {
        request.signature_algorithm = request.key_algorithm.signature_algorithm();
    }

    let credential = create_zone_administrator_credential(&request)?;
    // example.com.zone
    let zone_root = credential
        .zone_info()
        .map_or(request.zone_root.as_str(), |z| z.zone_root());
    let default_alias = format!("{zone_root}.zone");
    let files = ctx.write_credential(&args.files, &default_alias, &credential)?;
    ctx.report_issued(&credential, &files)?;
    Ok(ExitCode::SUCCESS)
}
