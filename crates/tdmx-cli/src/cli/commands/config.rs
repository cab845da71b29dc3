//! `tdmx-ca config` - CLI configuration management.

use anyhow::Result;
use colored::Colorize;
use std::process::ExitCode;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::output::OutputFormat;

pub fn execute(ctx: &Context, args: ConfigArgs) -> Result<ExitCode> {
    match args.command {
        ConfigCommands::Show => show_config(ctx)?,
        ConfigCommands::Set { key, value } => set_config(ctx, &key, &value)?,
        ConfigCommands::Path => println!("{}", ctx.config_path.display()),
    }
    Ok(ExitCode::SUCCESS)
}

fn show_config(ctx: &Context) -> Result<()> {
    let config = &ctx.config;

    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        OutputFormat::Pretty => {
            println!("{}", "Current Configuration:".bold());
            println!();

            println!(
                "  {} {}",
                "output_format:".bold(),
                config.output_format.unwrap_or_default()
            );
            println!("  {} {}", "passphrase_env:".bold(), config.passphrase_env());

            let policy = &config.policy;
            println!();
            println!("{}", "Issuance policy:".bold());
            println!("  {} {}", "key_algorithm:".bold(), policy.key_algorithm);
            println!("  {} {}", "signature_algorithm:".bold(), policy.signature_algorithm);
            println!("  {} {}", "zone_info_version:".bold(), policy.zone_info_version);
            println!("  {} {}", "zone_validity_days:".bold(), policy.zone_validity_days);
            println!("  {} {}", "domain_validity_days:".bold(), policy.domain_validity_days);
            println!("  {} {}", "user_validity_days:".bold(), policy.user_validity_days);
        }
    }

    Ok(())
}

fn set_config(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let mut config = ctx.config.clone();
    let policy = &mut config.policy;

    match key {
        "output_format" | "output" => config.output_format = Some(value.parse()?),
        "passphrase_env" => config.passphrase_env = Some(value.to_string()),
        "key_algorithm" => policy.key_algorithm = value.parse()?,
        "signature_algorithm" => policy.signature_algorithm = value.parse()?,
        "zone_info_version" => policy.zone_info_version = value.parse()?,
        "zone_validity_days" => policy.zone_validity_days = value.parse()?,
        "domain_validity_days" => policy.domain_validity_days = value.parse()?,
        "user_validity_days" => policy.user_validity_days = value.parse()?,
        _ => {
            anyhow::bail!(
                "Unknown config key: {}\n\n\
                 Available keys:\n  \
                 output_format        - Default output format (pretty/json)\n  \
                 passphrase_env       - Environment variable holding the key store passphrase\n  \
                 key_algorithm        - ecdsa-p256, ecdsa-p384 or ed25519\n  \
                 signature_algorithm  - ecdsa-sha256, ecdsa-sha384 or ed25519\n  \
                 zone_info_version    - Version written into new zones\n  \
                 zone_validity_days   - Zone administrator lifetime\n  \
                 domain_validity_days - Domain administrator lifetime\n  \
                 user_validity_days   - User lifetime",
                key
            );
        }
    }

    config.save(&ctx.config_path)?;
    println!("{} {} set to {}.", "Success:".green().bold(), key, value.cyan());

    Ok(())
}
