//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::output::OutputFormat;

/// Run the CLI application.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Load configuration
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load(&config_path)?;

    // Determine output format
    let output_format = cli
        .output
        .or(config.output_format)
        .unwrap_or(OutputFormat::Pretty);

    // Passphrase from CLI, then the configured environment variable
    let passphrase = cli
        .passphrase
        .or_else(|| std::env::var(config.passphrase_env()).ok());

    let ctx = commands::Context {
        passphrase,
        output_format,
        verbose: cli.verbose,
        config,
        config_path,
    };

    // Dispatch to appropriate command
    match cli.command {
        Commands::Zone(args) => commands::zone::execute(&ctx, args),
        Commands::Domain(args) => commands::domain::execute(&ctx, args),
        Commands::User(args) => commands::user::execute(&ctx, args),
        Commands::Verify(args) => commands::verify::execute(&ctx, args),
        Commands::Inspect(args) => commands::inspect::execute(&ctx, args),
        Commands::TrustList(args) => commands::trust_list::execute(&ctx, args),
        Commands::Roots(args) => commands::roots::execute(&ctx, args),
        Commands::Config(args) => commands::config::execute(&ctx, args),
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "tdmx_pki=debug,tdmx_cli=debug"
    } else {
        "warn"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose);

    // A subscriber may already be installed when embedded.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
