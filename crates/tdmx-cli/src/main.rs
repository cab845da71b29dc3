//! tdmx-ca - TDMX zone certificate authority
//!
//! Mints zone, domain and user credentials and checks their chains of trust.

use anyhow::Result;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    tdmx_cli::run()
}
