//! # tdmx-cli
//!
//! Operator command-line interface for a TDMX zone certificate authority.
//!
//! ## Features
//!
//! - **Issuance**: zone, domain and user credentials in passphrase-sealed key stores
//! - **Verification**: role and chain-of-trust checks with a non-zero exit on failure
//! - **Inspection**: subject, issuer, fingerprint, validity, role and zone info
//! - **Trust lists**: read and extend annotated PEM trust lists
//! - **Multiple output formats**: Pretty text or JSON

pub mod cli;
pub mod config;
pub mod output;

pub use cli::run;
