//! CLI command implementations
//!
//! One module per top-level command; each exposes a clap `Args` or
//! `Subcommand` type with an async `execute` method taking the output
//! format and the resolved configuration file path.

pub mod auth;
pub mod config;
pub mod status;
pub mod sync;
