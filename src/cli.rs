//! Command-line interface, built on clap.
//!
//! Defines the [`Cli`] struct with subcommands [`Command`] (demo,
//! check-config) and the global `--verbose` flag.

use clap::{Parser, Subcommand};

/// checkgate — control-list approval workflow and notification dispatch.
#[derive(Debug, Parser)]
#[command(name = "checkgate", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose (debug-level) logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the built-in end-to-end workflow demonstration.
    Demo,

    /// Load and print the effective configuration.
    CheckConfig {
        /// Path to the configuration file.
        #[arg(long, default_value = "checkgate.toml")]
        file: String,
    },
}
