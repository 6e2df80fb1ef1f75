//! Command-line interface for vmapi

mod commands;

use clap::{Parser, Subcommand};

/// vmapi - multi-tenant virtual machine inventory API
#[derive(Parser)]
#[command(name = "vmapi")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server (default)
    #[command(alias = "server")]
    Serve,

    /// Create the demo admin and client accounts
    Seed,

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
