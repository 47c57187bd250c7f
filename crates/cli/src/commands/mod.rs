//! CLI command definitions and execution
//!
//! This module contains all CLI commands and their implementations.
//! Commands are organized by functionality and share the credential and
//! configuration loading in the context module.

use clap::{Parser, Subcommand};

use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

mod accounts;
mod completions;
mod context;
mod rm;
pub mod upload;

/// dsk - Resumable upload client
///
/// Uploads files and directory trees to a quota-limited object storage
/// service with chunked resumable transfers and pooled credential rotation.
#[derive(Parser, Debug)]
#[command(name = "dsk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a file or directory tree
    Upload(upload::UploadArgs),

    /// Remove remote objects by shareable link
    Rm(rm::RmArgs),

    /// List the loaded credential pool
    Accounts(accounts::AccountsArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Upload(args) => upload::execute(args, output_config).await,
        Commands::Rm(args) => rm::execute(args, output_config).await,
        Commands::Accounts(args) => accounts::execute(args, output_config).await,
        Commands::Completions(args) => completions::execute(args),
    }
}
