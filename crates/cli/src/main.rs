//! dsk - Resumable upload client
//!
//! A command-line interface for chunked resumable uploads to a
//! quota-limited object storage service, with pooled credential
//! rotation and directory mirroring.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod exit_code;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber for logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let exit_code = commands::execute(cli).await;

    std::process::exit(exit_code.as_i32());
}
