//! rm command - Remove remote objects
//!
//! Removes one or more remote objects identified by their shareable
//! links. A permission or not-found failure is retried once under the
//! fallback credential before it counts as failed.

use clap::Args;
use serde::Serialize;

use dsk_core::{Uploader, UploaderOptions};
use dsk_drive::{id_from_link, DriveConnector};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::context::CliContext;

/// Remove remote objects by shareable link
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Shareable link(s) of the objects to remove
    #[arg(required = true)]
    pub links: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    status: &'static str,
    deleted: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed: Option<Vec<String>>,
    total: usize,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let context = match CliContext::load() {
        Ok(context) => context,
        Err(e) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let options = UploaderOptions {
        config: context.config.upload.clone(),
        total_size: 0,
        observer: None,
        fallback: context.fallback,
    };

    let mut uploader =
        match Uploader::connect(Box::new(DriveConnector), context.pool, options).await {
            Ok(uploader) => uploader,
            Err(e) => {
                formatter.error(&format!("Failed to authorize: {e}"));
                return ExitCode::from_error(&e);
            }
        };

    let mut deleted = Vec::new();
    let mut failed = Vec::new();

    for link in &args.links {
        let file_id = match id_from_link(link) {
            Ok(id) => id,
            Err(e) => {
                formatter.error(&e.to_string());
                failed.push(link.clone());
                continue;
            }
        };

        match uploader.delete_file(&file_id).await {
            Ok(()) => {
                if !formatter.is_json() {
                    formatter.println(&format!("Removed: {file_id}"));
                }
                deleted.push(file_id);
            }
            Err(e) => {
                formatter.error(&format!("Failed to remove {file_id}: {e}"));
                failed.push(link.clone());
            }
        }
    }

    let has_error = !failed.is_empty();

    if formatter.is_json() {
        let output = RmOutput {
            status: if has_error { "partial" } else { "success" },
            total: deleted.len(),
            deleted,
            failed: if has_error { Some(failed) } else { None },
        };
        formatter.json(&output);
    } else if !has_error {
        formatter.success(&format!("Removed {} object(s).", deleted.len()));
    }

    if has_error {
        ExitCode::GeneralError
    } else {
        ExitCode::Success
    }
}
