//! upload command - Upload a file or directory tree
//!
//! Uploads the given path with chunked resumable transfers, mirroring
//! directory trees folder by folder. Progress is reported live and
//! Ctrl+C cancels cooperatively at the next chunk boundary.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use humansize::{format_size, DECIMAL};

use dsk_core::{UploadOutcome, Uploader, UploaderOptions};
use dsk_drive::DriveConnector;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

use super::context::CliContext;

/// Upload a file or directory tree
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Local file or directory to upload
    pub path: PathBuf,

    /// Remote name (defaults to the local file name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Destination folder id (overrides the configured root folder)
    #[arg(short, long)]
    pub dest: Option<String>,

    /// Treat the destination as a shared drive (skips the public-read grant)
    #[arg(long)]
    pub team_drive: bool,
}

/// Execute the upload command
pub async fn execute(args: UploadArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    if !args.path.exists() {
        formatter.error(&format!("Path does not exist: {}", args.path.display()));
        return ExitCode::UsageError;
    }

    let name = match remote_name(&args) {
        Ok(name) => name,
        Err(message) => {
            formatter.error(&message);
            return ExitCode::UsageError;
        }
    };

    let context = match CliContext::load() {
        Ok(context) => context,
        Err(e) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let mut config = context.config.upload.clone();
    if args.dest.is_some() {
        config.root_folder_id = args.dest.clone();
    }
    if args.team_drive {
        config.team_drive = true;
    }

    let total_size = match local_size(&args.path) {
        Ok(size) => size,
        Err(e) => {
            formatter.error(&format!("Failed to measure {}: {e}", args.path.display()));
            return ExitCode::GeneralError;
        }
    };

    let bar = Arc::new(ProgressBar::new(output_config, total_size));
    let observer: dsk_core::ProgressFn = {
        let bar = bar.clone();
        Box::new(move |snapshot| {
            bar.set_position(snapshot.processed_bytes);
        })
    };

    let options = UploaderOptions {
        config,
        total_size,
        observer: Some(observer),
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

    // Ctrl+C requests cooperative cancellation; the engine stops at the
    // next chunk boundary and cleans up partial remote state.
    let ctrl_c = {
        let progress = uploader.progress();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                progress.cancel();
            }
        })
    };

    let result = uploader.upload(&args.path, &name).await;
    ctrl_c.abort();
    bar.finish_and_clear();

    match result {
        Ok(UploadOutcome::Completed(report)) => {
            if formatter.is_json() {
                formatter.json(&report);
            } else {
                formatter.success(&format!(
                    "Uploaded {} ({}, {}, {} file(s))",
                    report.name,
                    report.kind,
                    format_size(report.size, DECIMAL),
                    report.files
                ));
                formatter.println(&report.link);
            }
            ExitCode::Success
        }
        Ok(UploadOutcome::Cancelled) => {
            formatter.warning("Upload cancelled");
            ExitCode::Interrupted
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from_error(&e)
        }
    }
}

/// Remote name: explicit override or the local file name.
fn remote_name(args: &UploadArgs) -> Result<String, String> {
    if let Some(name) = &args.name {
        if name.is_empty() {
            return Err("Remote name cannot be empty".to_string());
        }
        return Ok(name.clone());
    }
    args.path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| format!("Cannot derive a name from {}", args.path.display()))
}

/// Total byte size of a file or directory tree.
fn local_size(path: &Path) -> std::io::Result<u64> {
    let metadata = std::fs::metadata(path)?;
    if metadata.is_file() {
        return Ok(metadata.len());
    }

    let mut total = 0;
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        total += local_size(&entry.path())?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_size_single_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.bin");
        std::fs::write(&path, vec![0u8; 123]).unwrap();
        assert_eq!(local_size(&path).unwrap(), 123);
    }

    #[test]
    fn test_local_size_directory_tree() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.bin"), vec![0u8; 10]).unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("b.bin"), vec![0u8; 32]).unwrap();
        assert_eq!(local_size(dir.path()).unwrap(), 42);
    }

    #[test]
    fn test_remote_name_from_path() {
        let args = UploadArgs {
            path: PathBuf::from("/tmp/video.mkv"),
            name: None,
            dest: None,
            team_drive: false,
        };
        assert_eq!(remote_name(&args).unwrap(), "video.mkv");
    }

    #[test]
    fn test_remote_name_override() {
        let args = UploadArgs {
            path: PathBuf::from("/tmp/video.mkv"),
            name: Some("renamed.mkv".to_string()),
            dest: None,
            team_drive: false,
        };
        assert_eq!(remote_name(&args).unwrap(), "renamed.mkv");
    }

    #[test]
    fn test_remote_name_empty_override_rejected() {
        let args = UploadArgs {
            path: PathBuf::from("/tmp/video.mkv"),
            name: Some(String::new()),
            dest: None,
            team_drive: false,
        };
        assert!(remote_name(&args).is_err());
    }
}
