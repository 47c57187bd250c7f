//! Directory mirror engine
//!
//! Recreates a local directory tree as remote folders, depth-first, in the
//! order the local filesystem returns entries. Counters travel in an
//! explicit accumulator merged up the recursion, so their ownership is
//! unambiguous.

use std::path::Path;

use crate::error::{Error, Result};

use super::engine::{sniff_mime, Uploader};

/// Per-walk aggregate totals
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MirrorStats {
    /// Files uploaded
    pub files: u64,

    /// Remote folders created below the top-level one
    pub folders: u64,
}

/// Result of mirroring one directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorOutcome {
    /// At least the destination exists remotely; carries the last
    /// destination id produced
    Uploaded(String),

    /// The directory contained only filtered artifacts, nothing uploaded
    Filtered,

    /// Cancelled mid-walk; the partially mirrored tree is left as-is for
    /// the orchestrator to clean up
    Cancelled,
}

impl Uploader {
    /// Mirror `dir` into the remote folder `dest_id`.
    ///
    /// The caller has already created the remote folder for `dir` itself;
    /// an empty directory therefore still exists remotely and returns the
    /// destination id unchanged.
    pub(crate) async fn mirror(
        &mut self,
        dir: &Path,
        dest_id: &str,
        stats: &mut MirrorStats,
    ) -> Result<MirrorOutcome> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            entries.push(entry?);
        }

        if entries.is_empty() {
            return Ok(MirrorOutcome::Uploaded(dest_id.to_string()));
        }

        let mut outcome = MirrorOutcome::Filtered;

        for entry in entries {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();

            if path.is_dir() {
                let sub_id = self.create_remote_folder(&name, Some(dest_id)).await?;
                let sub = Box::pin(self.mirror(&path, &sub_id, stats)).await?;
                stats.folders += 1;
                if sub == MirrorOutcome::Cancelled {
                    return Ok(MirrorOutcome::Cancelled);
                }
                outcome = sub;
            } else if self.config.is_excluded(&name) {
                // Leftover partial-download artifacts are dropped locally,
                // never uploaded.
                tracing::debug!(path = %path.display(), "Removing filtered artifact");
                std::fs::remove_file(&path)?;
                outcome = MirrorOutcome::Filtered;
            } else {
                let mime_type = sniff_mime(&path);
                match self
                    .upload_file(&path, &name, &mime_type, Some(dest_id), false)
                    .await
                {
                    Ok(_) => {
                        stats.files += 1;
                        outcome = MirrorOutcome::Uploaded(dest_id.to_string());
                    }
                    Err(Error::Cancelled) => return Ok(MirrorOutcome::Cancelled),
                    Err(e) => return Err(e),
                }
            }

            if self.progress_ref().is_cancelled() {
                return Ok(MirrorOutcome::Cancelled);
            }
        }

        Ok(outcome)
    }
}
