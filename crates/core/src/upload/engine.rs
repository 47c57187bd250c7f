//! Upload orchestrator
//!
//! Public entry point of the engine. Decides between the single-file and
//! directory paths, runs the progress ticker for the duration of the upload,
//! and reduces every exit to a single terminal outcome.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::UploadConfig;
use crate::credentials::{CredentialPool, Identity};
use crate::error::{Error, Result};
use crate::progress::{ProgressSnapshot, ProgressTicker, UploadProgress};
use crate::retry::BackoffPolicy;
use crate::store::{Connect, RemoteStore};

use super::mirror::{MirrorOutcome, MirrorStats};

/// Progress observer callback, invoked once per update interval
pub type ProgressFn = Box<dyn Fn(ProgressSnapshot) + Send + Sync + 'static>;

/// What kind of object the upload produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadKind {
    File,
    Folder,
}

impl std::fmt::Display for UploadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadKind::File => write!(f, "File"),
            UploadKind::Folder => write!(f, "Folder"),
        }
    }
}

/// Terminal report of a completed upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    /// Shareable link to the uploaded object
    pub link: String,

    /// Total size in bytes, as supplied by the caller
    pub size: u64,

    /// Number of files uploaded (1 for a single file)
    pub files: u64,

    /// File or Folder
    pub kind: UploadKind,

    /// Name of the top-level uploaded object
    pub name: String,

    /// Completion timestamp
    pub completed_at: jiff::Timestamp,
}

/// The one-of-three terminal outcome of an upload invocation
#[derive(Debug)]
pub enum UploadOutcome {
    Completed(UploadReport),
    Cancelled,
}

/// Construction options for [`Uploader`]
pub struct UploaderOptions {
    /// Upload behavior settings
    pub config: UploadConfig,

    /// Total bytes the caller intends to upload, for progress reporting
    pub total_size: u64,

    /// Observer called once per update interval with a progress snapshot
    pub observer: Option<ProgressFn>,

    /// Alternate credential for delete re-authorization
    pub fallback: Option<Identity>,
}

/// The upload engine.
///
/// Owns the remote store for the currently selected identity; credential
/// rotation swaps the store between upload attempts, never mid-chunk. All
/// network calls for one upload are strictly sequential.
pub struct Uploader {
    connector: Box<dyn Connect>,
    store: Box<dyn RemoteStore>,
    pool: CredentialPool,
    identity: Identity,
    /// Identities used since engine construction, the initial one included
    switch_count: usize,
    pub(crate) config: UploadConfig,
    progress: Arc<UploadProgress>,
    observer: Option<ProgressFn>,
    pub(crate) backoff: BackoffPolicy,
    fallback: Option<Identity>,
    alt_auth_used: bool,
    top_folder_id: Option<String>,
    errored: bool,
}

impl Uploader {
    /// Build an engine: select a random pool identity and connect under it.
    pub async fn connect(
        connector: Box<dyn Connect>,
        pool: CredentialPool,
        options: UploaderOptions,
    ) -> Result<Self> {
        let identity = pool.select_random();
        let store = connector.connect(&identity).await?;
        let progress = Arc::new(UploadProgress::new(
            options.total_size,
            Duration::from_secs(options.config.update_interval_secs),
        ));

        Ok(Self {
            connector,
            store,
            pool,
            identity,
            switch_count: 1,
            config: options.config,
            progress,
            observer: options.observer,
            backoff: BackoffPolicy::default(),
            fallback: options.fallback,
            alt_auth_used: false,
            top_folder_id: None,
            errored: false,
        })
    }

    /// Shared progress handle, for cancellation and external polling.
    pub fn progress(&self) -> Arc<UploadProgress> {
        self.progress.clone()
    }

    /// Upload a file or directory tree and return the terminal outcome.
    ///
    /// Produced exactly once per invocation: a report, a cancellation
    /// acknowledgment, or a single normalized error.
    pub async fn upload(&mut self, path: &Path, name: &str) -> Result<UploadOutcome> {
        tracing::info!(path = %path.display(), "Uploading");

        // Dropping the guard aborts the ticker task, so the reporter stops
        // on every exit path below.
        let _ticker = self
            .observer
            .take()
            .map(|observer| ProgressTicker::spawn(self.progress.clone(), move |s| observer(s)));

        let result = self.run(path, name).await;

        match result {
            Ok(report) => {
                self.progress.mark_done();
                tracing::info!(name = %report.name, link = %report.link, "Upload complete");
                Ok(UploadOutcome::Completed(report))
            }
            Err(Error::Cancelled) => {
                if !self.errored {
                    // A partially mirrored folder tree is removed; a single
                    // file needs no cleanup because no final object was
                    // created before cancellation was observed.
                    if let Some(folder_id) = self.top_folder_id.take() {
                        tracing::info!("Deleting partially uploaded folder from remote");
                        if let Err(e) = self.store.delete(&folder_id).await {
                            tracing::warn!(error = %e, "Could not delete partial remote folder");
                        }
                    }
                }
                self.progress.mark_done();
                Ok(UploadOutcome::Cancelled)
            }
            Err(e) => {
                self.errored = true;
                self.progress.mark_done();
                Err(Error::General(e.normalized_message()))
            }
        }
    }

    async fn run(&mut self, path: &Path, name: &str) -> Result<UploadReport> {
        let size = self.progress.total_bytes();
        let dest = self.config.root_folder_id.clone();

        if path.is_file() {
            let local_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            // The filter applies to the on-disk name, so a rename cannot
            // smuggle an excluded file past it.
            if self.config.is_excluded(&local_name) || self.config.is_excluded(name) {
                return Err(Error::General(
                    "This file extension is excluded by the extension filter".into(),
                ));
            }
            let mime_type = sniff_mime(path);
            let link = self
                .upload_file(path, name, &mime_type, dest.as_deref(), true)
                .await?
                .ok_or_else(|| Error::General("Upload finished without a link".into()))?;

            Ok(UploadReport {
                link,
                size,
                files: 1,
                kind: UploadKind::File,
                name: name.to_string(),
                completed_at: jiff::Timestamp::now(),
            })
        } else {
            let folder_id = self.create_remote_folder(name, dest.as_deref()).await?;
            self.top_folder_id = Some(folder_id.clone());

            let mut stats = MirrorStats::default();
            match self.mirror(path, &folder_id, &mut stats).await? {
                MirrorOutcome::Cancelled => Err(Error::Cancelled),
                _ => Ok(UploadReport {
                    link: self.store.folder_link(&folder_id),
                    size,
                    files: stats.files,
                    kind: UploadKind::Folder,
                    name: name.to_string(),
                    completed_at: jiff::Timestamp::now(),
                }),
            }
        }
    }

    /// Create a remote folder with the backoff wrapper and apply the
    /// public-read grant unless the destination inherits permissions.
    pub(crate) async fn create_remote_folder(
        &mut self,
        name: &str,
        parent: Option<&str>,
    ) -> Result<String> {
        let store = self.store.as_ref();
        let folder_id =
            crate::retry::retry_with_backoff(&self.backoff, || store.create_folder(name, parent))
                .await?;

        if !self.config.team_drive {
            crate::retry::retry_with_backoff(&self.backoff, || {
                store.grant_public_read(&folder_id)
            })
            .await?;
        }

        tracing::info!(name = name, id = %folder_id, "Created remote folder");
        Ok(folder_id)
    }

    /// Delete a remote object by id.
    ///
    /// A not-found or permission failure triggers a one-time fallback
    /// re-authorization with the alternate credential before giving up.
    pub async fn delete_file(&mut self, file_id: &str) -> Result<()> {
        match self.store.delete(file_id).await {
            Ok(()) => {
                tracing::info!(id = file_id, "Deleted remote object");
                Ok(())
            }
            Err(e @ (Error::NotFound(_) | Error::Auth(_))) => {
                if self.alt_auth_used {
                    return Err(e);
                }
                let Some(fallback) = self.fallback.clone() else {
                    return Err(e);
                };
                self.alt_auth_used = true;
                tracing::warn!(error = %e, "Delete failed, retrying with fallback credential");
                self.store = self.connector.connect(&fallback).await?;
                self.store.delete(file_id).await
            }
            Err(e) => Err(e),
        }
    }

    /// Switch to the next pool identity and rebuild the remote store.
    ///
    /// Called only between upload attempts; an in-flight chunk never sees
    /// the identity change.
    pub(crate) async fn rotate_identity(&mut self) -> Result<()> {
        self.identity = self.pool.next_after(&self.identity);
        self.switch_count += 1;
        tracing::info!(
            index = self.identity.index,
            account = %self.identity.label,
            "Switching to next pooled credential"
        );
        self.store = self.connector.connect(&self.identity).await?;
        Ok(())
    }

    pub(crate) fn pool_exhausted(&self) -> bool {
        self.pool.exhausted(self.switch_count)
    }

    pub(crate) fn store(&self) -> &dyn RemoteStore {
        self.store.as_ref()
    }

    pub(crate) fn progress_ref(&self) -> &UploadProgress {
        &self.progress
    }
}

/// Best-effort MIME sniff from the file name.
pub(crate) fn sniff_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::testing::{fake_uploader, write_file, ChunkStep};
    use tempfile::TempDir;

    #[test]
    fn test_sniff_mime() {
        assert_eq!(sniff_mime(Path::new("a.txt")), "text/plain");
        assert_eq!(sniff_mime(Path::new("a.unknown-ext")), "application/octet-stream");
    }

    #[test]
    fn test_upload_kind_display() {
        assert_eq!(UploadKind::File.to_string(), "File");
        assert_eq!(UploadKind::Folder.to_string(), "Folder");
    }

    #[tokio::test]
    async fn test_excluded_file_is_rejected_without_network() {
        let dir = TempDir::new().unwrap();
        let file = write_file(dir.path(), "leftover.aria2c", 16);
        let (mut uploader, state, _creds) = fake_uploader(2, 16).await;

        let err = uploader.upload(&file, "leftover.aria2c").await.unwrap_err();
        assert!(err.to_string().contains("excluded by the extension filter"));

        let state = state.lock().unwrap();
        assert!(state.created_files.is_empty());
        assert_eq!(state.resumable_started, 0);
        // The rejected file is still on disk; filtering deletion applies
        // only inside directory mirroring.
        assert!(file.exists());
    }

    #[tokio::test]
    async fn test_excluded_file_rejected_even_when_renamed() {
        let dir = TempDir::new().unwrap();
        let file = write_file(dir.path(), "part.aria2c", 16);
        let (mut uploader, state, _creds) = fake_uploader(1, 16).await;

        // The remote name looks harmless; the on-disk extension decides.
        let err = uploader.upload(&file, "video.mkv").await.unwrap_err();
        assert!(err.to_string().contains("excluded by the extension filter"));
        assert_eq!(state.lock().unwrap().resumable_started, 0);
    }

    #[tokio::test]
    async fn test_cancelled_folder_upload_cleans_remote_tree() {
        let dir = TempDir::new().unwrap();
        let tree = dir.path().join("album");
        std::fs::create_dir(&tree).unwrap();
        write_file(&tree, "a.txt", 8);
        write_file(&tree, "b.txt", 8);

        let (mut uploader, state, _creds) = fake_uploader(1, 16).await;
        uploader.progress().cancel();

        let outcome = uploader.upload(&tree, "album").await.unwrap();
        assert!(matches!(outcome, UploadOutcome::Cancelled));

        let state = state.lock().unwrap();
        // The top-level folder was created, then deleted on cancellation.
        assert_eq!(state.folders.len(), 1);
        assert_eq!(state.deletes, vec![state.folders[0].id.clone()]);
        // Cooperative cancellation: no file was sent.
        assert_eq!(state.resumable_started, 0);
    }

    #[tokio::test]
    async fn test_error_is_normalized_to_plain_message() {
        let dir = TempDir::new().unwrap();
        let file = write_file(dir.path(), "data.bin", 32);

        let (mut uploader, state, _creds) = fake_uploader(1, 32).await;
        state
            .lock()
            .unwrap()
            .session_scripts
            .push_back(vec![ChunkStep::Fail(404, "<File not found>".into())]);

        let err = uploader.upload(&file, "data.bin").await.unwrap_err();
        let msg = err.to_string();
        assert!(!msg.contains('<'));
        assert!(!msg.contains('>'));
        assert!(msg.contains("File not found"));
    }

    #[tokio::test]
    async fn test_delete_file_falls_back_once() {
        let (mut uploader, state, _creds) = fake_uploader(1, 0).await;
        state.lock().unwrap().fail_next_delete = true;

        uploader.delete_file("some-id").await.unwrap();

        let state = state.lock().unwrap();
        // First delete failed with NotFound, fallback credential retried.
        assert_eq!(state.deletes, vec!["some-id".to_string()]);
        assert_eq!(state.connects.last().map(String::as_str), Some("token.json"));
    }
}
