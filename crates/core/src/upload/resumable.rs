//! Single-file chunked transfer state machine
//!
//! Drives one file to completion through the resumable protocol: initiate a
//! session, send chunks strictly in order, retry transient server faults on
//! the same byte range, and rotate to the next pooled credential on quota
//! errors. A rotation always starts a fresh session from offset zero because
//! a resumable session is bound to the identity that created it.

use std::path::Path;

use crate::error::{Error, Result};
use crate::retry::retry_with_backoff;

use super::engine::Uploader;
use super::session::TransferSession;

/// Retries allowed per chunk for HTTP {500, 502, 503, 504}
pub(crate) const MAX_CHUNK_RETRIES: u32 = 10;

impl Uploader {
    /// Upload one file and return its direct-download link when requested.
    ///
    /// Directory members skip the final metadata fetch (`want_link` false)
    /// since the mirror result links to the enclosing folder instead.
    pub(crate) async fn upload_file(
        &mut self,
        path: &Path,
        name: &str,
        mime_type: &str,
        dest: Option<&str>,
        want_link: bool,
    ) -> Result<Option<String>> {
        if self.progress_ref().is_cancelled() {
            return Err(Error::Cancelled);
        }

        let size = std::fs::metadata(path)?.len();

        let file_id = if size == 0 {
            self.upload_empty(path, name, mime_type, dest).await?
        } else {
            // Quota failover is an explicit bounded loop: one attempt per
            // identity, at most pool-size identities per cycle.
            loop {
                match self.upload_resumable_once(path, name, mime_type, dest).await {
                    Ok(file_id) => break file_id,
                    Err(e) if e.is_quota() && self.config.use_account_pool => {
                        if self.progress_ref().is_cancelled() {
                            return Err(Error::Cancelled);
                        }
                        if self.pool_exhausted() {
                            tracing::warn!(
                                error = %e,
                                "Every pooled credential has been tried, giving up"
                            );
                            return Err(e);
                        }
                        tracing::info!(error = %e, "Quota exhausted, rotating credential");
                        self.rotate_identity().await?;
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        // Best-effort removal of the local source; a failure here must not
        // fail the otherwise-successful upload.
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "Could not remove local source");
        }

        if !self.config.team_drive {
            let store = self.store();
            retry_with_backoff(&self.backoff, || store.grant_public_read(&file_id)).await?;
        }

        if want_link {
            let meta = self.store().file_meta(&file_id).await?;
            Ok(Some(self.store().file_link(&meta.id)))
        } else {
            Ok(None)
        }
    }

    /// Zero-byte path: a single non-chunked create call.
    async fn upload_empty(
        &mut self,
        path: &Path,
        name: &str,
        mime_type: &str,
        dest: Option<&str>,
    ) -> Result<String> {
        let data = tokio::fs::read(path).await?;
        let store = self.store();
        let meta = retry_with_backoff(&self.backoff, || {
            store.create_file(name, mime_type, dest, data.clone())
        })
        .await?;
        Ok(meta.id)
    }

    /// One full resumable attempt under the current identity.
    async fn upload_resumable_once(
        &mut self,
        path: &Path,
        name: &str,
        mime_type: &str,
        dest: Option<&str>,
    ) -> Result<String> {
        let mut state = TransferSession::new(path, name, mime_type, dest);
        let mut session = self
            .store()
            .begin_resumable(path, name, mime_type, dest, self.config.chunk_size)
            .await?;

        loop {
            if self.progress_ref().is_cancelled() {
                return Err(Error::Cancelled);
            }

            match session.send_next_chunk().await {
                Ok(chunk) => {
                    let delta = state.record_confirmed(chunk.bytes_confirmed);
                    self.progress_ref().add_bytes(delta);
                    state.chunk_confirmed();

                    if let Some(file_id) = chunk.file_id {
                        // Cancellation raced the final chunk: the remote
                        // object exists but the caller asked us to stop.
                        // Acknowledged limitation, surfaced as cancelled.
                        if self.progress_ref().is_cancelled() {
                            return Err(Error::Cancelled);
                        }
                        return Ok(file_id);
                    }
                }
                Err(e) if e.is_transient_server() && state.retries < MAX_CHUNK_RETRIES => {
                    state.retries += 1;
                    tracing::debug!(
                        retry = state.retries,
                        offset = state.bytes_sent,
                        error = %e,
                        "Transient chunk failure, re-sending same range"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }
}
