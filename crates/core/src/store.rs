//! Remote store trait definitions
//!
//! These traits define the boundary to the storage service API. The upload
//! engine is written entirely against them, which decouples it from the HTTP
//! binding and lets tests drive it with scripted fakes.

use std::path::Path;

use async_trait::async_trait;

use crate::credentials::Identity;
use crate::error::Result;

/// Metadata returned for a remote file object
#[derive(Debug, Clone)]
pub struct FileMeta {
    /// Remote object id
    pub id: String,

    /// Object name, when the service reports it
    pub name: Option<String>,
}

/// Progress reported by one chunk send
#[derive(Debug, Clone)]
pub struct ChunkProgress {
    /// Bytes the server has confirmed so far for this session
    pub bytes_confirmed: u64,

    /// Set once the final chunk is accepted and the object exists
    pub file_id: Option<String>,
}

/// One in-flight resumable transfer.
///
/// A session is bound to the credential that created it; after a credential
/// rotation a fresh session must be started from offset zero.
#[async_trait]
pub trait ResumableSession: Send {
    /// Send the next chunk and return the server-confirmed progress.
    ///
    /// A failed send must not advance the confirmed offset, so calling this
    /// again re-sends the identical byte range.
    async fn send_next_chunk(&mut self) -> Result<ChunkProgress>;
}

/// Storage service operations consumed by the upload engine
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Create a remote folder, returning its id
    async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<String>;

    /// Create a file in a single non-chunked call (zero-byte path)
    async fn create_file(
        &self,
        name: &str,
        mime_type: &str,
        parent: Option<&str>,
        data: Vec<u8>,
    ) -> Result<FileMeta>;

    /// Initiate a resumable transfer for a local file
    async fn begin_resumable(
        &self,
        path: &Path,
        name: &str,
        mime_type: &str,
        parent: Option<&str>,
        chunk_size: u64,
    ) -> Result<Box<dyn ResumableSession>>;

    /// Fetch metadata for a remote file
    async fn file_meta(&self, file_id: &str) -> Result<FileMeta>;

    /// Grant anyone-with-the-link read access
    async fn grant_public_read(&self, file_id: &str) -> Result<()>;

    /// Delete a remote file or folder tree
    async fn delete(&self, file_id: &str) -> Result<()>;

    /// Direct-download link for a file id
    fn file_link(&self, file_id: &str) -> String;

    /// Browser link for a folder id
    fn folder_link(&self, folder_id: &str) -> String;
}

/// Builds a [`RemoteStore`] for a given identity.
///
/// Credential rotation rebuilds the store under the next identity, so the
/// engine owns a connector rather than a single store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connect: Send + Sync {
    async fn connect(&self, identity: &Identity) -> Result<Box<dyn RemoteStore>>;
}
