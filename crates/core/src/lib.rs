//! dsk-core: Core library for the dsk upload client
//!
//! This crate provides the core functionality for the dsk CLI, including:
//! - Configuration management
//! - Credential pool loading and rotation
//! - The chunked resumable upload engine and directory mirroring
//! - Progress accounting and the periodic progress ticker
//! - RemoteStore trait for storage-service operations
//!
//! This crate is designed to be independent of any specific storage API
//! binding, allowing for easy testing and potential future support for
//! other backends.

pub mod config;
pub mod credentials;
pub mod error;
pub mod progress;
pub mod retry;
pub mod store;
pub mod upload;

pub use config::{Config, ConfigManager, UploadConfig};
pub use credentials::{CredentialPool, Identity, StoredCredential};
pub use error::{Error, Result};
pub use progress::{ProgressSnapshot, ProgressTicker, UploadProgress};
pub use store::{ChunkProgress, Connect, FileMeta, RemoteStore, ResumableSession};
pub use upload::{
    ProgressFn, UploadKind, UploadOutcome, UploadReport, Uploader, UploaderOptions,
};
