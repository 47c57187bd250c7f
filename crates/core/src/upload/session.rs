//! Per-file transfer bookkeeping

use std::path::PathBuf;

/// State of one in-flight chunked transfer.
///
/// Owned exclusively by the state machine driving it; destroyed when the
/// transfer terminates. `bytes_sent` tracks the server-confirmed offset and
/// is monotonically non-decreasing for the lifetime of the session.
#[derive(Debug)]
pub struct TransferSession {
    /// Local source file
    pub file_path: PathBuf,

    /// Name of the remote object being created
    pub name: String,

    /// Destination folder id (None uploads to the root)
    pub dest_folder_id: Option<String>,

    /// Sniffed MIME type
    pub mime_type: String,

    /// Server-confirmed bytes so far
    pub bytes_sent: u64,

    /// Retry count for the chunk currently being sent
    pub retries: u32,
}

impl TransferSession {
    pub fn new(
        file_path: impl Into<PathBuf>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        dest_folder_id: Option<&str>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            name: name.into(),
            dest_folder_id: dest_folder_id.map(|s| s.to_string()),
            mime_type: mime_type.into(),
            bytes_sent: 0,
            retries: 0,
        }
    }

    /// Record a server-confirmed offset and return the newly confirmed
    /// delta. Offsets never regress; a stale or repeated confirmation
    /// contributes zero.
    pub fn record_confirmed(&mut self, confirmed: u64) -> u64 {
        if confirmed <= self.bytes_sent {
            return 0;
        }
        let delta = confirmed - self.bytes_sent;
        self.bytes_sent = confirmed;
        delta
    }

    /// A chunk was confirmed; the next chunk starts with a fresh retry
    /// budget.
    pub fn chunk_confirmed(&mut self) {
        self.retries = 0;
    }
}
