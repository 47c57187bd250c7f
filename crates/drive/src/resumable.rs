//! Resumable session chunk transport
//!
//! One ResumableUpload drives one session URL. Each call sends the chunk
//! at the current offset with a `Content-Range` header; the server
//! answers 308 with the confirmed range while the transfer is in flight
//! and 200/201 with the file body once the last byte lands. The offset
//! only moves on a server acknowledgment, so a failed send re-reads and
//! re-sends the same byte range.

use std::io::SeekFrom;
use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_RANGE, RANGE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use dsk_core::{ChunkProgress, Error, Result, ResumableSession};

use crate::client::{confirmed_from_range, map_error};

pub(crate) struct ResumableUpload {
    http_client: Client,
    bearer: String,
    session_url: String,
    file: File,
    offset: u64,
    total: u64,
    chunk_size: u64,
}

#[derive(Debug, Deserialize)]
struct CompletedFile {
    id: String,
}

impl ResumableUpload {
    pub(crate) async fn open(
        http_client: Client,
        bearer: String,
        session_url: String,
        path: &Path,
        total: u64,
        chunk_size: u64,
    ) -> Result<Self> {
        let file = File::open(path).await?;
        Ok(Self {
            http_client,
            bearer,
            session_url,
            file,
            offset: 0,
            total,
            chunk_size,
        })
    }

    /// Range header for the chunk starting at `offset`, and its length.
    fn next_range(&self) -> (String, u64) {
        let end = (self.offset + self.chunk_size).min(self.total);
        let header = format!("bytes {}-{}/{}", self.offset, end - 1, self.total);
        (header, end - self.offset)
    }
}

#[async_trait]
impl ResumableSession for ResumableUpload {
    async fn send_next_chunk(&mut self) -> Result<ChunkProgress> {
        let (content_range, len) = self.next_range();

        // Seek every time: a retried chunk re-reads the same range.
        self.file.seek(SeekFrom::Start(self.offset)).await?;
        let mut buf = vec![0u8; len as usize];
        self.file.read_exact(&mut buf).await?;

        let response = self
            .http_client
            .put(&self.session_url)
            .header(AUTHORIZATION, self.bearer.clone())
            .header(CONTENT_LENGTH, len)
            .header(CONTENT_RANGE, content_range)
            .body(buf)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Chunk send failed: {e}")))?;

        match response.status() {
            // 308: the server persisted some prefix of the upload.
            StatusCode::PERMANENT_REDIRECT => {
                let confirmed = confirmed_from_range(
                    response
                        .headers()
                        .get(RANGE)
                        .and_then(|v| v.to_str().ok()),
                );
                self.offset = confirmed;
                Ok(ChunkProgress {
                    bytes_confirmed: confirmed,
                    file_id: None,
                })
            }
            StatusCode::OK | StatusCode::CREATED => {
                let completed: CompletedFile = response
                    .json()
                    .await
                    .map_err(|e| Error::Network(format!("Failed to read response: {e}")))?;
                self.offset = self.total;
                Ok(ChunkProgress {
                    bytes_confirmed: self.total,
                    file_id: Some(completed.id),
                })
            }
            status => {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                Err(map_error(status, &body))
            }
        }
    }
}
