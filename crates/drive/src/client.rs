//! Drive v3 REST client implementation
//!
//! This module provides the DriveClient that implements the RemoteStore
//! trait using bearer-authenticated HTTP requests. Small objects go
//! through a single multipart/related create call; everything else is
//! initiated here and driven by the resumable session module.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, LOCATION};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use dsk_core::{Connect, Error, FileMeta, Identity, RemoteStore, Result, ResumableSession};

use crate::resumable::ResumableUpload;

const API_BASE: &str = "https://www.googleapis.com/drive/v3";
const UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Drive REST client bound to one bearer token
pub struct DriveClient {
    http_client: Client,
    token: String,
}

#[derive(Debug, Deserialize)]
struct FileResponse {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

impl DriveClient {
    pub fn new(token: &str) -> Result<Self> {
        let http_client = Client::builder()
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            token: token.to_string(),
        })
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// File metadata body shared by the create and initiate calls.
    fn metadata_body(name: &str, mime_type: &str, parent: Option<&str>) -> serde_json::Value {
        let mut body = json!({
            "name": name,
            "mimeType": mime_type,
        });
        if let Some(parent) = parent {
            body["parents"] = json!([parent]);
        }
        body
    }

    async fn read_error(response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        map_error(status, &body)
    }
}

/// Map an HTTP failure to an engine error.
///
/// Quota reason codes are detected before the generic authorization
/// mapping because the service reports them under HTTP 403.
pub(crate) fn map_error(status: StatusCode, body: &str) -> Error {
    if let Some(reason) = error_reason(body) {
        if let Some(quota) = Error::quota_from_reason(&reason) {
            return quota;
        }
    }

    match status {
        StatusCode::NOT_FOUND => Error::NotFound(body.to_string()),
        StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => Error::Auth(body.to_string()),
        _ => Error::Server {
            status: status.as_u16(),
            message: body.to_string(),
        },
    }
}

/// First reason code in a Drive error body, if the body parses at all.
pub(crate) fn error_reason(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("errors")?
        .get(0)?
        .get("reason")?
        .as_str()
        .map(|s| s.to_string())
}

#[async_trait]
impl RemoteStore for DriveClient {
    async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<String> {
        let url = format!("{API_BASE}/files?supportsAllDrives=true");
        let body = Self::metadata_body(name, FOLDER_MIME_TYPE, parent);

        let response = self
            .http_client
            .post(&url)
            .header(AUTHORIZATION, self.bearer())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        let created: FileResponse = response
            .json()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response: {e}")))?;
        Ok(created.id)
    }

    async fn create_file(
        &self,
        name: &str,
        mime_type: &str,
        parent: Option<&str>,
        data: Vec<u8>,
    ) -> Result<FileMeta> {
        let url = format!("{UPLOAD_BASE}/files?uploadType=multipart&supportsAllDrives=true");
        let metadata = Self::metadata_body(name, mime_type, parent);
        let body = multipart_related(&metadata, mime_type, &data)?;

        let response = self
            .http_client
            .post(&url)
            .header(AUTHORIZATION, self.bearer())
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        let created: FileResponse = response
            .json()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response: {e}")))?;
        Ok(FileMeta {
            id: created.id,
            name: created.name,
        })
    }

    async fn begin_resumable(
        &self,
        path: &Path,
        name: &str,
        mime_type: &str,
        parent: Option<&str>,
        chunk_size: u64,
    ) -> Result<Box<dyn ResumableSession>> {
        let total = tokio::fs::metadata(path).await?.len();
        let url = format!("{UPLOAD_BASE}/files?uploadType=resumable&supportsAllDrives=true");
        let body = Self::metadata_body(name, mime_type, parent);

        let response = self
            .http_client
            .post(&url)
            .header(AUTHORIZATION, self.bearer())
            .header("X-Upload-Content-Type", mime_type)
            .header("X-Upload-Content-Length", total)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        let session_url = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                Error::Network("Resumable initiation returned no session URL".to_string())
            })?;

        tracing::debug!(name = name, total = total, "Initiated resumable session");

        Ok(Box::new(ResumableUpload::open(
            self.http_client.clone(),
            self.bearer(),
            session_url,
            path,
            total,
            chunk_size,
        )
        .await?))
    }

    async fn file_meta(&self, file_id: &str) -> Result<FileMeta> {
        let url = format!(
            "{API_BASE}/files/{}?supportsAllDrives=true&fields=id,name",
            urlencoding::encode(file_id)
        );

        let response = self
            .http_client
            .get(&url)
            .header(AUTHORIZATION, self.bearer())
            .send()
            .await
            .map_err(|e| Error::Network(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        let meta: FileResponse = response
            .json()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response: {e}")))?;
        Ok(FileMeta {
            id: meta.id,
            name: meta.name,
        })
    }

    async fn grant_public_read(&self, file_id: &str) -> Result<()> {
        let url = format!(
            "{API_BASE}/files/{}/permissions?supportsAllDrives=true",
            urlencoding::encode(file_id)
        );
        let body = json!({
            "role": "reader",
            "type": "anyone",
        });

        let response = self
            .http_client
            .post(&url)
            .header(AUTHORIZATION, self.bearer())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }
        Ok(())
    }

    async fn delete(&self, file_id: &str) -> Result<()> {
        let url = format!(
            "{API_BASE}/files/{}?supportsAllDrives=true",
            urlencoding::encode(file_id)
        );

        let response = self
            .http_client
            .delete(&url)
            .header(AUTHORIZATION, self.bearer())
            .send()
            .await
            .map_err(|e| Error::Network(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }
        Ok(())
    }

    fn file_link(&self, file_id: &str) -> String {
        format!("https://drive.google.com/uc?id={file_id}&export=download")
    }

    fn folder_link(&self, folder_id: &str) -> String {
        format!("https://drive.google.com/drive/folders/{folder_id}")
    }
}

const MULTIPART_BOUNDARY: &str = "dsk_upload_boundary";

/// Assemble a multipart/related body: metadata JSON part followed by the
/// raw media part.
fn multipart_related(
    metadata: &serde_json::Value,
    mime_type: &str,
    data: &[u8],
) -> Result<Vec<u8>> {
    let metadata_json = serde_json::to_vec(metadata).map_err(Error::Json)?;

    let mut body = Vec::with_capacity(metadata_json.len() + data.len() + 256);
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(&metadata_json);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    Ok(body)
}

/// Connector that builds a [`DriveClient`] for a pool identity.
pub struct DriveConnector;

#[async_trait]
impl Connect for DriveConnector {
    async fn connect(&self, identity: &Identity) -> Result<Box<dyn RemoteStore>> {
        tracing::debug!(account = %identity.label, "Building Drive client");
        let client = DriveClient::new(&identity.credential.access_token)?;
        Ok(Box::new(client))
    }
}

/// Server-confirmed byte count from a 308 `Range` header value such as
/// `bytes=0-1048575`. Absent or malformed means nothing was persisted.
pub(crate) fn confirmed_from_range(range: Option<&str>) -> u64 {
    let Some(range) = range else { return 0 };
    range
        .strip_prefix("bytes=0-")
        .and_then(|end| end.parse::<u64>().ok())
        .map(|end| end + 1)
        .unwrap_or(0)
}
