//! Scripted in-memory remote store for engine tests

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::UploadConfig;
use crate::credentials::{CredentialPool, Identity};
use crate::error::{Error, Result};
use crate::store::{ChunkProgress, Connect, FileMeta, RemoteStore, ResumableSession};
use crate::upload::engine::{Uploader, UploaderOptions};

/// Behavior of one scripted chunk send
#[derive(Debug, Clone)]
pub(crate) enum ChunkStep {
    /// Confirm the next chunk normally
    Ok,
    /// Fail with an HTTP status (transient for 5xx)
    Http(u16),
    /// Fail with a quota reason code
    Quota(&'static str),
    /// Fail with an arbitrary status and message
    Fail(u16, String),
}

#[derive(Debug, Clone)]
pub(crate) struct FolderRec {
    pub id: String,
    #[allow(dead_code)]
    pub name: String,
    #[allow(dead_code)]
    pub parent: Option<String>,
}

/// Shared observable state behind every fake store and session
#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub folders: Vec<FolderRec>,
    pub created_files: Vec<String>,
    pub upload_names: Vec<String>,
    pub grants: Vec<String>,
    pub deletes: Vec<String>,
    pub meta_calls: Vec<String>,
    pub connects: Vec<String>,
    pub resumable_started: u32,
    /// Offset at the start of every chunk send, in order
    pub sends: Vec<u64>,
    /// Highest server-confirmed offset across all sessions
    pub confirmed_high_water: u64,
    /// One script per future session, consumed in order; empty script
    /// means every chunk succeeds
    pub session_scripts: VecDeque<Vec<ChunkStep>>,
    /// Pretend the source file has this many bytes
    pub total_override: Option<u64>,
    /// Override the chunk size the engine asked for
    pub chunk_size_override: Option<u64>,
    /// Make the next delete fail with NotFound
    pub fail_next_delete: bool,
    next_id: u32,
}

impl FakeState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

pub(crate) struct FakeStore {
    state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl RemoteStore for FakeStore {
    async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("folder");
        state.folders.push(FolderRec {
            id: id.clone(),
            name: name.to_string(),
            parent: parent.map(|p| p.to_string()),
        });
        Ok(id)
    }

    async fn create_file(
        &self,
        name: &str,
        _mime_type: &str,
        _parent: Option<&str>,
        _data: Vec<u8>,
    ) -> Result<FileMeta> {
        let mut state = self.state.lock().unwrap();
        state.created_files.push(name.to_string());
        let id = state.next_id("file");
        Ok(FileMeta {
            id,
            name: Some(name.to_string()),
        })
    }

    async fn begin_resumable(
        &self,
        path: &Path,
        name: &str,
        _mime_type: &str,
        _parent: Option<&str>,
        chunk_size: u64,
    ) -> Result<Box<dyn ResumableSession>> {
        let mut state = self.state.lock().unwrap();
        state.resumable_started += 1;
        state.upload_names.push(name.to_string());

        let total = match state.total_override {
            Some(t) => t,
            None => std::fs::metadata(path)?.len(),
        };
        let chunk_size = state.chunk_size_override.unwrap_or(chunk_size);
        let script = state.session_scripts.pop_front().unwrap_or_default();

        Ok(Box::new(FakeSession {
            state: self.state.clone(),
            offset: 0,
            total,
            chunk_size,
            script: script.into(),
        }))
    }

    async fn file_meta(&self, file_id: &str) -> Result<FileMeta> {
        let mut state = self.state.lock().unwrap();
        state.meta_calls.push(file_id.to_string());
        Ok(FileMeta {
            id: file_id.to_string(),
            name: None,
        })
    }

    async fn grant_public_read(&self, file_id: &str) -> Result<()> {
        self.state.lock().unwrap().grants.push(file_id.to_string());
        Ok(())
    }

    async fn delete(&self, file_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_next_delete {
            state.fail_next_delete = false;
            return Err(Error::NotFound(format!("File not found: {file_id}")));
        }
        state.deletes.push(file_id.to_string());
        Ok(())
    }

    fn file_link(&self, file_id: &str) -> String {
        format!("https://drive.example.com/uc?id={file_id}&export=download")
    }

    fn folder_link(&self, folder_id: &str) -> String {
        format!("https://drive.example.com/drive/folders/{folder_id}")
    }
}

struct FakeSession {
    state: Arc<Mutex<FakeState>>,
    offset: u64,
    total: u64,
    chunk_size: u64,
    script: VecDeque<ChunkStep>,
}

#[async_trait]
impl ResumableSession for FakeSession {
    async fn send_next_chunk(&mut self) -> Result<ChunkProgress> {
        let mut state = self.state.lock().unwrap();
        state.sends.push(self.offset);

        match self.script.pop_front().unwrap_or(ChunkStep::Ok) {
            ChunkStep::Ok => {
                let sent = self.chunk_size.min(self.total - self.offset);
                self.offset += sent;
                state.confirmed_high_water = state.confirmed_high_water.max(self.offset);
                let file_id = if self.offset >= self.total {
                    Some(state.next_id("file"))
                } else {
                    None
                };
                Ok(ChunkProgress {
                    bytes_confirmed: self.offset,
                    file_id,
                })
            }
            ChunkStep::Http(status) => Err(Error::Server {
                status,
                message: "scripted server fault".into(),
            }),
            ChunkStep::Quota(reason) => Err(Error::Quota {
                reason: reason.to_string(),
            }),
            ChunkStep::Fail(status, message) => Err(Error::Server { status, message }),
        }
    }
}

pub(crate) struct FakeConnector {
    state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl Connect for FakeConnector {
    async fn connect(&self, identity: &Identity) -> Result<Box<dyn RemoteStore>> {
        self.state
            .lock()
            .unwrap()
            .connects
            .push(identity.label.clone());
        Ok(Box::new(FakeStore {
            state: self.state.clone(),
        }))
    }
}

/// Write a file of `size` zero bytes and return its path.
pub(crate) fn write_file(dir: &Path, name: &str, size: usize) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, vec![0u8; size]).unwrap();
    path
}

/// Build an engine over a scripted fake store with a pool of `pool_size`
/// on-disk credentials plus a fallback token.
pub(crate) async fn fake_uploader(
    pool_size: usize,
    total_size: u64,
) -> (Uploader, Arc<Mutex<FakeState>>, tempfile::TempDir) {
    let creds = tempfile::TempDir::new().unwrap();
    let accounts = creds.path().join("accounts");
    std::fs::create_dir(&accounts).unwrap();
    for i in 0..pool_size {
        std::fs::write(
            accounts.join(format!("sa-{i:02}.json")),
            format!(r#"{{"access_token": "token-{i}"}}"#),
        )
        .unwrap();
    }
    std::fs::write(
        creds.path().join("token.json"),
        r#"{"access_token": "fallback-token"}"#,
    )
    .unwrap();

    let pool = CredentialPool::load(&accounts).unwrap();
    let fallback = CredentialPool::fallback(&creds.path().join("token.json")).unwrap();

    let state = Arc::new(Mutex::new(FakeState::default()));
    let connector = Box::new(FakeConnector {
        state: state.clone(),
    });

    let uploader = Uploader::connect(
        connector,
        pool,
        UploaderOptions {
            config: UploadConfig::default(),
            total_size,
            observer: None,
            fallback: Some(fallback),
        },
    )
    .await
    .unwrap();

    (uploader, state, creds)
}
