//! Credential pool management
//!
//! Pooled credentials spread API usage across multiple quota buckets. Each
//! pool entry is a JSON file carrying opaque bearer material; the pool is
//! loaded once at startup and never mutated afterwards. A single fallback
//! credential (token.json) serves as the alternate identity for delete
//! re-authorization.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Bearer material loaded from a credential file.
///
/// Token acquisition is out of scope; files are expected to carry a valid
/// access token already.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredCredential {
    /// OAuth bearer token presented on every API call
    pub access_token: String,

    /// Account email, informational only
    #[serde(default)]
    pub account_email: Option<String>,
}

/// One identity in the pool: credential material plus its pool position.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Position in the loaded pool
    pub index: usize,

    /// Source file name, used for logging
    pub label: String,

    /// The loaded bearer material
    pub credential: StoredCredential,
}

/// An immutable, ordered set of interchangeable identities.
#[derive(Debug)]
pub struct CredentialPool {
    identities: Vec<Identity>,
}

impl CredentialPool {
    /// Load every `*.json` credential file under `dir`, in directory order.
    ///
    /// Fails with a configuration error when no credential file can be
    /// loaded; callers that have a fallback single credential should use
    /// [`CredentialPool::fallback`] instead of the pool.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut identities = Vec::new();

        let entries = std::fs::read_dir(dir).map_err(|e| {
            Error::Config(format!("Cannot read accounts directory {}: {e}", dir.display()))
        })?;

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                let credential = Self::read_credential(&path)?;
                let label = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                identities.push(Identity {
                    index: identities.len(),
                    label,
                    credential,
                });
            }
        }

        if identities.is_empty() {
            return Err(Error::Config(format!(
                "No credential files found in {}",
                dir.display()
            )));
        }

        tracing::info!(count = identities.len(), "Loaded credential pool");
        Ok(Self { identities })
    }

    /// Pool containing just one identity, for single-credential setups.
    pub fn single(identity: Identity) -> Self {
        let mut identity = identity;
        identity.index = 0;
        Self {
            identities: vec![identity],
        }
    }

    /// Load the single fallback credential used for delete re-authorization.
    pub fn fallback(path: &Path) -> Result<Identity> {
        let credential = Self::read_credential(path)?;
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Identity {
            index: 0,
            label,
            credential,
        })
    }

    fn read_credential(path: &Path) -> Result<StoredCredential> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid credential file {}: {e}", path.display())))
    }

    /// Number of identities in the pool
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    /// Whether the pool is empty (never true for a loaded pool)
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// All identities, in pool order
    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    /// Pick one identity uniformly at random.
    ///
    /// This is a load-balancing heuristic so independent processes do not
    /// all start from the same quota bucket; it is not a security property.
    pub fn select_random(&self) -> Identity {
        let index = entropy_nanos() as usize % self.identities.len();
        let identity = self.identities[index].clone();
        tracing::info!(account = %identity.label, "Authorizing with pooled credential");
        identity
    }

    /// The identity after `current`, wrapping to the start of the pool.
    pub fn next_after(&self, current: &Identity) -> Identity {
        let index = (current.index + 1) % self.identities.len();
        self.identities[index].clone()
    }

    /// Whether every identity has been tried since the last success.
    ///
    /// `switch_count` includes the initially selected identity, so a pool of
    /// size N allows N-1 switches before exhaustion.
    pub fn exhausted(&self, switch_count: usize) -> bool {
        switch_count >= self.identities.len()
    }
}

/// Sub-second clock entropy, enough for uniform pool selection without an
/// RNG dependency.
fn entropy_nanos() -> u64 {
    use std::time::SystemTime;
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as u64
}
