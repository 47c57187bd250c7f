//! Shared configuration and credential loading for commands

use dsk_core::{Config, ConfigManager, CredentialPool, Error, Identity, Result};

/// Everything a command needs before it can talk to the service.
pub(crate) struct CliContext {
    pub config: Config,
    pub pool: CredentialPool,
    pub fallback: Option<Identity>,
}

impl CliContext {
    /// Load the configuration file and resolve credentials.
    ///
    /// With the account pool enabled, the pool is loaded from the configured
    /// accounts directory. Without it, the single fallback credential serves
    /// as a pool of one.
    pub(crate) fn load() -> Result<Self> {
        let manager = ConfigManager::new()?;
        let config = manager.load()?;

        let fallback_path = manager.fallback_token_path();
        let fallback = if fallback_path.exists() {
            Some(CredentialPool::fallback(&fallback_path)?)
        } else {
            None
        };

        let pool = if config.upload.use_account_pool {
            let accounts_dir = config
                .upload
                .accounts_dir
                .clone()
                .unwrap_or_else(|| manager.default_accounts_dir());
            CredentialPool::load(&accounts_dir)?
        } else {
            let identity = fallback.clone().ok_or_else(|| {
                Error::Config(format!(
                    "Account pool is disabled and no credential found at {}",
                    fallback_path.display()
                ))
            })?;
            CredentialPool::single(identity)
        };

        Ok(Self {
            config,
            pool,
            fallback,
        })
    }
}
