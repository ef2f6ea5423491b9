/*
[INPUT]:  YAML configuration file or defaults
[OUTPUT]: Parsed session configuration and derived client/storage settings
[POS]:    Configuration layer - API endpoint, storage location, link expiry
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http::{AuthClient, ClientConfig, Result, WalletAuthError};
use crate::session::{FileStorage, StorageKeys};

/// Top-level configuration for the wallet session
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Auth API base URL (path prefixes are kept)
    pub api_base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Prefix for every persisted key
    #[serde(default = "default_storage_namespace")]
    pub storage_namespace: String,
    /// Directory for file-backed storage; platform data dir when unset
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
    /// Age after which a staged wallet link is discarded
    #[serde(default = "default_pending_link_ttl_secs")]
    pub pending_link_ttl_secs: u64,
    /// Restore persisted wallet state on init. Off for server-side rendering.
    #[serde(default = "default_restore_wallet_state")]
    pub restore_wallet_state: bool,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_storage_namespace() -> String {
    "launchpad".to_string()
}

fn default_pending_link_ttl_secs() -> u64 {
    10 * 60
}

fn default_restore_wallet_state() -> bool {
    true
}

impl SessionConfig {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            storage_namespace: default_storage_namespace(),
            storage_dir: None,
            pending_link_ttl_secs: default_pending_link_ttl_secs(),
            restore_wallet_state: default_restore_wallet_state(),
        }
    }

    /// Load configuration from YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            WalletAuthError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| WalletAuthError::Config(format!("Invalid session config: {e}")))
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }

    pub fn auth_client(&self) -> Result<AuthClient> {
        AuthClient::with_config(self.client_config(), &self.api_base_url)
    }

    pub fn storage_keys(&self) -> StorageKeys {
        StorageKeys::new(self.storage_namespace.clone())
    }

    pub fn storage_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.storage_dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join("launchpad-wallet"))
            .ok_or_else(|| WalletAuthError::Config("Could not determine data directory".to_string()))
    }

    pub fn file_storage(&self) -> Result<FileStorage> {
        Ok(FileStorage::new(self.storage_dir()?))
    }

    pub fn pending_link_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.pending_link_ttl_secs.min(i64::MAX as u64) as i64)
    }
}
