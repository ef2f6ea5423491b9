/*
[INPUT]:  Session state, token pairs and staged link requests
[OUTPUT]: Namespaced key/value persistence with typed load/save
[POS]:    Session layer - persistence adapter for cross-reload state
[UPDATE]: When storage keys or persisted blob formats change
*/

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::types::{PendingWalletLink, SessionState, TokenPair};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// String key/value store shared by the whole process (browser localStorage
/// equivalent). Only the session store writes to it.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage, one instance per test or per process
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// One file per key under a directory, owner-only permissions
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Get the expected file path for a key
    pub fn key_file_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.key_file_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }

        let path = self.key_file_path(key);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&tmp_path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&tmp_path, perms)?;
        }

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.key_file_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Persisted keys, all under `"{namespace}."`
#[derive(Debug, Clone)]
pub struct StorageKeys {
    namespace: String,
}

impl StorageKeys {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    fn key(&self, name: &str) -> String {
        format!("{}.{name}", self.namespace)
    }

    pub fn access_token(&self) -> String {
        self.key("accessToken")
    }

    pub fn refresh_token(&self) -> String {
        self.key("refreshToken")
    }

    pub fn wallet_state(&self) -> String {
        self.key("walletState")
    }

    pub fn auth_tokens(&self) -> String {
        self.key("authTokens")
    }

    pub fn pending_link(&self) -> String {
        self.key("pendingWalletLink")
    }

    pub fn all(&self) -> [String; 5] {
        [
            self.access_token(),
            self.refresh_token(),
            self.wallet_state(),
            self.auth_tokens(),
            self.pending_link(),
        ]
    }
}

/// `walletState` blob layout
#[derive(Debug, Serialize, Deserialize)]
struct WalletStateBlob {
    state: SessionState,
    #[serde(default)]
    version: u32,
}

/// Typed view over [`SessionStorage`]
#[derive(Clone)]
pub struct SessionPersistence {
    storage: Arc<dyn SessionStorage>,
    keys: StorageKeys,
}

impl SessionPersistence {
    pub fn new(storage: Arc<dyn SessionStorage>, keys: StorageKeys) -> Self {
        Self { storage, keys }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.storage.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn write_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.storage.set(key, &raw)
    }

    /// Restore the persisted session.
    ///
    /// Yields the default state unless both the token blob (with both tokens)
    /// and the wallet-state blob are present. `loading` is always false.
    pub fn load(&self) -> Result<SessionState, StorageError> {
        let tokens: Option<TokenPair> = self.read_json(&self.keys.auth_tokens())?;
        let blob: Option<WalletStateBlob> = self.read_json(&self.keys.wallet_state())?;

        let (Some(tokens), Some(blob)) = (tokens, blob) else {
            return Ok(SessionState::default());
        };
        if !tokens.is_complete() {
            return Ok(SessionState::default());
        }

        let mut state = blob.state;
        state.auth_state.tokens = tokens;
        state.auth_state.authenticated = true;
        state.auth_state.loading = false;
        Ok(state)
    }

    /// [`Self::load`], falling back to the default state on any failure
    pub fn load_or_default(&self) -> SessionState {
        self.load().unwrap_or_else(|e| {
            warn!(error = %e, "persisted session unreadable, starting logged out");
            SessionState::default()
        })
    }

    pub fn save_state(&self, state: &SessionState) -> Result<(), StorageError> {
        let mut state = state.clone();
        state.auth_state.loading = false;
        self.write_json(
            &self.keys.wallet_state(),
            &WalletStateBlob { state, version: 0 },
        )
    }

    pub fn save_tokens(&self, tokens: &TokenPair) -> Result<(), StorageError> {
        if let Some(access) = &tokens.access_token {
            self.storage.set(&self.keys.access_token(), access)?;
        }
        if let Some(refresh) = &tokens.refresh_token {
            self.storage.set(&self.keys.refresh_token(), refresh)?;
        }
        self.write_json(&self.keys.auth_tokens(), tokens)
    }

    pub fn load_pending_link(&self) -> Result<Option<PendingWalletLink>, StorageError> {
        self.read_json(&self.keys.pending_link())
    }

    pub fn save_pending_link(&self, link: &PendingWalletLink) -> Result<(), StorageError> {
        self.write_json(&self.keys.pending_link(), link)
    }

    pub fn clear_pending_link(&self) -> Result<(), StorageError> {
        self.storage.remove(&self.keys.pending_link())
    }

    /// Remove every persisted key. Safe to call repeatedly.
    pub fn clear_all(&self) -> Result<(), StorageError> {
        for key in self.keys.all() {
            self.storage.remove(&key)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for SessionPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPersistence")
            .field("keys", &self.keys)
            .finish()
    }
}
