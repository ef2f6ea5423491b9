/*
[INPUT]:  Injected wallet providers (EVM-style and UTXO-style)
[OUTPUT]: Uniform account, signing and public key access
[POS]:    Auth layer - wallet provider abstraction
[UPDATE]: When adding new wallet kinds or provider capabilities
*/

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::http::{Result, WalletAuthError};
use crate::types::WalletKind;

/// Trait for injected wallet providers
///
/// Implement this trait for each provider convention (MetaMask-style,
/// Unisat-style, hardware bridges). Every call may suspend on user approval.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Provider convention this implementation speaks
    fn kind(&self) -> WalletKind;

    /// Ask the user for account access
    async fn request_accounts(&self) -> Result<Vec<String>>;

    /// Sign `message` with the key behind `address`
    ///
    /// For EVM: `personal_sign`, hex-encoded signature (0x...)
    /// For UTXO: `signMessage`, provider-encoded signature
    async fn sign_message(&self, message: &str, address: &str) -> Result<String>;

    /// Public key for backend signature verification, if the provider exposes one
    async fn public_key(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

/// The providers present in the current environment, at most one per kind.
#[derive(Clone, Default)]
pub struct WalletProviders {
    providers: HashMap<WalletKind, Arc<dyn WalletProvider>>,
}

impl WalletProviders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, replacing any previous one of the same kind
    pub fn with(mut self, provider: Arc<dyn WalletProvider>) -> Self {
        self.insert(provider);
        self
    }

    pub fn insert(&mut self, provider: Arc<dyn WalletProvider>) {
        self.providers.insert(provider.kind(), provider);
    }

    pub fn remove(&mut self, kind: WalletKind) -> Option<Arc<dyn WalletProvider>> {
        self.providers.remove(&kind)
    }

    pub fn is_available(&self, kind: WalletKind) -> bool {
        self.providers.contains_key(&kind)
    }

    /// Resolve the provider for `kind`
    pub fn get(&self, kind: WalletKind) -> Result<Arc<dyn WalletProvider>> {
        self.providers
            .get(&kind)
            .cloned()
            .ok_or(WalletAuthError::ProviderUnavailable { kind })
    }
}

impl std::fmt::Debug for WalletProviders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletProviders")
            .field("kinds", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Mock wallet provider for testing
#[derive(Debug)]
pub struct MockWalletProvider {
    kind: WalletKind,
    accounts: Vec<String>,
    signature: String,
    pubkey: Option<String>,
    reject_signing: bool,
    sign_calls: AtomicUsize,
}

impl MockWalletProvider {
    /// Create a new mock provider with a single account and predetermined signature
    pub fn new(kind: WalletKind, address: &str, signature: &str) -> Self {
        let pubkey = match kind {
            WalletKind::Utxo => Some(format!("pubkey-{address}")),
            WalletKind::Evm => None,
        };
        Self {
            kind,
            accounts: vec![address.to_string()],
            signature: signature.to_string(),
            pubkey,
            reject_signing: false,
            sign_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_accounts(mut self, accounts: Vec<String>) -> Self {
        self.accounts = accounts;
        self
    }

    pub fn with_pubkey(mut self, pubkey: Option<String>) -> Self {
        self.pubkey = pubkey;
        self
    }

    /// Simulate the user dismissing the signature prompt
    pub fn rejecting(mut self) -> Self {
        self.reject_signing = true;
        self
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for MockWalletProvider {
    fn kind(&self) -> WalletKind {
        self.kind
    }

    async fn request_accounts(&self) -> Result<Vec<String>> {
        Ok(self.accounts.clone())
    }

    async fn sign_message(&self, _message: &str, _address: &str) -> Result<String> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_signing {
            return Err(WalletAuthError::Provider {
                message: "User rejected the request".to_string(),
            });
        }
        Ok(self.signature.clone())
    }

    async fn public_key(&self) -> Result<Option<String>> {
        Ok(self.pubkey.clone())
    }
}
