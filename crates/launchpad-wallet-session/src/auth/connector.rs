/*
[INPUT]:  Wallet kind, injected providers and Auth API challenge endpoint
[OUTPUT]: Address, signed challenge and optional public key
[POS]:    Auth layer - orchestrates the provider side of a wallet connection
[UPDATE]: When provider call order or challenge flow changes
*/

use tracing::debug;

use crate::auth::WalletProviders;
use crate::http::{AuthApi, Result, WalletAuthError};
use crate::types::WalletKind;

/// Result of a successful provider round-trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConnection {
    pub address: String,
    pub signed_message: String,
    /// Present for UTXO-style providers only
    pub pubkey: Option<String>,
}

/// Uniform connect flow over heterogeneous wallet providers
#[derive(Debug, Clone, Default)]
pub struct WalletConnector {
    providers: WalletProviders,
}

impl WalletConnector {
    pub fn new(providers: WalletProviders) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &WalletProviders {
        &self.providers
    }

    /// Complete provider flow
    ///
    /// 1. Resolve the provider for `kind`
    /// 2. Request accounts and take the first one
    /// 3. Fetch a challenge for that address
    /// 4. Sign the challenge
    /// 5. UTXO-style only: fetch the public key
    ///
    /// Nothing is retried; a rejected prompt fails the whole call.
    pub async fn connect(&self, kind: WalletKind, api: &dyn AuthApi) -> Result<WalletConnection> {
        let provider = self.providers.get(kind)?;

        // Index 0 is our policy, providers do not promise any ordering.
        let address = provider
            .request_accounts()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| WalletAuthError::Provider {
                message: "Wallet returned no accounts".to_string(),
            })?;
        debug!(%kind, %address, "wallet account granted");

        let challenge = api.generate_message(&address).await?;
        let signed_message = provider.sign_message(&challenge.message, &address).await?;

        let pubkey = match kind {
            WalletKind::Evm => None,
            WalletKind::Utxo => Some(provider.public_key().await?.ok_or_else(|| {
                WalletAuthError::Provider {
                    message: "Wallet did not return a public key".to_string(),
                }
            })?),
        };

        Ok(WalletConnection {
            address,
            signed_message,
            pubkey,
        })
    }
}
