/*
[INPUT]:  Auth API layer schema and persisted wallet-state format
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - layers, wallets, auth state and pending links
[UPDATE]: When API schema or persisted state format changes
*/

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{LayerType, Network, WalletKind};

/// A supported chain/network pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: String,
    pub layer: LayerType,
    pub network: Network,
    pub name: String,
    #[serde(default)]
    pub coming_soon: bool,
}

impl Layer {
    pub fn wallet_kind(&self) -> Option<WalletKind> {
        self.layer.wallet_kind()
    }

    pub fn is_bitcoin_testnet(&self) -> bool {
        self.layer == LayerType::Bitcoin && self.network == Network::Testnet
    }
}

/// One authenticated wallet-to-layer binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedWallet {
    pub address: String,
    pub layer_id: String,
    pub layer_type: LayerType,
    pub network: Network,
}

impl ConnectedWallet {
    pub fn new(address: impl Into<String>, layer: &Layer) -> Self {
        Self {
            address: address.into(),
            layer_id: layer.id.clone(),
            layer_type: layer.layer,
            network: layer.network,
        }
    }
}

/// Server-issued session tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
        }
    }

    /// Both tokens present and non-empty
    pub fn is_complete(&self) -> bool {
        let present = |token: &Option<String>| token.as_deref().is_some_and(|t| !t.is_empty());
        present(&self.access_token) && present(&self.refresh_token)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub authenticated: bool,
    pub loading: bool,
    pub user_id: Option<String>,
    pub user_layer_id: Option<String>,
    /// Last-active layer
    pub layer_id: Option<String>,
    #[serde(default)]
    pub tokens: TokenPair,
}

/// Everything the UI renders from. Also the persisted `walletState.state` blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default)]
    pub connected_wallets: Vec<ConnectedWallet>,
    #[serde(default)]
    pub auth_state: AuthState,
    #[serde(default)]
    pub selected_layer_id: Option<String>,
}

impl SessionState {
    pub fn wallet_for_layer(&self, layer_id: &str) -> Option<&ConnectedWallet> {
        self.connected_wallets.iter().find(|w| w.layer_id == layer_id)
    }

    pub fn is_wallet_connected(&self, layer_id: &str) -> bool {
        self.wallet_for_layer(layer_id).is_some()
    }

    /// Insert or replace the wallet bound to `wallet.layer_id`.
    pub fn upsert_wallet(&mut self, wallet: ConnectedWallet) {
        match self
            .connected_wallets
            .iter_mut()
            .find(|w| w.layer_id == wallet.layer_id)
        {
            Some(existing) => *existing = wallet,
            None => self.connected_wallets.push(wallet),
        }
    }

    /// Remove the wallet bound to `layer_id`, returning it if present.
    pub fn remove_wallet(&mut self, layer_id: &str) -> Option<ConnectedWallet> {
        let index = self
            .connected_wallets
            .iter()
            .position(|w| w.layer_id == layer_id)?;
        Some(self.connected_wallets.remove(index))
    }

    /// True when every connected wallet sits on a Bitcoin layer.
    pub fn has_only_bitcoin(&self) -> bool {
        !self.connected_wallets.is_empty()
            && self.connected_wallets.iter().all(|w| w.layer_type.is_bitcoin())
    }
}

/// A link request staged after the backend reported the address as bound to
/// another account. Consumed on confirm or cancel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingWalletLink {
    pub address: String,
    pub layer_id: String,
    pub signed_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,
    /// User whose session staged the link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl PendingWalletLink {
    pub fn is_expired(&self, ttl: Duration) -> bool {
        Utc::now() - self.created_at > ttl
    }

    /// A link staged without an owner belongs to whoever confirms it.
    pub fn is_owned_by(&self, user_id: Option<&str>) -> bool {
        match self.owner_user_id.as_deref() {
            Some(owner) => user_id == Some(owner),
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLayerSummary {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(layer_id: &str, layer_type: LayerType) -> ConnectedWallet {
        ConnectedWallet {
            address: format!("addr-{layer_id}"),
            layer_id: layer_id.to_string(),
            layer_type,
            network: Network::Mainnet,
        }
    }

    #[test]
    fn test_upsert_keeps_one_wallet_per_layer() {
        let mut state = SessionState::default();
        state.upsert_wallet(wallet("l1", LayerType::Bitcoin));
        let mut replacement = wallet("l1", LayerType::Bitcoin);
        replacement.address = "bc1-new".to_string();
        state.upsert_wallet(replacement);

        assert_eq!(state.connected_wallets.len(), 1);
        assert_eq!(state.connected_wallets[0].address, "bc1-new");
    }

    #[test]
    fn test_has_only_bitcoin() {
        let mut state = SessionState::default();
        assert!(!state.has_only_bitcoin());

        state.upsert_wallet(wallet("btc", LayerType::Bitcoin));
        assert!(state.has_only_bitcoin());

        state.upsert_wallet(wallet("citrea", LayerType::Citrea));
        assert!(!state.has_only_bitcoin());
    }

    #[test]
    fn test_token_pair_completeness() {
        assert!(TokenPair::new("a", "r").is_complete());
        assert!(!TokenPair::default().is_complete());
        let partial = TokenPair {
            access_token: Some("a".to_string()),
            refresh_token: Some(String::new()),
        };
        assert!(!partial.is_complete());
    }

    #[test]
    fn test_pending_link_without_timestamp_is_fresh() {
        let link: PendingWalletLink = serde_json::from_str(
            r#"{"address":"bc1q","layerId":"l1","signedMessage":"sig"}"#,
        )
        .unwrap();
        assert!(!link.is_expired(Duration::minutes(10)));
        assert!(link.pubkey.is_none());
        assert!(link.is_owned_by(None));
    }

    #[test]
    fn test_pending_link_ownership() {
        let link: PendingWalletLink = serde_json::from_str(
            r#"{"address":"bc1q","layerId":"l1","signedMessage":"sig","ownerUserId":"user-1"}"#,
        )
        .unwrap();
        assert!(link.is_owned_by(Some("user-1")));
        assert!(!link.is_owned_by(Some("user-2")));
        assert!(!link.is_owned_by(None));
    }

    #[test]
    fn test_layer_deserialize_camel_case() {
        let layer: Layer = serde_json::from_str(
            r#"{"id":"1","layer":"CITREA","network":"TESTNET","name":"Citrea Testnet","comingSoon":false}"#,
        )
        .unwrap();
        assert_eq!(layer.layer, LayerType::Citrea);
        assert_eq!(layer.wallet_kind(), Some(WalletKind::Evm));
    }
}
