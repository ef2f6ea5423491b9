/*
[INPUT]:  Wallet connection results and staged link requests
[OUTPUT]: Typed Rust request bodies for the Auth API
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new request types added
*/

use serde::{Deserialize, Serialize};

use super::models::PendingWalletLink;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateMessageRequest {
    pub address: String,
}

/// Body shared by login, wallet-link and link-confirmation calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAuthRequest {
    pub address: String,
    pub layer_id: String,
    pub signed_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,
}

impl From<&PendingWalletLink> for WalletAuthRequest {
    fn from(link: &PendingWalletLink) -> Self {
        Self {
            address: link.address.clone(),
            layer_id: link.layer_id.clone(),
            signed_message: link.signed_message.clone(),
            pubkey: link.pubkey.clone(),
        }
    }
}
