/*
[INPUT]:  Auth API response schema
[OUTPUT]: Typed Rust response structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

use super::models::{TokenPair, UserLayerSummary, UserSummary};

/// `{success, data, error}` wrapper every Auth API endpoint responds with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedMessage {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    #[serde(alias = "auth")]
    pub tokens: TokenPair,
    pub user: UserSummary,
    #[serde(default)]
    pub user_layer: Option<UserLayerSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkWalletData {
    #[serde(default)]
    pub has_already_been_linked_to_another_user: bool,
    #[serde(default, alias = "auth")]
    pub tokens: Option<TokenPair>,
    #[serde(default)]
    pub user: Option<UserSummary>,
    #[serde(default)]
    pub user_layer: Option<UserLayerSummary>,
}
