/*
[INPUT]:  Wallet addresses, signed challenges and bearer tokens
[OUTPUT]: Challenge messages, session tokens, link results and layer lists
[POS]:    HTTP layer - Auth API contract consumed by the session store
[UPDATE]: When auth endpoints or response contracts change
*/

use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use crate::http::client::unwrap_envelope;
use crate::http::{AuthClient, Result};
use crate::types::{
    GenerateMessageRequest, GeneratedMessage, Layer, LinkWalletData, LoginData, WalletAuthRequest,
};

/// Backend operations the session store depends on.
///
/// Calls are not retried here; retry policy belongs to the caller.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// One-time challenge for `address` to sign
    async fn generate_message(&self, address: &str) -> Result<GeneratedMessage>;

    /// Exchange a signed challenge for a new session
    async fn login(&self, request: &WalletAuthRequest) -> Result<LoginData>;

    /// Attach a wallet to the account owning `access_token`.
    ///
    /// A conflict is reported through `has_already_been_linked_to_another_user`,
    /// not as an error.
    async fn link_wallet(
        &self,
        access_token: &str,
        request: &WalletAuthRequest,
    ) -> Result<LinkWalletData>;

    /// Move a wallet bound to another account onto the current one
    async fn confirm_link(
        &self,
        access_token: &str,
        request: &WalletAuthRequest,
    ) -> Result<serde_json::Value>;
}

/// Remote list of supported layers
#[async_trait]
pub trait LayerSource: Send + Sync {
    async fn fetch_layers(&self) -> Result<Vec<Layer>>;
}

#[async_trait]
impl AuthApi for AuthClient {
    /// POST /users/generate-message
    async fn generate_message(&self, address: &str) -> Result<GeneratedMessage> {
        let body = GenerateMessageRequest {
            address: address.to_string(),
        };
        let builder = self.request(Method::POST, "/users/generate-message")?.json(&body);
        self.send_envelope(builder).await
    }

    /// POST /users/login
    async fn login(&self, request: &WalletAuthRequest) -> Result<LoginData> {
        debug!(address = %request.address, layer_id = %request.layer_id, "login");
        let builder = self.request(Method::POST, "/users/login")?.json(request);
        self.send_envelope(builder).await
    }

    /// POST /users/link-account
    async fn link_wallet(
        &self,
        access_token: &str,
        request: &WalletAuthRequest,
    ) -> Result<LinkWalletData> {
        debug!(address = %request.address, layer_id = %request.layer_id, "link wallet");
        let builder = self
            .request(Method::POST, "/users/link-account")?
            .bearer_auth(access_token)
            .json(request);
        let envelope = self.send_raw::<LinkWalletData>(builder).await?;

        // The conflict flag wins over `success`; the caller stages the link.
        if let Some(data) = envelope
            .data
            .as_ref()
            .filter(|data| data.has_already_been_linked_to_another_user)
        {
            return Ok(data.clone());
        }
        unwrap_envelope(envelope)
    }

    /// POST /users/link-account-to-another-user
    async fn confirm_link(
        &self,
        access_token: &str,
        request: &WalletAuthRequest,
    ) -> Result<serde_json::Value> {
        debug!(address = %request.address, layer_id = %request.layer_id, "confirm link");
        let builder = self
            .request(Method::POST, "/users/link-account-to-another-user")?
            .bearer_auth(access_token)
            .json(request);
        let envelope = self.send_raw::<serde_json::Value>(builder).await?;

        // The move already happened server-side; an empty body is still a success.
        if envelope.success && envelope.data.is_none() {
            return Ok(serde_json::Value::Null);
        }
        unwrap_envelope(envelope)
    }
}

#[async_trait]
impl LayerSource for AuthClient {
    /// GET /layers
    async fn fetch_layers(&self) -> Result<Vec<Layer>> {
        let builder = self.request(Method::GET, "/layers")?;
        self.send_envelope(builder).await
    }
}
