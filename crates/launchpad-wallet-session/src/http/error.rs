/*
[INPUT]:  Error sources (HTTP, API, wallet providers, layer registry, storage)
[OUTPUT]: Structured error types with retry hints and user notice classes
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or notification categories
*/

use reqwest::StatusCode;
use thiserror::Error;

use crate::session::StorageError;
use crate::types::{LayerType, PendingWalletLink, WalletKind};

/// Main error type for wallet authentication and session operations
#[derive(Error, Debug)]
pub enum WalletAuthError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error (code {code}): {message}")]
    Api { code: i32, message: String },

    /// Backend rejected the credentials or signature
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No injected provider for the requested wallet kind
    #[error("No {kind} wallet provider available")]
    ProviderUnavailable { kind: WalletKind },

    /// Provider call failed or was rejected by the user
    #[error("Wallet provider error: {message}")]
    Provider { message: String },

    #[error("Layer not found: {layer_id}")]
    UnknownLayer { layer_id: String },

    /// Display-only layer that cannot be connected yet
    #[error("Layer {layer_id} is coming soon")]
    LayerComingSoon { layer_id: String },

    #[error("No wallet configuration for layer {layer_id} ({layer})")]
    UnsupportedLayer { layer_id: String, layer: LayerType },

    /// Address is bound to a different account; the link has been staged
    #[error("WALLET_ALREADY_LINKED")]
    AlreadyLinked { pending: Box<PendingWalletLink> },

    #[error("No pending wallet link found")]
    NoPendingLink,

    /// Another connect/disconnect for the same layer is in flight
    #[error("Wallet operation already in progress for layer {layer_id}")]
    OperationInProgress { layer_id: String },

    /// Persisted storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Notification category the UI shows for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserNotice {
    WalletUnavailable,
    AlreadyLinked,
    Failure,
}

impl WalletAuthError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WalletAuthError::Http(_)
                | WalletAuthError::InvalidResponse(_)
                | WalletAuthError::OperationInProgress { .. }
        )
    }

    /// Check if error indicates authentication failure
    pub fn is_auth_error(&self) -> bool {
        matches!(self, WalletAuthError::Authentication { .. })
            || matches!(self, WalletAuthError::Api { code, .. } if *code == 401 || *code == 403)
    }

    pub fn is_already_linked(&self) -> bool {
        matches!(self, WalletAuthError::AlreadyLinked { .. })
    }

    /// Link staged by an `AlreadyLinked` failure
    pub fn pending_link(&self) -> Option<&PendingWalletLink> {
        match self {
            WalletAuthError::AlreadyLinked { pending } => Some(pending),
            _ => None,
        }
    }

    /// Classify the error for user-facing notification
    pub fn notice(&self) -> UserNotice {
        match self {
            WalletAuthError::ProviderUnavailable { .. } => UserNotice::WalletUnavailable,
            WalletAuthError::AlreadyLinked { .. } => UserNotice::AlreadyLinked,
            _ => UserNotice::Failure,
        }
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        WalletAuthError::Api {
            code: status.as_u16() as i32,
            message: message.into(),
        }
    }
}

/// Result type alias for wallet session operations
pub type Result<T> = std::result::Result<T, WalletAuthError>;
