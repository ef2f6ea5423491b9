/*
[INPUT]:  HTTP client configuration and Auth API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod api;
pub mod client;
pub mod error;

pub use api::{AuthApi, LayerSource};
pub use client::{AuthClient, ClientConfig};
pub use error::{Result, UserNotice, WalletAuthError};
