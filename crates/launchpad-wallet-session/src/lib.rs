/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public launchpad wallet session crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod config;
pub mod http;
pub mod layers;
pub mod session;
pub mod types;

// Re-export commonly used types from auth
pub use auth::{
    LocalEvmProvider,
    MockWalletProvider,
    WalletConnection,
    WalletConnector,
    WalletProvider,
    WalletProviders,
};

pub use config::SessionConfig;

// Re-export commonly used types from http
pub use http::{
    AuthApi,
    AuthClient,
    ClientConfig,
    LayerSource,
    Result,
    UserNotice,
    WalletAuthError,
};

pub use layers::LayerRegistry;

// Re-export commonly used types from session
pub use session::{
    ConnectOutcome,
    FileStorage,
    LinkResolver,
    MemoryStorage,
    SessionDeps,
    SessionStorage,
    SessionStore,
    StorageError,
};

// Re-export all types
pub use types::*;
