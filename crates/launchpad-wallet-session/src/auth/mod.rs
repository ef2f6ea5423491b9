/*
[INPUT]:  Injected wallet providers and Auth API challenge endpoint
[OUTPUT]: Wallet addresses, signed challenges and public keys
[POS]:    Auth layer - wallet provider adapter
[UPDATE]: When adding wallet kinds or changing the connect flow
*/

pub mod connector;
pub mod evm_provider;
pub mod provider;

pub use connector::{WalletConnection, WalletConnector};
pub use evm_provider::LocalEvmProvider;
pub use provider::{MockWalletProvider, WalletProvider, WalletProviders};
