/*
[INPUT]:  EVM private key (hex string)
[OUTPUT]: EVM-style provider with a single account and personal_sign signatures
[POS]:    Auth layer - local EVM wallet provider
[UPDATE]: When signing logic or EVM address formatting changes
*/

use std::str::FromStr;

use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;

use crate::auth::WalletProvider;
use crate::http::{Result, WalletAuthError};
use crate::types::WalletKind;

/// EVM-style provider backed by a local private key.
///
/// Behaves like an unlocked MetaMask account: one account, EIP-191
/// `personal_sign`, no public key.
pub struct LocalEvmProvider {
    signer: PrivateKeySigner,
    address: String,
}

impl LocalEvmProvider {
    /// Create a provider from a hex-encoded private key, with or without "0x"
    pub fn new(private_key_hex: &str) -> Result<Self> {
        let private_key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);
        let signer = PrivateKeySigner::from_str(private_key_hex)
            .map_err(|e| WalletAuthError::Config(format!("Invalid EVM private key: {e}")))?;

        let address = signer.address().to_checksum(None);

        Ok(Self { signer, address })
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

fn normalize_evm_address(address: &str) -> String {
    let address = address.trim();
    address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address)
        .to_ascii_lowercase()
}

#[async_trait]
impl WalletProvider for LocalEvmProvider {
    fn kind(&self) -> WalletKind {
        WalletKind::Evm
    }

    async fn request_accounts(&self) -> Result<Vec<String>> {
        Ok(vec![self.address.clone()])
    }

    async fn sign_message(&self, message: &str, address: &str) -> Result<String> {
        if normalize_evm_address(address) != normalize_evm_address(&self.address) {
            return Err(WalletAuthError::Provider {
                message: format!("Unknown account {address}"),
            });
        }

        let signature = self
            .signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| WalletAuthError::Provider {
                message: format!("Failed to sign EVM message: {e}"),
            })?;

        // [r, s, v]
        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }
}
