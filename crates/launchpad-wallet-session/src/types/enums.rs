/*
[INPUT]:  Auth API layer schema and wallet provider conventions
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - chain family, network and wallet kind definitions
[UPDATE]: When a new layer family or wallet kind is supported
*/

use std::fmt;

use serde::{Deserialize, Serialize};

/// Chain family a layer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayerType {
    Bitcoin,
    Fractal,
    Citrea,
    Nubit,
    /// Any family this build does not know how to connect to
    #[serde(other)]
    Unknown,
}

impl LayerType {
    /// Injected provider kind used to authenticate wallets on this family.
    ///
    /// Returns `None` for families with no wallet configuration.
    pub fn wallet_kind(self) -> Option<WalletKind> {
        match self {
            LayerType::Bitcoin | LayerType::Fractal | LayerType::Nubit => Some(WalletKind::Utxo),
            LayerType::Citrea => Some(WalletKind::Evm),
            LayerType::Unknown => None,
        }
    }

    pub fn is_bitcoin(self) -> bool {
        matches!(self, LayerType::Bitcoin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LayerType::Bitcoin => "BITCOIN",
            LayerType::Fractal => "FRACTAL",
            LayerType::Citrea => "CITREA",
            LayerType::Nubit => "NUBIT",
            LayerType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Network {
    Mainnet,
    Testnet,
}

/// Class of injected wallet provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    /// MetaMask-style provider (`eth_requestAccounts`, `personal_sign`)
    Evm,
    /// Unisat-style provider (`requestAccounts`, `signMessage`, `getPublicKey`)
    Utxo,
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletKind::Evm => f.write_str("evm"),
            WalletKind::Utxo => f.write_str("utxo"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_type_unknown_family_falls_back() {
        let layer: LayerType = serde_json::from_str("\"SOLANA\"").unwrap();
        assert_eq!(layer, LayerType::Unknown);
        assert_eq!(layer.wallet_kind(), None);
    }

    #[test]
    fn test_layer_type_wallet_kind() {
        assert_eq!(LayerType::Bitcoin.wallet_kind(), Some(WalletKind::Utxo));
        assert_eq!(LayerType::Fractal.wallet_kind(), Some(WalletKind::Utxo));
        assert_eq!(LayerType::Citrea.wallet_kind(), Some(WalletKind::Evm));
    }

    #[test]
    fn test_network_wire_format() {
        assert_eq!(serde_json::to_string(&Network::Testnet).unwrap(), "\"TESTNET\"");
    }
}
