//! # Chain Families
//!
//! The closed set of chain families the monitor can screen. Each family owns
//! one normalization rule (see [`crate::address`]); supporting a new family
//! means adding a variant here and its rule there.
//!
//! Labels from external feeds arrive in several spellings (`eth`,
//! `usdt_trc20`, OFAC's `Digital Currency Address - XBT`). They are resolved
//! here and nowhere else.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnsupportedChainError;

/// A supported chain family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainFamily {
    /// Bitcoin: Base58Check legacy addresses and bech32 segwit addresses.
    Bitcoin,
    /// Ethereum mainnet.
    Ethereum,
    /// Tron: Base58Check with version byte `0x41`.
    Tron,
    /// Any other EVM-compatible chain (BSC, Polygon, Arbitrum, ...).
    OtherEvm,
}

impl ChainFamily {
    /// All supported families, in declaration order.
    pub const ALL: [ChainFamily; 4] = [
        ChainFamily::Bitcoin,
        ChainFamily::Ethereum,
        ChainFamily::Tron,
        ChainFamily::OtherEvm,
    ];

    /// Whether addresses of this family are 20-byte hex EVM addresses.
    pub fn is_evm(&self) -> bool {
        matches!(self, Self::Ethereum | Self::OtherEvm)
    }

    /// Canonical lower-case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bitcoin => "bitcoin",
            Self::Ethereum => "ethereum",
            Self::Tron => "tron",
            Self::OtherEvm => "other_evm",
        }
    }

    /// Resolve an OFAC SDN id type such as `Digital Currency Address - XBT`.
    ///
    /// OFAC's `USDT` id type denotes TRC-20 USDT, so it resolves to Tron.
    pub fn from_ofac_id_type(id_type: &str) -> Option<Self> {
        let ticker = id_type
            .trim()
            .strip_prefix("Digital Currency Address - ")?
            .trim();
        match ticker.to_ascii_uppercase().as_str() {
            "XBT" | "BTC" => Some(Self::Bitcoin),
            "ETH" => Some(Self::Ethereum),
            "USDT" | "TRX" => Some(Self::Tron),
            "ARB" | "BSC" | "MATIC" => Some(Self::OtherEvm),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainFamily {
    type Err = UnsupportedChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(family) = Self::from_ofac_id_type(s) {
            return Ok(family);
        }
        match s.trim().to_ascii_lowercase().as_str() {
            "bitcoin" | "btc" | "xbt" => Ok(Self::Bitcoin),
            "ethereum" | "eth" | "usdt_erc20" => Ok(Self::Ethereum),
            "tron" | "trx" | "usdt_trc20" => Ok(Self::Tron),
            "other_evm" | "evm" | "bsc" | "polygon" | "arbitrum" | "optimism" | "avalanche"
            | "base" => Ok(Self::OtherEvm),
            _ => Err(UnsupportedChainError {
                chain: s.to_string(),
            }),
        }
    }
}
