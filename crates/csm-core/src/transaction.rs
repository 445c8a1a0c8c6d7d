//! # Transactions
//!
//! Transactions arrive from a blockchain-data collaborator and are never
//! modified here. Participant addresses stay raw: each one is normalized at
//! screening time so that a malformed address becomes a scoring signal
//! instead of a rejected transaction.

use serde::{Deserialize, Serialize};

use crate::chain::ChainFamily;
use crate::temporal::Timestamp;

/// Role of an address within a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Funds leave this address.
    Sender,
    /// Funds arrive at this address.
    Receiver,
}

/// One (address, role) pair, in the order the source reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Raw address as reported by the source.
    pub address: String,
    /// Sender or receiver.
    pub role: Role,
}

/// An on-chain transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Chain family the transfer happened on.
    pub chain: ChainFamily,
    /// Transaction hash or id.
    pub hash: String,
    /// Block timestamp.
    pub timestamp: Timestamp,
    /// Ordered participants.
    pub participants: Vec<Participant>,
    /// Decimal amount in asset units, kept as a string to avoid float drift.
    pub amount: String,
    /// Asset symbol, e.g. `BTC`, `ETH`, `USDT`.
    pub asset: String,
    /// USD value at transfer time, when the source priced it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usd_value: Option<u64>,
}

impl Transaction {
    /// Hash in the form used for keys: trimmed and lower-cased.
    ///
    /// All supported chains use hex transaction ids, which are
    /// case-insensitive.
    pub fn hash_key(&self) -> String {
        self.hash.trim().to_ascii_lowercase()
    }

    /// Upper-cased asset symbol.
    pub fn asset_symbol(&self) -> String {
        self.asset.trim().to_ascii_uppercase()
    }

    /// Raw addresses with the given role, in reported order.
    pub fn addresses_with_role(&self, role: Role) -> impl Iterator<Item = &str> {
        self.participants
            .iter()
            .filter(move |p| p.role == role)
            .map(|p| p.address.as_str())
    }

    /// Every (sender, receiver) pairing, used to derive counterparty edges.
    pub fn counterparty_pairs(&self) -> Vec<(&str, &str)> {
        let receivers: Vec<&str> = self.addresses_with_role(Role::Receiver).collect();
        self.addresses_with_role(Role::Sender)
            .flat_map(|s| receivers.iter().map(move |r| (s, *r)))
            .collect()
    }
}
