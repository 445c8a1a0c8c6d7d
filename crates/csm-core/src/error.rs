//! # Error Types: Screening Error Taxonomy
//!
//! Defines the error types used throughout the sanctions monitor. All errors
//! use `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Address errors name the chain, the offending input, and the exact rule
//!   that rejected it (`checksum invalid` vs `wrong length`).
//! - Malformed addresses are recoverable: the matcher folds them into a
//!   non-match plus a scoring factor. Every other variant propagates.
//! - Lifecycle errors carry the alert, its current state, and the rejected
//!   event.

use serde::Serialize;
use thiserror::Error;

use crate::chain::ChainFamily;

/// Top-level error type for the sanctions monitor.
#[derive(Error, Debug)]
pub enum CsmError {
    /// An address failed its chain's validation rules.
    #[error(transparent)]
    InvalidAddress(#[from] InvalidAddressError),

    /// The chain family is not one the normalizer supports.
    #[error(transparent)]
    UnsupportedChain(#[from] UnsupportedChainError),

    /// No watchlist snapshot has been published yet.
    #[error("watchlist index unavailable: no snapshot has been published")]
    IndexUnavailable,

    /// Alert lifecycle event not permitted from the current state.
    #[error("invalid transition for alert {alert_id}: {event} is not allowed from {from}")]
    InvalidTransition {
        /// Alert the event was applied to.
        alert_id: String,
        /// Current state name.
        from: String,
        /// Rejected event name.
        event: String,
    },

    /// No alert exists with the given identifier.
    #[error("alert not found: {0}")]
    AlertNotFound(String),

    /// A risk score below the alerting tiers was offered to the alert manager.
    #[error("risk score {score_id} has tier {tier}; alerts are raised for HIGH and CRITICAL only")]
    NotAlertable {
        /// Score that was offered.
        score_id: String,
        /// Its tier.
        tier: String,
    },

    /// Watchlist version label is empty or malformed.
    #[error("invalid watchlist version {0:?}")]
    InvalidWatchlistVersion(String),

    /// Configuration failed validation.
    #[error("configuration error: {0}")]
    Config(String),

    /// Timestamp could not be parsed.
    #[error("invalid timestamp {input:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        input: String,
        /// Parser message.
        reason: String,
    },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// An address that failed validation for its chain family.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("invalid {chain} address {input:?}: {rule}")]
pub struct InvalidAddressError {
    /// Chain family the address was validated against.
    pub chain: ChainFamily,
    /// The raw input, as supplied.
    pub input: String,
    /// The rule the input violated.
    pub rule: AddressRule,
}

/// A chain family label that maps to no supported family.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("unsupported chain family {chain:?}")]
pub struct UnsupportedChainError {
    /// The unrecognized label.
    pub chain: String,
}

/// The specific validation rule an address violated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum AddressRule {
    /// Input was empty after trimming.
    Empty,
    /// Character count outside the permitted range.
    WrongLength {
        /// Smallest permitted length.
        min: usize,
        /// Largest permitted length.
        max: usize,
        /// Observed length.
        actual: usize,
    },
    /// A character outside the chain's alphabet.
    InvalidCharacter {
        /// The offending character.
        ch: char,
        /// Zero-based character position.
        position: usize,
    },
    /// Decoded payload has the wrong byte length.
    WrongPayloadLength {
        /// Required byte length.
        expected: usize,
        /// Observed byte length.
        actual: usize,
    },
    /// Version byte not valid for the chain.
    UnknownVersion {
        /// Observed version byte.
        version: u8,
    },
    /// Checksum did not match the payload.
    ChecksumInvalid,
    /// Bech32 human-readable part not recognized.
    UnknownPrefix {
        /// Observed prefix.
        prefix: String,
    },
    /// Bech32 string mixes upper and lower case.
    MixedCase,
    /// Segwit witness program has a length its version does not allow.
    WitnessProgramLength {
        /// Witness version.
        version: u8,
        /// Program length in bytes.
        actual: usize,
    },
    /// Segwit data leaves non-zero or over-long padding after regrouping.
    InvalidPadding,
}

impl std::fmt::Display for AddressRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("empty address"),
            Self::WrongLength { min, max, actual } if min == max => {
                write!(f, "wrong length (expected {min} characters, got {actual})")
            }
            Self::WrongLength { min, max, actual } => {
                write!(f, "wrong length (expected {min}..={max} characters, got {actual})")
            }
            Self::InvalidCharacter { ch, position } => {
                write!(f, "invalid character {ch:?} at position {position}")
            }
            Self::WrongPayloadLength { expected, actual } => {
                write!(f, "wrong payload length (expected {expected} bytes, got {actual})")
            }
            Self::UnknownVersion { version } => write!(f, "unknown version byte 0x{version:02x}"),
            Self::ChecksumInvalid => f.write_str("checksum invalid"),
            Self::UnknownPrefix { prefix } => write!(f, "unknown prefix {prefix:?}"),
            Self::MixedCase => f.write_str("mixed case"),
            Self::WitnessProgramLength { version, actual } => {
                write!(f, "witness program of {actual} bytes not allowed for version {version}")
            }
            Self::InvalidPadding => f.write_str("invalid padding"),
        }
    }
}

impl InvalidAddressError {
    pub(crate) fn new(chain: ChainFamily, input: &str, rule: AddressRule) -> Self {
        Self {
            chain,
            input: input.to_string(),
            rule,
        }
    }
}
