//! # csm-core: Foundational Types for the Sanctions Monitor
//!
//! Every other crate in the workspace builds on these types:
//!
//! - [`ChainFamily`]: the closed set of supported chain families.
//! - [`NormalizedAddress`] and [`normalize`]: the per-chain canonical form
//!   used as the equality key by the watchlist and the matcher.
//! - [`Transaction`]: externally sourced transfers.
//! - [`AlertId`], [`ScoreId`], [`WatchlistVersion`]: identifier newtypes.
//! - [`Timestamp`]: UTC, seconds precision.
//! - [`CsmError`]: the error taxonomy.
//!
//! ## Crate Policy
//!
//! - No I/O and no shared state. Everything here is a value type or a pure
//!   function.
//! - No dependencies on other workspace crates.

pub mod address;
pub mod chain;
pub mod error;
pub mod identity;
pub mod temporal;
pub mod transaction;

pub use address::{normalize, normalize_labeled, NormalizedAddress};
pub use chain::ChainFamily;
pub use error::{AddressRule, CsmError, InvalidAddressError, UnsupportedChainError};
pub use identity::{AlertId, ScoreId, WatchlistVersion};
pub use temporal::Timestamp;
pub use transaction::{Participant, Role, Transaction};
