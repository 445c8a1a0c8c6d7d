//! # Address Normalization
//!
//! Canonicalizes raw address strings into [`NormalizedAddress`] values that
//! can be used directly as equality keys. This module is the only place that
//! knows about chain-specific encodings; the watchlist index and the matcher
//! only ever see normalized forms.
//!
//! ## Rules
//!
//! | Family | Accepted input | Normalized form |
//! |---|---|---|
//! | ethereum, other_evm | optional `0x`/`0X`, 40 hex digits, any case | `0x` + lower-case hex |
//! | bitcoin (legacy) | Base58Check, 26..=35 chars, versions `00 05 6f c4` | input, unchanged |
//! | bitcoin (segwit) | bech32 / bech32m, `bc` or `tb` prefix, single case | lower-case |
//! | tron | Base58Check, 34 chars, version `41` | input, unchanged |
//!
//! Surrounding whitespace is ignored. Base58 encodings are case-sensitive,
//! so nothing is folded for them.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::chain::ChainFamily;
use crate::error::{AddressRule, CsmError, InvalidAddressError};

const EVM_HEX_LEN: usize = 40;
const BASE58_ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const BASE58CHECK_PAYLOAD_LEN: usize = 25;
const CHECKSUM_LEN: usize = 4;
const BITCOIN_VERSIONS: [u8; 4] = [0x00, 0x05, 0x6f, 0xc4];
const TRON_VERSION: u8 = 0x41;

/// A validated, canonical address for one chain family.
///
/// Constructed only through [`normalize`], so holding one is proof that the
/// value passed its chain's rules.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "AddressInput")]
pub struct NormalizedAddress {
    chain: ChainFamily,
    #[serde(rename = "address")]
    value: String,
}

#[derive(Deserialize)]
struct AddressInput {
    chain: ChainFamily,
    address: String,
}

impl TryFrom<AddressInput> for NormalizedAddress {
    type Error = InvalidAddressError;

    fn try_from(input: AddressInput) -> Result<Self, Self::Error> {
        normalize(input.chain, &input.address)
    }
}

impl NormalizedAddress {
    /// The chain family this address belongs to.
    pub fn chain(&self) -> ChainFamily {
        self.chain
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for NormalizedAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// Normalize `raw` according to the rules of `chain`.
pub fn normalize(chain: ChainFamily, raw: &str) -> Result<NormalizedAddress, InvalidAddressError> {
    let input = raw.trim();
    if input.is_empty() {
        return Err(InvalidAddressError::new(chain, raw, AddressRule::Empty));
    }

    let value = match chain {
        ChainFamily::Ethereum | ChainFamily::OtherEvm => normalize_evm(input),
        ChainFamily::Bitcoin => normalize_bitcoin(input),
        ChainFamily::Tron => base58check(input, 34, 34, &[TRON_VERSION]),
    }
    .map_err(|rule| InvalidAddressError::new(chain, raw, rule))?;

    Ok(NormalizedAddress { chain, value })
}

/// Resolve a chain label and normalize in one step.
///
/// Unlike [`normalize`], an unrecognized chain label is an error here
/// (`CsmError::UnsupportedChain`).
pub fn normalize_labeled(chain: &str, raw: &str) -> Result<NormalizedAddress, CsmError> {
    let family = ChainFamily::from_str(chain)?;
    Ok(normalize(family, raw)?)
}

fn normalize_evm(input: &str) -> Result<String, AddressRule> {
    let hex = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    let offset = input.len() - hex.len();

    let len = hex.chars().count();
    if len != EVM_HEX_LEN {
        return Err(AddressRule::WrongLength {
            min: EVM_HEX_LEN,
            max: EVM_HEX_LEN,
            actual: len,
        });
    }
    if let Some((i, ch)) = hex.chars().enumerate().find(|(_, c)| !c.is_ascii_hexdigit()) {
        return Err(AddressRule::InvalidCharacter {
            ch,
            position: offset + i,
        });
    }
    Ok(format!("0x{}", hex.to_ascii_lowercase()))
}

fn normalize_bitcoin(input: &str) -> Result<String, AddressRule> {
    let lower = input.to_ascii_lowercase();
    if lower.starts_with("bc1") || lower.starts_with("tb1") {
        return bech32::normalize(input);
    }
    base58check(input, 26, 35, &BITCOIN_VERSIONS)
}

// ─── Base58Check ─────────────────────────────────────────────────────

fn base58check(input: &str, min: usize, max: usize, versions: &[u8]) -> Result<String, AddressRule> {
    let len = input.chars().count();
    if len < min || len > max {
        return Err(AddressRule::WrongLength { min, max, actual: len });
    }

    let decoded = decode_base58(input)?;
    if decoded.len() != BASE58CHECK_PAYLOAD_LEN {
        return Err(AddressRule::WrongPayloadLength {
            expected: BASE58CHECK_PAYLOAD_LEN,
            actual: decoded.len(),
        });
    }

    let (payload, checksum) = decoded.split_at(decoded.len() - CHECKSUM_LEN);
    let digest = Sha256::digest(Sha256::digest(payload));
    if digest[..CHECKSUM_LEN] != *checksum {
        return Err(AddressRule::ChecksumInvalid);
    }
    if !versions.contains(&payload[0]) {
        return Err(AddressRule::UnknownVersion { version: payload[0] });
    }
    Ok(input.to_string())
}

/// Decode a Base58 string into big-endian bytes, keeping leading zero bytes.
fn decode_base58(input: &str) -> Result<Vec<u8>, AddressRule> {
    let mut bytes: Vec<u8> = Vec::with_capacity(input.len());
    for (position, ch) in input.chars().enumerate() {
        let digit = BASE58_ALPHABET
            .iter()
            .position(|&c| char::from(c) == ch)
            .ok_or(AddressRule::InvalidCharacter { ch, position })?;

        let mut carry = digit as u32;
        for byte in bytes.iter_mut().rev() {
            carry += u32::from(*byte) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.insert(0, (carry & 0xff) as u8);
            carry >>= 8;
        }
    }

    let leading_zeros = input.chars().take_while(|&c| c == '1').count();
    let mut out = vec![0u8; leading_zeros];
    out.extend(bytes);
    Ok(out)
}

// ─── Bech32 / Bech32m ────────────────────────────────────────────────

mod bech32 {
    use crate::error::AddressRule;

    pub(super) const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
    const GENERATOR: [u32; 5] = [0x3b6a_57b2, 0x2650_8e6d, 0x1ea1_19fa, 0x3d42_33dd, 0x2a14_62b3];
    pub(super) const BECH32_CONST: u32 = 1;
    pub(super) const BECH32M_CONST: u32 = 0x2bc8_30a3;
    const PREFIXES: [&str; 2] = ["bc", "tb"];
    const MIN_LEN: usize = 14;
    const MAX_LEN: usize = 90;
    const CHECKSUM_LEN: usize = 6;

    pub(super) fn normalize(input: &str) -> Result<String, AddressRule> {
        let len = input.chars().count();
        if !(MIN_LEN..=MAX_LEN).contains(&len) {
            return Err(AddressRule::WrongLength {
                min: MIN_LEN,
                max: MAX_LEN,
                actual: len,
            });
        }
        let has_lower = input.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = input.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper {
            return Err(AddressRule::MixedCase);
        }

        let lower = input.to_ascii_lowercase();
        let separator = lower.rfind('1').ok_or_else(|| AddressRule::UnknownPrefix {
            prefix: lower.clone(),
        })?;
        let (prefix, data) = (&lower[..separator], &lower[separator + 1..]);
        if !PREFIXES.contains(&prefix) {
            return Err(AddressRule::UnknownPrefix {
                prefix: prefix.to_string(),
            });
        }

        let mut values: Vec<u8> = prefix.bytes().map(|b| b >> 5).collect();
        values.push(0);
        values.extend(prefix.bytes().map(|b| b & 0x1f));
        let data_start = values.len();
        for (i, ch) in data.chars().enumerate() {
            let value = CHARSET
                .iter()
                .position(|&c| char::from(c) == ch)
                .ok_or(AddressRule::InvalidCharacter {
                    ch,
                    position: separator + 1 + i,
                })?;
            values.push(value as u8);
        }

        let witness_version = values[data_start];
        let expected = match witness_version {
            0 => BECH32_CONST,
            1..=16 => BECH32M_CONST,
            version => return Err(AddressRule::UnknownVersion { version }),
        };
        if polymod(&values) != expected {
            return Err(AddressRule::ChecksumInvalid);
        }

        let program = regroup(&values[data_start + 1..values.len() - CHECKSUM_LEN])?;
        let allowed = match witness_version {
            0 => program.len() == 20 || program.len() == 32,
            _ => (2..=40).contains(&program.len()),
        };
        if !allowed {
            return Err(AddressRule::WitnessProgramLength {
                version: witness_version,
                actual: program.len(),
            });
        }
        Ok(lower)
    }

    /// 5-bit groups to bytes. At most four zero bits of padding may remain.
    fn regroup(groups: &[u8]) -> Result<Vec<u8>, AddressRule> {
        let mut acc: u32 = 0;
        let mut bits: u32 = 0;
        let mut out = Vec::with_capacity(groups.len() * 5 / 8);
        for &group in groups {
            acc = ((acc << 5) | u32::from(group)) & 0xfff;
            bits += 5;
            while bits >= 8 {
                bits -= 8;
                out.push(((acc >> bits) & 0xff) as u8);
            }
        }
        if bits >= 5 || acc & ((1 << bits) - 1) != 0 {
            return Err(AddressRule::InvalidPadding);
        }
        Ok(out)
    }

    pub(super) fn polymod(values: &[u8]) -> u32 {
        let mut chk: u32 = 1;
        for value in values {
            let top = chk >> 25;
            chk = ((chk & 0x01ff_ffff) << 5) ^ u32::from(*value);
            for (i, generator) in GENERATOR.iter().enumerate() {
                if (top >> i) & 1 == 1 {
                    chk ^= generator;
                }
            }
        }
        chk
    }
}
