use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::{keccak256, strip_hex_prefix, Hash};
use crate::error::{AirdropError, Result};

/// A leaf is the hash of one eligibility record.
pub type Leaf = Hash;

/// Account-address family a tree is built for. Each namespace has its own tree and root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// Native chain accounts (bech32-like strings).
    Native,
    /// EVM accounts, lower-case hex without `0x`.
    Evm,
}

impl Namespace {
    /// Returns the canonical form of `address` for this namespace.
    ///
    /// EVM addresses lose their `0x` prefix and are lower-cased so a proof does
    /// not depend on the checksum casing the claimant happened to use.
    pub fn normalize_address(&self, address: &str) -> Result<String> {
        let trimmed = address.trim();
        if trimmed.is_empty() {
            return Err(AirdropError::InvalidAddress(address.to_string(), "empty"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(AirdropError::InvalidAddress(
                address.to_string(),
                "contains whitespace",
            ));
        }
        match self {
            Namespace::Native => Ok(trimmed.to_string()),
            Namespace::Evm => {
                let cleaned = strip_hex_prefix(trimmed);
                if cleaned.len() != 40 {
                    return Err(AirdropError::InvalidAddress(
                        address.to_string(),
                        "expected 40 hex chars",
                    ));
                }
                if !cleaned.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(AirdropError::InvalidAddress(
                        address.to_string(),
                        "invalid hex",
                    ));
                }
                Ok(cleaned.to_ascii_lowercase())
            }
        }
    }

    /// Encodes a record into its leaf.
    pub fn encode(&self, record: &EligibilityRecord) -> Result<Leaf> {
        encode_leaf(*self, &record.address, &record.amount)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Native => write!(f, "native"),
            Namespace::Evm => write!(f, "evm"),
        }
    }
}

impl FromStr for Namespace {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" | "terra" => Ok(Namespace::Native),
            "evm" | "foreign" | "eth" => Ok(Namespace::Evm),
            other => Err(format!(
                "unknown namespace '{}', expected 'native' or 'evm'",
                other
            )),
        }
    }
}

/// One account's entitled claim in the smallest token unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EligibilityRecord {
    pub address: String,
    pub amount: String,
}

impl EligibilityRecord {
    pub fn new(address: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            amount: amount.into(),
        }
    }
}

/// Checks that `amount` is the canonical decimal form of an unsigned 128-bit integer.
///
/// The contract hashes `Uint128::to_string()`, so `"0100"` would never match
/// on chain even though it parses.
pub fn validate_amount(amount: &str) -> Result<u128> {
    if amount.is_empty() {
        return Err(AirdropError::InvalidAmount(amount.to_string(), "empty"));
    }
    if !amount.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AirdropError::InvalidAmount(
            amount.to_string(),
            "expected base-10 digits only",
        ));
    }
    if amount.len() > 1 && amount.starts_with('0') {
        return Err(AirdropError::InvalidAmount(
            amount.to_string(),
            "leading zeros",
        ));
    }
    amount
        .parse::<u128>()
        .map_err(|_| AirdropError::InvalidAmount(amount.to_string(), "exceeds 128 bits"))
}

/// Computes `keccak256(address || amount)` over the normalized address.
///
/// # Errors
/// Returns [`AirdropError::InvalidAddress`] or [`AirdropError::InvalidAmount`]
/// rather than hashing malformed input.
pub fn encode_leaf(namespace: Namespace, address: &str, amount: &str) -> Result<Leaf> {
    let address = namespace.normalize_address(address)?;
    validate_amount(amount)?;
    let mut preimage = Vec::with_capacity(address.len() + amount.len());
    preimage.extend_from_slice(address.as_bytes());
    preimage.extend_from_slice(amount.as_bytes());
    Ok(keccak256(preimage))
}
