//! Token Amounts
//!
//! Token balances are carried as arbitrary-precision unsigned integers in the
//! token's base units. The on-chain representation is a `uint256` word, so
//! every conversion to the wire goes through [`Amount::to_u256`], which
//! refuses values that do not fit instead of truncating them.

use alloy::primitives::U256;
use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Invalid amount format: {0}")]
    InvalidFormat(String),

    #[error("Amount {0} does not fit in a uint256 word")]
    Overflow(String),
}

/// Non-negative token amount in base units.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(BigUint);

impl Amount {
    pub fn zero() -> Self {
        Self(BigUint::default())
    }

    pub fn is_zero(&self) -> bool {
        self.0.bits() == 0
    }

    /// `self - other`, or `None` if the result would be negative.
    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        if self.0 < other.0 {
            None
        } else {
            Some(Amount(&self.0 - &other.0))
        }
    }

    /// `self + other`. Never overflows.
    pub fn add(&self, other: &Amount) -> Amount {
        Amount(&self.0 + &other.0)
    }

    pub fn from_u256(value: U256) -> Self {
        Self(BigUint::from_bytes_be(&value.to_be_bytes::<32>()))
    }

    /// Convert to the ABI `uint256` word.
    pub fn to_u256(&self) -> Result<U256, AmountError> {
        let bytes = self.0.to_bytes_be();
        if bytes.len() > 32 {
            return Err(AmountError::Overflow(self.to_string()));
        }
        Ok(U256::from_be_slice(&bytes))
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(BigUint::from(value))
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parse a base-10 integer. Signs, decimals and blanks are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::InvalidFormat(s.to_string()));
        }
        BigUint::parse_bytes(trimmed.as_bytes(), 10)
            .map(Amount)
            .ok_or_else(|| AmountError::InvalidFormat(s.to_string()))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Decimal strings on the wire: amounts routinely exceed what JSON numbers
// carry without loss.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}
