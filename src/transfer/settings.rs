//! Transfer tunables
//!
//! `gas_limit` accepts either a number or the string `estimate` in YAML.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_GAS_LIMIT: u64 = 100_000;
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Where the transaction's gas limit comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GasLimitRepr", into = "GasLimitRepr")]
pub enum GasLimit {
    /// Fixed limit
    Override(u64),
    /// Ask the node (`eth_estimateGas`) for every transfer
    Estimate,
}

impl Default for GasLimit {
    fn default() -> Self {
        GasLimit::Override(DEFAULT_GAS_LIMIT)
    }
}

impl fmt::Display for GasLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GasLimit::Override(limit) => write!(f, "{}", limit),
            GasLimit::Estimate => write!(f, "estimate"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum GasLimitRepr {
    Fixed(u64),
    Mode(String),
}

impl TryFrom<GasLimitRepr> for GasLimit {
    type Error = String;

    fn try_from(repr: GasLimitRepr) -> Result<Self, Self::Error> {
        match repr {
            GasLimitRepr::Fixed(0) => Err("gas_limit must be greater than zero".to_string()),
            GasLimitRepr::Fixed(limit) => Ok(GasLimit::Override(limit)),
            GasLimitRepr::Mode(mode) if mode.eq_ignore_ascii_case("estimate") => {
                Ok(GasLimit::Estimate)
            }
            GasLimitRepr::Mode(mode) => Err(format!(
                "gas_limit must be a number or \"estimate\", got \"{}\"",
                mode
            )),
        }
    }
}

impl From<GasLimit> for GasLimitRepr {
    fn from(limit: GasLimit) -> Self {
        match limit {
            GasLimit::Override(limit) => GasLimitRepr::Fixed(limit),
            GasLimit::Estimate => GasLimitRepr::Mode("estimate".to_string()),
        }
    }
}

/// Per-transfer limits used by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSettings {
    pub gas_limit: GasLimit,
    /// Bound on each non-read node round trip (nonce, gas price, chain id, submit)
    pub rpc_timeout: Duration,
    /// Deadline for the receipt to show up after submission
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            gas_limit: GasLimit::default(),
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
