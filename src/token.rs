//! Token Accessor
//!
//! Typed reads against an ERC20-style token. Both the transfer flow and the
//! read-only balance flow go through here.
//!
//! Every read is bounded by a fixed timeout. A failed read is always an
//! error: a balance is never defaulted to zero.

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, Bytes};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::amount::Amount;
use crate::chain::ChainClient;
use crate::contract::{BindingError, ContractBinding};

/// Bound on a single balance / allowance read
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Query for account {account} failed: {reason}")]
    Failed { account: Address, reason: String },

    #[error("Query for account {account} timed out after {after:?}")]
    Timeout { account: Address, after: Duration },
}

impl QueryError {
    pub fn account(&self) -> Address {
        match self {
            QueryError::Failed { account, .. } | QueryError::Timeout { account, .. } => *account,
        }
    }
}

/// One balance observation. Immutable once taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub account: Address,
    pub amount: Amount,
    pub read_at: DateTime<Utc>,
}

pub struct TokenAccessor {
    client: Arc<dyn ChainClient>,
    binding: ContractBinding,
    read_timeout: Duration,
}

impl TokenAccessor {
    /// The binding must expose `balanceOf` and `transfer`.
    pub fn new(client: Arc<dyn ChainClient>, binding: ContractBinding) -> Result<Self, BindingError> {
        binding.require_methods(&["balanceOf", "transfer"])?;
        Ok(Self {
            client,
            binding,
            read_timeout: DEFAULT_READ_TIMEOUT,
        })
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Token contract address
    pub fn token(&self) -> Address {
        self.binding.address()
    }

    /// Current balance of `account` at the latest block
    pub async fn balance_of(&self, account: Address) -> Result<Amount, QueryError> {
        let amount = self
            .read_uint(account, "balanceOf", vec![DynSolValue::Address(account)])
            .await?;
        debug!(account = %account, balance = %amount, "balanceOf");
        Ok(amount)
    }

    pub async fn snapshot(&self, account: Address) -> Result<BalanceSnapshot, QueryError> {
        let amount = self.balance_of(account).await?;
        Ok(BalanceSnapshot {
            account,
            amount,
            read_at: Utc::now(),
        })
    }

    /// Amount `spender` may move on behalf of `owner`
    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<Amount, QueryError> {
        self.read_uint(
            owner,
            "allowance",
            vec![DynSolValue::Address(owner), DynSolValue::Address(spender)],
        )
        .await
    }

    /// Call data for `transfer(receiver, amount)`
    pub fn encode_transfer(&self, receiver: Address, amount: &Amount) -> Result<Bytes, BindingError> {
        let value = amount.to_u256().map_err(|e| BindingError::Encode {
            method: "transfer".to_string(),
            reason: e.to_string(),
        })?;
        self.binding.encode_call(
            "transfer",
            &[DynSolValue::Address(receiver), DynSolValue::Uint(value, 256)],
        )
    }

    async fn read_uint(
        &self,
        account: Address,
        method: &str,
        args: Vec<DynSolValue>,
    ) -> Result<Amount, QueryError> {
        let failed = |reason: String| QueryError::Failed { account, reason };

        let data = self
            .binding
            .encode_call(method, &args)
            .map_err(|e| failed(e.to_string()))?;

        let raw = tokio::time::timeout(self.read_timeout, self.client.call(self.token(), data))
            .await
            .map_err(|_| QueryError::Timeout {
                account,
                after: self.read_timeout,
            })?
            .map_err(|e| failed(e.to_string()))?;

        let values = self
            .binding
            .decode_result(method, &raw)
            .map_err(|e| failed(e.to_string()))?;

        values
            .first()
            .and_then(DynSolValue::as_uint)
            .map(|(value, _)| Amount::from_u256(value))
            .ok_or_else(|| failed(format!("{} did not return a uint256", method)))
    }
}
