use alloy::primitives::{Address, B256, Bytes};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

use crate::transaction::SignedTransaction;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("RPC transport failed: {0}")]
    Transport(String),

    #[error("Node returned error {code}: {message}")]
    Node { code: i64, message: String },

    #[error("Failed to decode node response: {0}")]
    Decode(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Transaction {tx_hash} not mined within {after:?}")]
    NotMined { tx_hash: B256, after: Duration },
}

/// Execution outcome of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: B256,
    pub success: bool,
    pub block_number: u64,
    pub gas_used: u64,
}

/// Connection to one blockchain node
///
/// Every method is a single network round trip. Callers bound each one with
/// their own timeout; implementations must not retry on their own.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Read-only contract call evaluated against the latest block
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;

    /// Next unused nonce for `account`, counting pending transactions
    async fn pending_nonce(&self, account: Address) -> Result<u64, ChainError>;

    /// Suggested legacy gas price in wei
    async fn gas_price(&self) -> Result<u128, ChainError>;

    async fn estimate_gas(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
    ) -> Result<u64, ChainError>;

    /// Chain id reported by the node
    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Broadcast a signed transaction
    async fn submit(&self, tx: &SignedTransaction) -> Result<(), ChainError>;

    /// Receipt lookup; `None` while the transaction is not yet mined
    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<Receipt>, ChainError>;

    /// Poll for the receipt until it shows up or `deadline` elapses.
    ///
    /// An expired deadline is `NotMined`; a failed poll is returned as is.
    async fn wait_for_receipt(
        &self,
        tx_hash: B256,
        deadline: Duration,
        poll_interval: Duration,
    ) -> Result<Receipt, ChainError> {
        let started = Instant::now();
        let mut polls = 0u32;

        loop {
            polls += 1;
            if let Some(receipt) = self.transaction_receipt(tx_hash).await? {
                debug!(tx_hash = %tx_hash, polls, "Receipt found");
                return Ok(receipt);
            }

            if started.elapsed() + poll_interval > deadline {
                return Err(ChainError::NotMined {
                    tx_hash,
                    after: deadline,
                });
            }

            tokio::time::sleep(poll_interval).await;
        }
    }
}
