use alloy::primitives::{Address, B256};
use tracing::warn;

use crate::amount::Amount;
use crate::token::BalanceSnapshot;

/// One transfer of `amount` base units from `sender` to `receiver`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub sender: Address,
    pub receiver: Address,
    pub amount: Amount,
}

impl TransferRequest {
    pub fn new(sender: Address, receiver: Address, amount: Amount) -> Self {
        Self {
            sender,
            receiver,
            amount,
        }
    }

    /// Lower the amount to `max` if it exceeds it.
    pub fn capped(mut self, max: &Amount) -> Self {
        if self.amount > *max {
            warn!(
                requested = %self.amount,
                max = %max,
                "Transfer amount exceeds configured maximum, capping"
            );
            self.amount = max.clone();
        }
        self
    }
}

/// Result of a confirmed and verified transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub tx_hash: B256,
    pub nonce: u64,
    pub gas_limit: u64,
    pub block_number: u64,
    pub gas_used: u64,
    pub sender_before: BalanceSnapshot,
    pub receiver_before: BalanceSnapshot,
    pub sender_after: BalanceSnapshot,
    pub receiver_after: BalanceSnapshot,
}
