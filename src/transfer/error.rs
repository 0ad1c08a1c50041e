//! Transfer Error Types
//!
//! Every failure is reported to the caller with the step it happened at and
//! the account / amount / transaction involved. Nothing is retried.

use alloy::primitives::{Address, B256};
use std::time::Duration;
use thiserror::Error;

use super::step::TransferStep;
use crate::amount::Amount;
use crate::token::QueryError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    // === Validation Errors ===
    #[error("Sender and receiver are the same account ({0})")]
    SameAccount(Address),

    #[error("Credential controls {actual}, but the transfer is from {expected}")]
    CredentialMismatch { expected: Address, actual: Address },

    #[error("Insufficient funds: {account} holds {balance}, transfer needs {requested}")]
    InsufficientFunds {
        account: Address,
        balance: Amount,
        requested: Amount,
    },

    // === Network Errors ===
    #[error("Query failed during {step}: {reason}")]
    Query {
        step: TransferStep,
        account: Option<Address>,
        reason: String,
    },

    #[error("Timed out during {step} after {after:?}")]
    Timeout {
        step: TransferStep,
        account: Option<Address>,
        after: Duration,
    },

    // === Construction Errors ===
    #[error("Failed to encode transfer call: {0}")]
    Encoding(String),

    #[error("Failed to sign transaction: {0}")]
    Signing(String),

    // === Post-Broadcast Errors ===
    #[error("Node rejected transaction {tx_hash} (nonce {nonce}): {reason}")]
    Submission {
        tx_hash: B256,
        nonce: u64,
        reason: String,
    },

    #[error("Transaction {tx_hash} not confirmed within {after:?}")]
    ConfirmationTimeout { tx_hash: B256, after: Duration },

    #[error("Lost contact with node while waiting for {tx_hash}: {reason}")]
    Confirmation { tx_hash: B256, reason: String },

    #[error("Transaction {tx_hash} reverted in block {block_number}")]
    TransactionReverted { tx_hash: B256, block_number: u64 },

    #[error(
        "Balance of {account} is {observed} after transaction {tx_hash}, expected {expected}"
    )]
    InvariantViolation {
        tx_hash: B256,
        account: Address,
        expected: Amount,
        observed: Amount,
    },
}

impl TransferError {
    /// Balance read failure, tagged with the step it happened at
    pub fn from_query(step: TransferStep, err: QueryError) -> Self {
        match err {
            QueryError::Failed { account, reason } => TransferError::Query {
                step,
                account: Some(account),
                reason,
            },
            QueryError::Timeout { account, after } => TransferError::Timeout {
                step,
                account: Some(account),
                after,
            },
        }
    }

    /// Get the error code for logs and process output
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::SameAccount(_) => "SAME_ACCOUNT",
            TransferError::CredentialMismatch { .. } => "CREDENTIAL_MISMATCH",
            TransferError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            TransferError::Query { .. } => "QUERY_ERROR",
            TransferError::Timeout { .. } => "TIMEOUT",
            TransferError::Encoding(_) => "ENCODING_ERROR",
            TransferError::Signing(_) => "SIGNING_ERROR",
            TransferError::Submission { .. } => "SUBMISSION_ERROR",
            TransferError::ConfirmationTimeout { .. } => "CONFIRMATION_TIMEOUT",
            TransferError::Confirmation { .. } => "CONFIRMATION_ERROR",
            TransferError::TransactionReverted { .. } => "TRANSACTION_REVERTED",
            TransferError::InvariantViolation { .. } => "INVARIANT_VIOLATION",
        }
    }

    /// Step the transfer was at when this error was raised
    pub fn step(&self) -> TransferStep {
        match self {
            TransferError::SameAccount(_)
            | TransferError::CredentialMismatch { .. }
            | TransferError::InsufficientFunds { .. } => TransferStep::Validate,
            TransferError::Query { step, .. } | TransferError::Timeout { step, .. } => *step,
            TransferError::Encoding(_) => TransferStep::Encode,
            TransferError::Signing(_) => TransferStep::Sign,
            TransferError::Submission { .. } => TransferStep::Submit,
            TransferError::ConfirmationTimeout { .. }
            | TransferError::Confirmation { .. }
            | TransferError::TransactionReverted { .. } => TransferStep::Confirm,
            TransferError::InvariantViolation { .. } => TransferStep::Verify,
        }
    }

    /// The transaction may have reached the network; a retry could double-spend.
    pub fn is_post_broadcast(&self) -> bool {
        self.step().is_post_broadcast()
    }

    /// Hash of the transaction involved, once one exists
    pub fn tx_hash(&self) -> Option<B256> {
        match self {
            TransferError::Submission { tx_hash, .. }
            | TransferError::ConfirmationTimeout { tx_hash, .. }
            | TransferError::Confirmation { tx_hash, .. }
            | TransferError::TransactionReverted { tx_hash, .. }
            | TransferError::InvariantViolation { tx_hash, .. } => Some(*tx_hash),
            _ => None,
        }
    }
}
