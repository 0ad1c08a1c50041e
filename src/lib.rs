//! token_transfer - Verified ERC20 Transfers
//!
//! Reads balances, submits one signed `transfer` call, waits for the receipt
//! and checks that the ledger moved by exactly the transferred amount.
//!
//! # Modules
//!
//! - [`amount`] - Arbitrary-precision token amounts
//! - [`chain`] - Node access (`ChainClient`) and the JSON-RPC implementation
//! - [`contract`] - JSON ABI binding for call encoding/decoding
//! - [`credential`] - Signing keys
//! - [`token`] - Typed balance reads (`TokenAccessor`)
//! - [`transaction`] - Pending and signed transactions
//! - [`transfer`] - The transfer-and-verify orchestrator
//! - [`config`] - YAML configuration
//! - [`logging`] - tracing subscriber setup

pub mod amount;
pub mod chain;
pub mod config;
pub mod contract;
pub mod credential;
pub mod logging;
pub mod token;
pub mod transaction;
pub mod transfer;

// Convenient re-exports at crate root
pub use amount::{Amount, AmountError};
pub use chain::{ChainClient, ChainError, JsonRpcChainClient, Receipt};
pub use config::{AppConfig, ConfigError};
pub use contract::{BindingError, ContractBinding};
pub use credential::{Credential, CredentialError, LocalCredential};
pub use token::{BalanceSnapshot, QueryError, TokenAccessor};
pub use transaction::{PendingTransaction, SignedTransaction};
pub use transfer::{
    GasLimit, TransferError, TransferOrchestrator, TransferOutcome, TransferRequest,
    TransferSettings, TransferStep,
};
