//! Token Transfer
//!
//! Moves tokens from the credential's account to a receiver and proves the
//! ledger moved by exactly the requested amount.
//!
//! # Flow
//!
//! ```text
//! READ_BALANCES → VALIDATE → ENCODE → PREPARE → SIGN → SUBMIT → CONFIRM → VERIFY
//!                    ↓                                            ↓
//!           INSUFFICIENT_FUNDS                          TRANSACTION_REVERTED
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Check-Before-Write**: Insufficient funds is reported before anything is signed
//! 2. **Submit-Once**: No resubmission, gas bumping or retry
//! 3. **Live Chain Id**: The id the signature commits to is read from the node per transfer
//! 4. **Conservation**: After a successful receipt, sender lost and receiver gained exactly `amount`

pub mod error;
pub mod orchestrator;
pub mod settings;
pub mod step;
pub mod types;


// Re-exports for convenience
pub use error::TransferError;
pub use orchestrator::TransferOrchestrator;
pub use settings::{GasLimit, TransferSettings};
pub use step::TransferStep;
pub use types::{TransferOutcome, TransferRequest};
