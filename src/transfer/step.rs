//! Transfer Step Definitions
//!
//! A transfer runs its steps strictly in order. Errors are tagged with the
//! step that raised them so callers can tell a pre-flight rejection from a
//! failure after the transaction left the process.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransferStep {
    /// Sender and receiver balances read before the transfer
    ReadBalances,

    /// Sufficiency check and request sanity checks (no network)
    Validate,

    /// Transfer call data encoded
    Encode,

    /// Nonce, gas price and gas limit fetched
    Prepare,

    /// Chain id fetched and transaction signed
    Sign,

    /// Raw transaction broadcast
    Submit,

    /// Waiting for the receipt
    Confirm,

    /// Balances re-read and conservation checked
    Verify,
}

impl TransferStep {
    /// All steps in execution order
    pub const ALL: [TransferStep; 8] = [
        TransferStep::ReadBalances,
        TransferStep::Validate,
        TransferStep::Encode,
        TransferStep::Prepare,
        TransferStep::Sign,
        TransferStep::Submit,
        TransferStep::Confirm,
        TransferStep::Verify,
    ];

    /// Whether the transaction may already be on its way to the chain
    ///
    /// A failure at `Submit` counts: the node may have relayed the
    /// transaction before the error came back.
    #[inline]
    pub fn is_post_broadcast(&self) -> bool {
        matches!(
            self,
            TransferStep::Submit | TransferStep::Confirm | TransferStep::Verify
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStep::ReadBalances => "READ_BALANCES",
            TransferStep::Validate => "VALIDATE",
            TransferStep::Encode => "ENCODE",
            TransferStep::Prepare => "PREPARE",
            TransferStep::Sign => "SIGN",
            TransferStep::Submit => "SUBMIT",
            TransferStep::Confirm => "CONFIRM",
            TransferStep::Verify => "VERIFY",
        }
    }
}

impl fmt::Display for TransferStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
