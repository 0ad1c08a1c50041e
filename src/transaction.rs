//! Transaction Types
//!
//! A [`PendingTransaction`] is built once per transfer from values read fresh
//! off the chain. Signing consumes it and yields a [`SignedTransaction`],
//! which is immutable and is what gets broadcast.

use alloy::primitives::{Address, B256, Bytes, U256};

/// Unsigned legacy (EIP-155) transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    /// Token contract address
    pub to: Address,
    /// Native value, always zero for token transfers
    pub value: U256,
    /// ABI-encoded call data
    pub input: Bytes,
    /// Chain id the signature commits to (replay protection)
    pub chain_id: u64,
}

impl PendingTransaction {
    /// Contract call carrying no native value.
    pub fn contract_call(
        to: Address,
        input: Bytes,
        nonce: u64,
        gas_price: u128,
        gas_limit: u64,
        chain_id: u64,
    ) -> Self {
        Self {
            nonce,
            gas_price,
            gas_limit,
            to,
            value: U256::ZERO,
            input,
            chain_id,
        }
    }
}

/// A signed transaction ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    tx: PendingTransaction,
    from: Address,
    hash: B256,
    raw: Bytes,
}

impl SignedTransaction {
    pub fn new(tx: PendingTransaction, from: Address, hash: B256, raw: Bytes) -> Self {
        Self {
            tx,
            from,
            hash,
            raw,
        }
    }

    pub fn tx(&self) -> &PendingTransaction {
        &self.tx
    }

    /// Address of the signing account
    pub fn signer(&self) -> Address {
        self.from
    }

    pub fn hash(&self) -> B256 {
        self.hash
    }

    /// EIP-2718 encoded bytes
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn nonce(&self) -> u64 {
        self.tx.nonce
    }
}
