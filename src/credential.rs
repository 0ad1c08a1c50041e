//! Signing Credentials
//!
//! The orchestrator only needs two things from a credential: the account it
//! controls and a way to sign a [`PendingTransaction`]. Keys never leave the
//! credential; the private key for [`LocalCredential`] is read from the
//! environment, never from the config file.

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, Bytes, TxKind};
use alloy::signers::local::PrivateKeySigner;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::transaction::{PendingTransaction, SignedTransaction};

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Private key not found in environment variable {0}")]
    MissingKey(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

/// Signing capability for one account.
pub trait Credential: Send + Sync {
    /// Account identifier derived from the key
    fn address(&self) -> Address;

    /// Sign the transaction for the chain id it carries.
    fn sign(&self, tx: PendingTransaction) -> Result<SignedTransaction, CredentialError>;
}

/// secp256k1 key held in process memory.
pub struct LocalCredential {
    signer: PrivateKeySigner,
}

impl LocalCredential {
    /// Parse a hex private key (with or without `0x`).
    pub fn from_hex(key: &str) -> Result<Self, CredentialError> {
        let signer = PrivateKeySigner::from_str(key.trim())
            .map_err(|e| CredentialError::InvalidKey(e.to_string()))?;
        Ok(Self { signer })
    }

    pub fn from_env(var: &str) -> Result<Self, CredentialError> {
        let key =
            std::env::var(var).map_err(|_| CredentialError::MissingKey(var.to_string()))?;
        Self::from_hex(&key)
    }
}

impl fmt::Debug for LocalCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalCredential")
            .field("address", &self.signer.address())
            .finish_non_exhaustive()
    }
}

impl Credential for LocalCredential {
    fn address(&self) -> Address {
        self.signer.address()
    }

    fn sign(&self, tx: PendingTransaction) -> Result<SignedTransaction, CredentialError> {
        let mut legacy = TxLegacy {
            chain_id: Some(tx.chain_id),
            nonce: tx.nonce,
            gas_price: tx.gas_price,
            gas_limit: tx.gas_limit,
            to: TxKind::Call(tx.to),
            value: tx.value,
            input: tx.input.clone(),
        };

        let signature = self
            .signer
            .sign_transaction_sync(&mut legacy)
            .map_err(|e| CredentialError::Signing(e.to_string()))?;

        let signed = legacy.into_signed(signature);
        let hash = *signed.hash();
        let raw = Bytes::from(TxEnvelope::Legacy(signed).encoded_2718());

        debug!(tx_hash = %hash, nonce = tx.nonce, chain_id = tx.chain_id, "Transaction signed");

        Ok(SignedTransaction::new(tx, self.signer.address(), hash, raw))
    }
}
