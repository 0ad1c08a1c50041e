//! Transfer Orchestrator
//!
//! Drives one transfer through its steps in order:
//!
//! ```text
//! READ_BALANCES → VALIDATE → ENCODE → PREPARE → SIGN → SUBMIT → CONFIRM → VERIFY
//! ```
//!
//! Each step's failure aborts the remaining ones. Every node round trip is
//! bounded by a timeout. Nothing is retried, resubmitted or re-priced: once a
//! transaction has been submitted the chain may still include it even if this
//! call gave up waiting.
//!
//! Concurrent transfers from the same sender race on the pending nonce and
//! must be serialized by the caller.

use alloy::primitives::{Address, B256};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::error::TransferError;
use super::settings::{GasLimit, TransferSettings};
use super::step::TransferStep;
use super::types::{TransferOutcome, TransferRequest};
use crate::amount::Amount;
use crate::chain::{ChainClient, ChainError, Receipt};
use crate::credential::Credential;
use crate::token::{BalanceSnapshot, TokenAccessor};
use crate::transaction::PendingTransaction;

pub struct TransferOrchestrator {
    client: Arc<dyn ChainClient>,
    token: Arc<TokenAccessor>,
    credential: Arc<dyn Credential>,
    settings: TransferSettings,
}

impl TransferOrchestrator {
    pub fn new(
        client: Arc<dyn ChainClient>,
        token: Arc<TokenAccessor>,
        credential: Arc<dyn Credential>,
        settings: TransferSettings,
    ) -> Self {
        Self {
            client,
            token,
            credential,
            settings,
        }
    }

    /// Account the credential signs for
    pub fn sender(&self) -> Address {
        self.credential.address()
    }

    /// Move `request.amount` from sender to receiver and verify the balances.
    pub async fn transfer(&self, request: &TransferRequest) -> Result<TransferOutcome, TransferError> {
        let TransferRequest {
            sender,
            receiver,
            amount,
        } = request;
        let (sender, receiver) = (*sender, *receiver);

        if sender == receiver {
            return Err(TransferError::SameAccount(sender));
        }
        let signer = self.credential.address();
        if signer != sender {
            return Err(TransferError::CredentialMismatch {
                expected: sender,
                actual: signer,
            });
        }

        info!(
            sender = %sender,
            receiver = %receiver,
            amount = %amount,
            token = %self.token.token(),
            "Transfer started"
        );

        // Step 1: balances before
        let sender_before = self.read(TransferStep::ReadBalances, sender).await?;
        let receiver_before = self.read(TransferStep::ReadBalances, receiver).await?;
        info!(
            sender_balance = %sender_before.amount,
            receiver_balance = %receiver_before.amount,
            "Balances before transfer"
        );

        // Step 2: sufficiency, before anything is written
        let expected_sender = sender_before.amount.checked_sub(amount).ok_or_else(|| {
            TransferError::InsufficientFunds {
                account: sender,
                balance: sender_before.amount.clone(),
                requested: amount.clone(),
            }
        })?;
        let expected_receiver = receiver_before.amount.add(amount);

        // Step 3: payload
        let input = self
            .token
            .encode_transfer(receiver, amount)
            .map_err(|e| TransferError::Encoding(e.to_string()))?;

        // Step 4: nonce and gas price, fresh every time
        let nonce = self
            .rpc(TransferStep::Prepare, self.client.pending_nonce(sender))
            .await?;
        let gas_price = self
            .rpc(TransferStep::Prepare, self.client.gas_price())
            .await?;

        // Step 5: gas limit
        let gas_limit = match self.settings.gas_limit {
            GasLimit::Override(limit) => limit,
            GasLimit::Estimate => {
                self.rpc(
                    TransferStep::Prepare,
                    self.client
                        .estimate_gas(sender, self.token.token(), input.clone()),
                )
                .await?
            }
        };

        // Step 6: live chain id, then sign
        let chain_id = self.rpc(TransferStep::Sign, self.client.chain_id()).await?;
        debug!(nonce, gas_price, gas_limit, chain_id, "Transaction prepared");

        let pending = PendingTransaction::contract_call(
            self.token.token(),
            input,
            nonce,
            gas_price,
            gas_limit,
            chain_id,
        );
        let signed = self
            .credential
            .sign(pending)
            .map_err(|e| TransferError::Signing(e.to_string()))?;
        let tx_hash = signed.hash();

        // Step 7: broadcast exactly once
        let started = Instant::now();
        match tokio::time::timeout(self.settings.rpc_timeout, self.client.submit(&signed)).await {
            Ok(Ok(())) => {}
            Ok(Err(ChainError::Timeout(_))) => {
                return Err(TransferError::Timeout {
                    step: TransferStep::Submit,
                    account: Some(sender),
                    after: started.elapsed(),
                });
            }
            Ok(Err(e)) => {
                return Err(TransferError::Submission {
                    tx_hash,
                    nonce,
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(TransferError::Timeout {
                    step: TransferStep::Submit,
                    account: Some(sender),
                    after: self.settings.rpc_timeout,
                });
            }
        }
        info!(tx_hash = %tx_hash, nonce, "Transaction submitted");

        // Step 8: wait until mined
        let receipt = self.confirm(tx_hash).await?;

        // Step 9: reverted transactions skip the conservation check
        if !receipt.success {
            warn!(
                tx_hash = %tx_hash,
                block_number = receipt.block_number,
                "Transaction reverted"
            );
            self.log_balances_after_revert(sender, receiver).await;
            return Err(TransferError::TransactionReverted {
                tx_hash,
                block_number: receipt.block_number,
            });
        }
        info!(
            tx_hash = %tx_hash,
            block_number = receipt.block_number,
            gas_used = receipt.gas_used,
            "Transaction confirmed"
        );

        // Step 10: fresh snapshots, then conservation
        let sender_after = self.read(TransferStep::Verify, sender).await?;
        let receiver_after = self.read(TransferStep::Verify, receiver).await?;
        info!(
            sender_balance = %sender_after.amount,
            receiver_balance = %receiver_after.amount,
            "Balances after transfer"
        );

        Self::check_balance(tx_hash, &sender_after, &expected_sender)?;
        Self::check_balance(tx_hash, &receiver_after, &expected_receiver)?;

        info!(tx_hash = %tx_hash, amount = %amount, "Transfer verified");

        Ok(TransferOutcome {
            tx_hash,
            nonce,
            gas_limit,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            sender_before,
            receiver_before,
            sender_after,
            receiver_after,
        })
    }

    async fn read(&self, step: TransferStep, account: Address) -> Result<BalanceSnapshot, TransferError> {
        self.token
            .snapshot(account)
            .await
            .map_err(|e| TransferError::from_query(step, e))
    }

    /// One bounded node round trip outside of balance reads
    async fn rpc<T>(
        &self,
        step: TransferStep,
        call: impl Future<Output = Result<T, ChainError>>,
    ) -> Result<T, TransferError> {
        let started = Instant::now();
        match tokio::time::timeout(self.settings.rpc_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            // Transport-level timeout inside the client
            Ok(Err(ChainError::Timeout(_))) => Err(TransferError::Timeout {
                step,
                account: None,
                after: started.elapsed(),
            }),
            Ok(Err(e)) => Err(TransferError::Query {
                step,
                account: None,
                reason: e.to_string(),
            }),
            Err(_) => Err(TransferError::Timeout {
                step,
                account: None,
                after: self.settings.rpc_timeout,
            }),
        }
    }

    async fn confirm(&self, tx_hash: B256) -> Result<Receipt, TransferError> {
        let deadline = self.settings.confirmation_timeout;
        // Outer bound also covers a single receipt poll that hangs
        let hard_limit = deadline + self.settings.rpc_timeout;
        let wait = self
            .client
            .wait_for_receipt(tx_hash, deadline, self.settings.poll_interval);

        match tokio::time::timeout(hard_limit, wait).await {
            Ok(Ok(receipt)) => Ok(receipt),
            Ok(Err(ChainError::NotMined { .. })) | Err(_) => {
                warn!(tx_hash = %tx_hash, after = ?deadline, "Transaction not confirmed in time");
                Err(TransferError::ConfirmationTimeout {
                    tx_hash,
                    after: deadline,
                })
            }
            Ok(Err(e)) => {
                warn!(tx_hash = %tx_hash, error = %e, "Receipt poll failed");
                Err(TransferError::Confirmation {
                    tx_hash,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Diagnostic only; a failed read here does not change the outcome.
    async fn log_balances_after_revert(&self, sender: Address, receiver: Address) {
        for account in [sender, receiver] {
            match self.token.balance_of(account).await {
                Ok(balance) => warn!(account = %account, balance = %balance, "Balance after revert"),
                Err(e) => warn!(account = %account, error = %e, "Balance read after revert failed"),
            }
        }
    }

    fn check_balance(
        tx_hash: B256,
        observed: &BalanceSnapshot,
        expected: &Amount,
    ) -> Result<(), TransferError> {
        if observed.amount == *expected {
            return Ok(());
        }
        warn!(
            tx_hash = %tx_hash,
            account = %observed.account,
            expected = %expected,
            observed = %observed.amount,
            "Balance invariant violated"
        );
        Err(TransferError::InvariantViolation {
            tx_hash,
            account: observed.account,
            expected: expected.clone(),
            observed: observed.amount.clone(),
        })
    }
}

impl std::fmt::Debug for TransferOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferOrchestrator")
            .field("token", &self.token.token())
            .field("sender", &self.credential.address())
            .field("settings", &self.settings)
            .finish()
    }
}
