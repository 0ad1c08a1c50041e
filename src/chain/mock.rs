//! In-memory chain for tests
//!
//! Simulates a single ERC20 token: `balanceOf` / `allowance` reads are served
//! from a ledger, and submitted `transfer` transactions are "mined"
//! immediately by applying them to that ledger. Failure switches mirror the
//! ways a real node can misbehave.

use super::*;
use alloy::primitives::{Address, B256, Bytes, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::transaction::SignedTransaction;

const BALANCE_OF: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];
const ALLOWANCE: [u8; 4] = [0xdd, 0x62, 0xed, 0x3e];
const TRANSFER: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

pub const MOCK_GAS_ESTIMATE: u64 = 52_000;
pub const MOCK_GAS_PRICE: u128 = 2_000_000_000;

pub struct MockChain {
    token: Address,
    chain_id: u64,
    balances: Mutex<HashMap<Address, U256>>,
    allowances: Mutex<HashMap<(Address, Address), U256>>,
    nonces: Mutex<HashMap<Address, u64>>,
    receipts: Mutex<HashMap<B256, Receipt>>,
    submitted: Mutex<Vec<SignedTransaction>>,
    block_number: AtomicU64,
    /// Call counters for verification
    balance_reads: AtomicUsize,
    submit_count: AtomicUsize,
    receipt_polls: AtomicUsize,
    chain_id_calls: AtomicUsize,
    estimate_calls: AtomicUsize,
    /// Configured behavior
    fail_reads: Mutex<bool>,
    hang_reads: Mutex<bool>,
    reject_submit: Mutex<bool>,
    revert: Mutex<bool>,
    never_mine: Mutex<bool>,
    fail_receipt_poll: Mutex<bool>,
    timeout_receipt_poll: Mutex<bool>,
    /// Nonce, gas price and gas estimate
    fail_prepare: Mutex<bool>,
    hang_prepare: Mutex<bool>,
    fail_chain_id: Mutex<bool>,
    hang_submit: Mutex<bool>,
    timeout_submit: Mutex<bool>,
    fail_reads_after_submit: Mutex<bool>,
    /// Fee-on-transfer skim in basis points (non-standard token)
    fee_bps: Mutex<u64>,
}

impl MockChain {
    pub fn new(token: Address, chain_id: u64) -> Self {
        Self {
            token,
            chain_id,
            balances: Mutex::new(HashMap::new()),
            allowances: Mutex::new(HashMap::new()),
            nonces: Mutex::new(HashMap::new()),
            receipts: Mutex::new(HashMap::new()),
            submitted: Mutex::new(Vec::new()),
            block_number: AtomicU64::new(100),
            balance_reads: AtomicUsize::new(0),
            submit_count: AtomicUsize::new(0),
            receipt_polls: AtomicUsize::new(0),
            chain_id_calls: AtomicUsize::new(0),
            estimate_calls: AtomicUsize::new(0),
            fail_reads: Mutex::new(false),
            hang_reads: Mutex::new(false),
            reject_submit: Mutex::new(false),
            revert: Mutex::new(false),
            never_mine: Mutex::new(false),
            fail_receipt_poll: Mutex::new(false),
            timeout_receipt_poll: Mutex::new(false),
            fail_prepare: Mutex::new(false),
            hang_prepare: Mutex::new(false),
            fail_chain_id: Mutex::new(false),
            hang_submit: Mutex::new(false),
            timeout_submit: Mutex::new(false),
            fail_reads_after_submit: Mutex::new(false),
            fee_bps: Mutex::new(0),
        }
    }

    pub fn set_balance(&self, account: Address, amount: u64) {
        self.balances
            .lock()
            .unwrap()
            .insert(account, U256::from(amount));
    }

    pub fn balance(&self, account: Address) -> U256 {
        self.balances
            .lock()
            .unwrap()
            .get(&account)
            .copied()
            .unwrap_or(U256::ZERO)
    }

    pub fn set_allowance(&self, owner: Address, spender: Address, amount: u64) {
        self.allowances
            .lock()
            .unwrap()
            .insert((owner, spender), U256::from(amount));
    }

    pub fn set_fail_reads(&self, fail: bool) {
        *self.fail_reads.lock().unwrap() = fail;
    }

    pub fn set_hang_reads(&self, hang: bool) {
        *self.hang_reads.lock().unwrap() = hang;
    }

    pub fn set_reject_submit(&self, reject: bool) {
        *self.reject_submit.lock().unwrap() = reject;
    }

    pub fn set_revert(&self, revert: bool) {
        *self.revert.lock().unwrap() = revert;
    }

    pub fn set_never_mine(&self, never: bool) {
        *self.never_mine.lock().unwrap() = never;
    }

    pub fn set_fail_receipt_poll(&self, fail: bool) {
        *self.fail_receipt_poll.lock().unwrap() = fail;
    }

    /// Receipt polls fail with a transport-level timeout
    pub fn set_timeout_receipt_poll(&self, timeout: bool) {
        *self.timeout_receipt_poll.lock().unwrap() = timeout;
    }

    pub fn set_fail_prepare(&self, fail: bool) {
        *self.fail_prepare.lock().unwrap() = fail;
    }

    pub fn set_hang_prepare(&self, hang: bool) {
        *self.hang_prepare.lock().unwrap() = hang;
    }

    pub fn set_fail_chain_id(&self, fail: bool) {
        *self.fail_chain_id.lock().unwrap() = fail;
    }

    pub fn set_hang_submit(&self, hang: bool) {
        *self.hang_submit.lock().unwrap() = hang;
    }

    /// Submission fails with a transport-level timeout
    pub fn set_timeout_submit(&self, timeout: bool) {
        *self.timeout_submit.lock().unwrap() = timeout;
    }

    /// Reads succeed until the first submission, then fail
    pub fn set_fail_reads_after_submit(&self, fail: bool) {
        *self.fail_reads_after_submit.lock().unwrap() = fail;
    }

    pub fn set_fee_bps(&self, bps: u64) {
        *self.fee_bps.lock().unwrap() = bps;
    }

    pub fn balance_reads(&self) -> usize {
        self.balance_reads.load(Ordering::SeqCst)
    }

    pub fn submit_count(&self) -> usize {
        self.submit_count.load(Ordering::SeqCst)
    }

    pub fn receipt_polls(&self) -> usize {
        self.receipt_polls.load(Ordering::SeqCst)
    }

    pub fn chain_id_calls(&self) -> usize {
        self.chain_id_calls.load(Ordering::SeqCst)
    }

    pub fn estimate_calls(&self) -> usize {
        self.estimate_calls.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<SignedTransaction> {
        self.submitted.lock().unwrap().clone()
    }

    async fn prepare_gate(&self) -> Result<(), ChainError> {
        let hang = *self.hang_prepare.lock().unwrap();
        if hang {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if *self.fail_prepare.lock().unwrap() {
            return Err(ChainError::Transport("Mock connection reset".to_string()));
        }
        Ok(())
    }

    fn word(value: U256) -> Bytes {
        Bytes::from(value.to_be_bytes::<32>().to_vec())
    }

    fn address_arg(data: &[u8], index: usize) -> Address {
        let start = 4 + index * 32;
        Address::from_slice(&data[start + 12..start + 32])
    }

    fn uint_arg(data: &[u8], index: usize) -> U256 {
        let start = 4 + index * 32;
        U256::from_be_slice(&data[start..start + 32])
    }

    /// Apply a mined transfer; returns whether it executed successfully.
    fn execute_transfer(&self, from: Address, input: &[u8]) -> bool {
        if input.len() < 68 || input[..4] != TRANSFER {
            return false;
        }
        let to = Self::address_arg(input, 0);
        let amount = Self::uint_arg(input, 1);
        let fee = amount * U256::from(*self.fee_bps.lock().unwrap()) / U256::from(10_000u64);

        let mut balances = self.balances.lock().unwrap();
        let from_balance = balances.get(&from).copied().unwrap_or(U256::ZERO);
        if from_balance < amount {
            return false;
        }
        balances.insert(from, from_balance - amount);
        let to_balance = balances.get(&to).copied().unwrap_or(U256::ZERO);
        balances.insert(to, to_balance + amount - fee);
        true
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let hang = *self.hang_reads.lock().unwrap();
        if hang {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        let after_submit =
            *self.fail_reads_after_submit.lock().unwrap() && self.submit_count() > 0;
        if *self.fail_reads.lock().unwrap() || after_submit {
            return Err(ChainError::Transport("Mock connection refused".to_string()));
        }
        if to != self.token || data.len() < 4 {
            return Err(ChainError::Node {
                code: 3,
                message: "execution reverted".to_string(),
            });
        }

        let mut selector = [0u8; 4];
        selector.copy_from_slice(&data[..4]);

        match selector {
            BALANCE_OF => {
                self.balance_reads.fetch_add(1, Ordering::SeqCst);
                Ok(Self::word(self.balance(Self::address_arg(&data, 0))))
            }
            ALLOWANCE => {
                let key = (Self::address_arg(&data, 0), Self::address_arg(&data, 1));
                let allowance = self
                    .allowances
                    .lock()
                    .unwrap()
                    .get(&key)
                    .copied()
                    .unwrap_or(U256::ZERO);
                Ok(Self::word(allowance))
            }
            _ => Err(ChainError::Node {
                code: 3,
                message: "execution reverted: unknown selector".to_string(),
            }),
        }
    }

    async fn pending_nonce(&self, account: Address) -> Result<u64, ChainError> {
        self.prepare_gate().await?;
        Ok(*self.nonces.lock().unwrap().get(&account).unwrap_or(&0))
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        self.prepare_gate().await?;
        Ok(MOCK_GAS_PRICE)
    }

    async fn estimate_gas(
        &self,
        _from: Address,
        _to: Address,
        _data: Bytes,
    ) -> Result<u64, ChainError> {
        self.estimate_calls.fetch_add(1, Ordering::SeqCst);
        self.prepare_gate().await?;
        Ok(MOCK_GAS_ESTIMATE)
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        self.chain_id_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_chain_id.lock().unwrap() {
            return Err(ChainError::Node {
                code: -32601,
                message: "the method eth_chainId does not exist".to_string(),
            });
        }
        Ok(self.chain_id)
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<(), ChainError> {
        self.submit_count.fetch_add(1, Ordering::SeqCst);

        let hang = *self.hang_submit.lock().unwrap();
        if hang {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if *self.timeout_submit.lock().unwrap() {
            return Err(ChainError::Timeout(
                "eth_sendRawTransaction request timed out".to_string(),
            ));
        }
        if *self.reject_submit.lock().unwrap() {
            return Err(ChainError::Node {
                code: -32000,
                message: "replacement transaction underpriced".to_string(),
            });
        }

        self.submitted.lock().unwrap().push(tx.clone());
        *self.nonces.lock().unwrap().entry(tx.signer()).or_insert(0) += 1;

        if *self.never_mine.lock().unwrap() {
            return Ok(());
        }

        let reverted = *self.revert.lock().unwrap();
        let success = !reverted && self.execute_transfer(tx.signer(), &tx.tx().input);
        let receipt = Receipt {
            tx_hash: tx.hash(),
            success,
            block_number: self.block_number.fetch_add(1, Ordering::SeqCst) + 1,
            gas_used: MOCK_GAS_ESTIMATE,
        };
        self.receipts.lock().unwrap().insert(tx.hash(), receipt);
        Ok(())
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<Receipt>, ChainError> {
        self.receipt_polls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_receipt_poll.lock().unwrap() {
            return Err(ChainError::Transport("Mock node went away".to_string()));
        }
        if *self.timeout_receipt_poll.lock().unwrap() {
            return Err(ChainError::Timeout(
                "eth_getTransactionReceipt request timed out".to_string(),
            ));
        }
        Ok(self.receipts.lock().unwrap().get(&tx_hash).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const TOKEN: Address = address!("0x79b168E4d21DF857168ad29c1c74856984e6448A");
    const ALICE: Address = address!("0xA2f4bc15b5046E72DFf903749D721CFDfC945ed6");

    #[tokio::test]
    async fn test_mock_balance_read() {
        let chain = MockChain::new(TOKEN, 1337);
        chain.set_balance(ALICE, 1000);

        let mut data = BALANCE_OF.to_vec();
        data.extend_from_slice(&[0u8; 12]);
        data.extend_from_slice(ALICE.as_slice());

        let result = chain.call(TOKEN, Bytes::from(data)).await.unwrap();
        assert_eq!(U256::from_be_slice(&result), U256::from(1000u64));
        assert_eq!(chain.balance_reads(), 1);
    }

    #[tokio::test]
    async fn test_mock_read_failure() {
        let chain = MockChain::new(TOKEN, 1337);
        chain.set_fail_reads(true);

        let result = chain.call(TOKEN, Bytes::from(BALANCE_OF.to_vec())).await;
        assert!(matches!(result, Err(ChainError::Transport(_))));
    }

    #[tokio::test]
    async fn test_mock_wrong_contract_reverts() {
        let chain = MockChain::new(TOKEN, 1337);
        let result = chain.call(ALICE, Bytes::from(BALANCE_OF.to_vec())).await;
        assert!(matches!(result, Err(ChainError::Node { code: 3, .. })));
    }

    #[tokio::test]
    async fn test_wait_for_receipt_times_out() {
        let chain = MockChain::new(TOKEN, 1337);

        let result = chain
            .wait_for_receipt(
                B256::repeat_byte(0xab),
                Duration::from_millis(50),
                Duration::from_millis(10),
            )
            .await;

        assert!(matches!(
            result,
            Err(ChainError::NotMined { after, .. }) if after == Duration::from_millis(50)
        ));
        assert!(chain.receipt_polls() >= 2);
    }

    #[tokio::test]
    async fn test_wait_for_receipt_propagates_poll_error() {
        let chain = MockChain::new(TOKEN, 1337);
        chain.set_fail_receipt_poll(true);

        let result = chain
            .wait_for_receipt(
                B256::repeat_byte(0xab),
                Duration::from_millis(50),
                Duration::from_millis(10),
            )
            .await;

        assert!(matches!(result, Err(ChainError::Transport(_))));
        assert_eq!(chain.receipt_polls(), 1);
    }
}
