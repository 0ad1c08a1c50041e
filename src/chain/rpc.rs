//! JSON-RPC Chain Client
//!
//! Talks to an Ethereum node (Geth, Anvil, Ganache) over HTTP using the
//! standard `eth_*` methods. Quantities come back as `0x`-prefixed hex and
//! are parsed strictly: a malformed value is a decode error, never zero.

use alloy::primitives::{Address, B256, Bytes};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use super::client::{ChainClient, ChainError, Receipt};
use crate::transaction::SignedTransaction;

/// Serializes as `[]`; some nodes reject `null` params
const NO_PARAMS: [u8; 0] = [];

/// JSON-RPC request structure
#[derive(Serialize)]
struct JsonRpcRequest<T> {
    jsonrpc: &'static str,
    method: &'static str,
    params: T,
    id: u64,
}

/// JSON-RPC response structure
#[derive(Deserialize)]
struct JsonRpcResponse<T> {
    #[allow(dead_code)]
    jsonrpc: String,
    result: Option<T>,
    error: Option<JsonRpcError>,
    /// `null` when the node could not parse the request
    #[allow(dead_code)]
    #[serde(default)]
    id: Option<u64>,
}

impl<T> JsonRpcResponse<T> {
    /// An `error` object wins over any `result`
    fn into_result(self) -> Result<Option<T>, ChainError> {
        match self.error {
            Some(error) => Err(ChainError::Node {
                code: error.code,
                message: error.message,
            }),
            None => Ok(self.result),
        }
    }
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// `eth_call` / `eth_estimateGas` call object
#[derive(Serialize, Debug)]
struct CallObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<String>,
    to: String,
    data: String,
}

/// Receipt structure from RPC
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: String,
    block_number: Option<String>,
    status: Option<String>,
    gas_used: String,
}

pub struct JsonRpcChainClient {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcChainClient {
    pub fn new(url: &str, request_timeout: Duration) -> Result<Self, ChainError> {
        info!("Connecting to chain node at {}", url);

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ChainError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url: url.to_string(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Make a JSON-RPC call whose result may legitimately be `null`
    async fn rpc_call_optional<T, R>(
        &self,
        method: &'static str,
        params: T,
    ) -> Result<Option<R>, ChainError>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChainError::Timeout(format!("{} request timed out", method))
                } else {
                    ChainError::Transport(format!("{} request failed: {}", method, e))
                }
            })?;

        let rpc_response: JsonRpcResponse<R> = response.json().await.map_err(|e| {
            ChainError::Decode(format!("Failed to parse {} response: {}", method, e))
        })?;

        rpc_response.into_result()
    }

    async fn rpc_call<T, R>(&self, method: &'static str, params: T) -> Result<R, ChainError>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        self.rpc_call_optional(method, params)
            .await?
            .ok_or_else(|| ChainError::Decode(format!("No result in {} response", method)))
    }
}

#[async_trait]
impl ChainClient for JsonRpcChainClient {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let call = CallObject {
            from: None,
            to: encode_address(to),
            data: encode_bytes(&data),
        };
        let result: String = self.rpc_call("eth_call", (call, "latest")).await?;
        decode_bytes(&result)
    }

    async fn pending_nonce(&self, account: Address) -> Result<u64, ChainError> {
        let result: String = self
            .rpc_call(
                "eth_getTransactionCount",
                (encode_address(account), "pending"),
            )
            .await?;
        parse_quantity_u64(&result)
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        let result: String = self.rpc_call("eth_gasPrice", NO_PARAMS).await?;
        parse_quantity(&result)
    }

    async fn estimate_gas(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
    ) -> Result<u64, ChainError> {
        let call = CallObject {
            from: Some(encode_address(from)),
            to: encode_address(to),
            data: encode_bytes(&data),
        };
        let result: String = self.rpc_call("eth_estimateGas", (call,)).await?;
        parse_quantity_u64(&result)
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        let result: String = self.rpc_call("eth_chainId", NO_PARAMS).await?;
        parse_quantity_u64(&result)
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<(), ChainError> {
        let returned: String = self
            .rpc_call("eth_sendRawTransaction", (encode_bytes(tx.raw()),))
            .await?;

        let node_hash = decode_hash(&returned)?;
        if node_hash != tx.hash() {
            return Err(ChainError::Decode(format!(
                "Node reported hash {} for transaction {}",
                node_hash,
                tx.hash()
            )));
        }

        debug!(tx_hash = %node_hash, "Raw transaction accepted by node");
        Ok(())
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<Receipt>, ChainError> {
        let receipt: Option<RpcReceipt> = self
            .rpc_call_optional("eth_getTransactionReceipt", (encode_bytes(tx_hash.as_slice()),))
            .await?;

        match receipt {
            // Some nodes return a receipt with a null block number for pending txs
            Some(RpcReceipt {
                block_number: None,
                ..
            })
            | None => Ok(None),
            Some(r) => Ok(Some(convert_receipt(r)?)),
        }
    }
}

fn convert_receipt(r: RpcReceipt) -> Result<Receipt, ChainError> {
    let status = r
        .status
        .as_deref()
        .ok_or_else(|| ChainError::Decode("Receipt has no status field (pre-Byzantium?)".into()))?;

    Ok(Receipt {
        tx_hash: decode_hash(&r.transaction_hash)?,
        success: parse_quantity(status)? == 1,
        block_number: parse_quantity_u64(r.block_number.as_deref().unwrap_or_default())?,
        gas_used: parse_quantity_u64(&r.gas_used)?,
    })
}

fn encode_address(address: Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

fn encode_bytes(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

fn decode_bytes(s: &str) -> Result<Bytes, ChainError> {
    let stripped = s
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::Decode(format!("Missing 0x prefix: {}", s)))?;
    hex::decode(stripped)
        .map(Bytes::from)
        .map_err(|e| ChainError::Decode(format!("Invalid hex data {}: {}", s, e)))
}

fn decode_hash(s: &str) -> Result<B256, ChainError> {
    let bytes = decode_bytes(s)?;
    if bytes.len() != 32 {
        return Err(ChainError::Decode(format!("Invalid hash length: {}", s)));
    }
    Ok(B256::from_slice(&bytes))
}

/// Parse a hex quantity (`0x1a`).
fn parse_quantity(s: &str) -> Result<u128, ChainError> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::Decode(format!("Missing 0x prefix: {:?}", s)))?;
    if digits.is_empty() {
        return Err(ChainError::Decode(format!("Empty quantity: {:?}", s)));
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| ChainError::Decode(format!("Invalid quantity {:?}: {}", s, e)))
}

fn parse_quantity_u64(s: &str) -> Result<u64, ChainError> {
    let value = parse_quantity(s)?;
    u64::try_from(value).map_err(|_| ChainError::Decode(format!("Quantity {} exceeds u64", s)))
}
