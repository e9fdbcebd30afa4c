//! JSON-RPC client for an Ethereum node.
//!
//! Methods:
//! - eth_chainId
//! - eth_call (at "latest")
//! - eth_getBlockByNumber("latest", false)
//! - eth_getTransactionReceipt

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use samm_types::{Result, SammError};

use crate::{ChainReader, Log};

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct BlockHeader {
    timestamp: String,
}

#[derive(Debug, Deserialize)]
struct Receipt {
    logs: Vec<Log>,
}

/// Read-only chain client over HTTP JSON-RPC.
pub struct RpcClient {
    url: String,
    client: reqwest::Client,
    timeout: Duration,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: &str, timeout_ms: Option<u64>) -> Self {
        let timeout_ms = timeout_ms.unwrap_or(20_000);
        Self {
            url: url.to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            timeout: Duration::from_millis(timeout_ms),
            next_id: AtomicU64::new(1),
        }
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<Option<T>> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        tracing::debug!(method, id = request.id, "rpc request");

        let resp = self
            .client
            .post(&self.url)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SammError::Rpc(format!("{method} request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(SammError::Rpc(format!("{method}: node returned status {}", resp.status())));
        }

        let body: RpcResponse<T> = resp
            .json()
            .await
            .map_err(|e| SammError::Rpc(format!("failed to parse {method} response: {e}")))?;

        if let Some(err) = body.error {
            return Err(SammError::Rpc(format!("{} (code {})", err.message, err.code)));
        }
        Ok(body.result)
    }

    async fn request_required<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        self.request(method, params)
            .await?
            .ok_or_else(|| SammError::Rpc(format!("{method}: empty result")))
    }
}

/// Parse a 0x-prefixed quantity as returned by the node.
pub fn parse_quantity(value: &str) -> Result<u64> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    u64::from_str_radix(digits, 16).map_err(|e| SammError::Rpc(format!("invalid quantity {value:?}: {e}")))
}

#[async_trait]
impl ChainReader for RpcClient {
    async fn chain_id(&self) -> Result<u64> {
        let id: String = self.request_required("eth_chainId", json!([])).await?;
        parse_quantity(&id)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.request_required("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    async fn latest_block_timestamp(&self) -> Result<u64> {
        let block: BlockHeader = self
            .request_required("eth_getBlockByNumber", json!(["latest", false]))
            .await
            .map_err(|e| SammError::Rpc(format!("Failed to get latest block: {e}")))?;
        parse_quantity(&block.timestamp)
    }

    async fn transaction_logs(&self, tx_hash: B256) -> Result<Option<Vec<Log>>> {
        let receipt: Option<Receipt> = self.request("eth_getTransactionReceipt", json!([tx_hash])).await?;
        Ok(receipt.map(|r| r.logs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x6553f100").unwrap(), 1_700_000_000);
        assert_eq!(parse_quantity("0xaa36a7").unwrap(), 11_155_111);
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn test_request_shape() {
        let req = RpcRequest {
            jsonrpc: "2.0",
            id: 7,
            method: "eth_call",
            params: json!([{ "to": Address::ZERO, "data": Bytes::from(vec![0xd0, 0x87, 0xd2, 0x88]) }, "latest"]),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["jsonrpc"], "2.0");
        assert_eq!(v["params"][0]["data"], "0xd087d288");
        assert_eq!(v["params"][1], "latest");
    }

    #[test]
    fn test_error_object_is_parsed() {
        let raw = r#"{"jsonrpc":"2.0","id":1,"error":{"code":3,"message":"execution reverted"}}"#;
        let resp: RpcResponse<Bytes> = serde_json::from_str(raw).unwrap();
        assert!(resp.result.is_none());
        assert_eq!(resp.error.unwrap().message, "execution reverted");
    }
}
