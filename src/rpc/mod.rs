//! Ledger RPC layer
//!
//! The engine talks to the ledger node through the [`LedgerRpc`] trait:
//! non-mutating contract calls and transaction receipt lookups. The
//! production implementation is [`HttpRpcClient`], a JSON-RPC 2.0 client over
//! HTTP; tests substitute an in-memory implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::types::{Receipt, TxHash};
use crate::utils::Address;

/// Default timeout for a single RPC round trip
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 12;

/// Read access to the ledger
///
/// Receipt lookups distinguish "no receipt yet" (`Ok(None)`) from hard
/// failures (`Err`); the confirmation poller retries only on the former.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Perform a non-mutating contract call and return the raw output bytes
    async fn call(&self, to: &Address, data: &[u8]) -> Result<Vec<u8>>;

    /// Look up the receipt for a transaction, if one exists yet
    async fn transaction_receipt(&self, hash: &TxHash) -> Result<Option<Receipt>>;
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 client over HTTP
pub struct HttpRpcClient {
    client: Client,
    endpoint: String,
    request_id: AtomicU64,
}

impl HttpRpcClient {
    /// Create a client for the given RPC endpoint URL
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            endpoint: endpoint.into(),
            request_id: AtomicU64::new(1),
        }
    }

    /// The RPC endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Issue a raw JSON-RPC request
    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        trace!(method, id, "Sending RPC request");

        let response: JsonRpcResponse = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = response.error {
            debug!(method, code = err.code, "RPC node returned error");
            return Err(Error::read_failed(format!(
                "{} failed: {} (code {})",
                method, err.message, err.code
            )));
        }

        response
            .result
            .ok_or_else(|| Error::read_failed(format!("{}: response had no result", method)))
    }
}

#[async_trait]
impl LedgerRpc for HttpRpcClient {
    async fn call(&self, to: &Address, data: &[u8]) -> Result<Vec<u8>> {
        let params = json!([
            {
                "to": to.to_hex(),
                "data": format!("0x{}", hex::encode(data)),
            },
            "latest_state"
        ]);
        let result = self.request("cfx_call", params).await?;
        let output = result
            .as_str()
            .ok_or_else(|| Error::read_failed("cfx_call returned a non-string result"))?;
        hex::decode(output.trim_start_matches("0x"))
            .map_err(|e| Error::read_failed(format!("cfx_call returned invalid hex: {}", e)))
    }

    async fn transaction_receipt(&self, hash: &TxHash) -> Result<Option<Receipt>> {
        let result = self
            .request("cfx_getTransactionReceipt", json!([hash.as_str()]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let receipt: Receipt = serde_json::from_value(result)
            .map_err(|e| Error::read_failed(format!("malformed receipt: {}", e)))?;
        Ok(Some(receipt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_response_parsing() {
        let ok: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":"0x00"}"#).unwrap();
        assert!(ok.error.is_none());
        assert_eq!(ok.result.unwrap(), "0x00");

        let err: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":2,"error":{"code":-32602,"message":"bad params"}}"#,
        )
        .unwrap();
        let err = err.error.unwrap();
        assert_eq!(err.code, -32602);
        assert_eq!(err.message, "bad params");
    }
}
