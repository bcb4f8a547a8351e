//! Ledger JSON-RPC Client
//!
//! HTTP client for the node's JSON-RPC read API.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::error::{LedgerError, LedgerResult};
use super::types::{ChildRef, ObjectOptions, ObjectRecord, TransactionEffects};
use super::LedgerReader;

/// Page size requested from `iotax_getDynamicFields`
const DYNAMIC_FIELD_PAGE_SIZE: u32 = 50;

/// Ledger JSON-RPC client
pub struct RpcLedgerClient {
    client: Client,
    config: RpcConfig,
    next_id: AtomicU64,
}

/// Configuration for the JSON-RPC client
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Node URL (e.g., "https://api.testnet.iota.cafe")
    pub rpc_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Retries after a failed request; 0 means a single attempt
    pub max_retries: u32,
    /// How long to wait for a transaction to become visible
    pub wait_timeout_ms: u64,
    /// Delay between confirmation polls
    pub wait_poll_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.testnet.iota.cafe".to_string(),
            request_timeout_ms: 10_000,
            max_retries: 3,
            wait_timeout_ms: 30_000,
            wait_poll_ms: 500,
        }
    }
}

impl RpcConfig {
    /// Total attempts made for one request
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl RpcLedgerClient {
    /// Create a new client with the given configuration
    pub fn new(config: RpcConfig) -> LedgerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    /// Call a JSON-RPC method, retrying transport failures
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> LedgerResult<T> {
        let mut last_error = LedgerError::Unavailable;

        for attempt in 0..self.config.attempts() {
            if attempt > 0 {
                // Backoff: 1s, 4s, 9s...
                let delay = Duration::from_secs((attempt as u64).pow(2));
                tokio::time::sleep(delay).await;
            }

            let request = RpcRequest {
                jsonrpc: "2.0",
                id: self.next_id.fetch_add(1, Ordering::Relaxed),
                method,
                params: &params,
            };

            let response = match self
                .client
                .post(&self.config.rpc_url)
                .json(&request)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!(method, attempt, error = %e, "Ledger request failed");
                    last_error = map_transport_error(e);
                    continue;
                }
            };

            if response.status().as_u16() == 429 || response.status().is_server_error() {
                tracing::debug!(method, status = %response.status(), "Ledger node busy");
                last_error = LedgerError::Unavailable;
                continue;
            }

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                return Err(LedgerError::Rpc {
                    code: status.as_u16() as i64,
                    message: text,
                });
            }

            let body: RpcResponse<T> = response.json().await.map_err(LedgerError::Request)?;

            if let Some(err) = body.error {
                return Err(LedgerError::Rpc {
                    code: err.code,
                    message: err.message,
                });
            }

            return body
                .result
                .ok_or_else(|| LedgerError::Decode(format!("{} returned no result", method)));
        }

        Err(last_error)
    }
}

#[async_trait]
impl LedgerReader for RpcLedgerClient {
    async fn fetch_object(
        &self,
        id: &str,
        options: ObjectOptions,
    ) -> LedgerResult<Option<ObjectRecord>> {
        let params = json!([
            id,
            { "showContent": options.show_content, "showOwner": options.show_owner, "showType": true }
        ]);

        let response: GetObjectResponse = match self.call("iota_getObject", params).await {
            Ok(response) => response,
            Err(LedgerError::Rpc { message, .. }) if is_missing_object(&message) => {
                return Ok(None)
            }
            Err(e) => return Err(e),
        };

        if let Some(error) = response.error {
            tracing::debug!(object_id = id, error = %error, "Object not available");
        }

        Ok(response.data)
    }

    async fn fetch_children(&self, parent_id: &str) -> LedgerResult<Vec<ChildRef>> {
        let mut children = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let params = json!([parent_id, cursor, DYNAMIC_FIELD_PAGE_SIZE]);
            let page: DynamicFieldPage = self.call("iotax_getDynamicFields", params).await?;

            children.extend(
                page.data
                    .into_iter()
                    .map(|field| ChildRef::new(field.name.value, field.object_id)),
            );

            match (page.has_next_page, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        tracing::debug!(parent_id, count = children.len(), "Enumerated dynamic fields");
        Ok(children)
    }

    async fn wait_for_transaction(&self, digest: &str) -> LedgerResult<TransactionEffects> {
        let started = Instant::now();
        let timeout = Duration::from_millis(self.config.wait_timeout_ms);
        let params = json!([digest, { "showEffects": true }]);

        loop {
            match self
                .call::<TransactionBlockResponse>("iota_getTransactionBlock", params.clone())
                .await
            {
                Ok(TransactionBlockResponse {
                    effects: Some(effects),
                    ..
                }) => {
                    if !effects.status.is_success() {
                        return Err(LedgerError::ExecutionFailed(
                            effects
                                .status
                                .error
                                .unwrap_or_else(|| effects.status.status.clone()),
                        ));
                    }
                    return Ok(effects);
                }
                // Not indexed yet
                Ok(_) | Err(LedgerError::Rpc { .. }) => {}
                Err(e) => return Err(e),
            }

            if started.elapsed() >= timeout {
                return Err(LedgerError::ConfirmationTimeout {
                    digest: digest.to_string(),
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }

            tokio::time::sleep(Duration::from_millis(self.config.wait_poll_ms)).await;
        }
    }
}

fn map_transport_error(e: reqwest::Error) -> LedgerError {
    if e.is_timeout() {
        LedgerError::Timeout
    } else if e.is_connect() {
        LedgerError::Unavailable
    } else {
        LedgerError::Request(e)
    }
}

fn is_missing_object(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("notexists") || lower.contains("not exist") || lower.contains("deleted")
}

// ============================================
// JSON-RPC envelopes
// ============================================

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct GetObjectResponse {
    #[serde(default)]
    data: Option<ObjectRecord>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DynamicFieldPage {
    #[serde(default)]
    data: Vec<DynamicFieldInfo>,
    #[serde(default)]
    next_cursor: Option<String>,
    #[serde(default)]
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DynamicFieldInfo {
    name: DynamicFieldName,
    object_id: String,
}

#[derive(Debug, Deserialize)]
struct DynamicFieldName {
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct TransactionBlockResponse {
    #[serde(default)]
    effects: Option<TransactionEffects>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RpcConfig::default();
        assert_eq!(config.rpc_url, "https://api.testnet.iota.cafe");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.attempts(), 4);
    }

    #[test]
    fn test_zero_retries_is_one_attempt() {
        let config = RpcConfig {
            max_retries: 0,
            ..Default::default()
        };
        assert_eq!(config.attempts(), 1);
    }

    #[test]
    fn test_dynamic_field_page_parsing() {
        let page: DynamicFieldPage = serde_json::from_value(json!({
            "data": [
                {
                    "name": { "type": "u64", "value": "0" },
                    "bcsName": "11111111",
                    "type": "DynamicField",
                    "objectType": "0xpkg::timeline::Post",
                    "objectId": "0xchild0",
                    "version": 5,
                    "digest": "x"
                }
            ],
            "nextCursor": "0xchild0",
            "hasNextPage": false
        }))
        .unwrap();

        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].name.value, json!("0"));
        assert_eq!(page.data[0].object_id, "0xchild0");
        assert!(!page.has_next_page);
    }

    #[test]
    fn test_get_object_error_response() {
        let response: GetObjectResponse = serde_json::from_value(json!({
            "error": { "code": "notExists", "object_id": "0xgone" }
        }))
        .unwrap();
        assert!(response.data.is_none());
        assert!(response.error.is_some());
    }

    #[test]
    fn test_rpc_error_envelope() {
        let body: RpcResponse<Value> = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32602, "message": "Could not find the referenced transaction" }
        }))
        .unwrap();
        assert!(body.result.is_none());
        assert_eq!(body.error.unwrap().code, -32602);
    }

    #[test]
    fn test_missing_object_detection() {
        assert!(is_missing_object("Object 0x1 notExists"));
        assert!(is_missing_object("object does not exist"));
        assert!(!is_missing_object("Invalid params"));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_reported() {
        let client = RpcLedgerClient::new(RpcConfig {
            rpc_url: "http://127.0.0.1:9".to_string(),
            request_timeout_ms: 500,
            max_retries: 0,
            ..Default::default()
        })
        .unwrap();

        let result = client.fetch_object("0x1", ObjectOptions::content()).await;
        assert!(result.is_err());
    }
}
