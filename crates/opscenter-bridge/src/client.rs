//! HTTP client for the bridge's `/mcp` endpoint.

use crate::error::BridgeError;
use crate::protocol::{
    CallToolParams, CallToolResult, JsonRpcRequest, JsonRpcResponse, METHOD_TOOLS_CALL,
};
use async_trait::async_trait;
use opscenter_core::BridgeConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Something that can run a finance tool.
#[async_trait]
pub trait FinanceBridge: Send + Sync {
    /// Run one tool call. A tool-level failure (`isError`) is an error.
    async fn call_tool(&self, params: CallToolParams) -> Result<CallToolResult, BridgeError>;
}

/// JSON-RPC over HTTP client.
pub struct HttpBridgeClient {
    client: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl HttpBridgeClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BridgeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/mcp", base_url.trim_end_matches('/')),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(cfg: &BridgeConfig) -> Result<Self, BridgeError> {
        Self::new(&cfg.url, Duration::from_secs(cfg.timeout_secs))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl FinanceBridge for HttpBridgeClient {
    async fn call_tool(&self, params: CallToolParams) -> Result<CallToolResult, BridgeError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let tool = params.name.clone();
        let body = serde_json::to_value(&params)
            .map_err(|e| BridgeError::InvalidResponse(e.to_string()))?;
        let request = JsonRpcRequest::new(id, METHOD_TOOLS_CALL, body);

        tracing::debug!(tool = %tool, id, endpoint = %self.endpoint, "Calling bridge tool");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| BridgeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BridgeError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let rpc: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| BridgeError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        if let Some(err) = rpc.error {
            return Err(BridgeError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        let result = rpc
            .result
            .ok_or_else(|| BridgeError::InvalidResponse("missing result".to_string()))?;
        let result: CallToolResult = serde_json::from_value(result)
            .map_err(|e| BridgeError::InvalidResponse(e.to_string()))?;

        if result.failed() {
            return Err(BridgeError::Tool {
                tool,
                message: result.text(),
            });
        }

        tracing::debug!(tool = %tool, items = result.content.len(), "Bridge tool returned");
        Ok(result)
    }
}
