// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP/SSE-bound `McpClient` (spec §4.4), used for container-backed
//! Services and any non-stdio server. Built on `reqwest`, the stack the
//! pack's MCP-aggregator example uses for the same role
//! (SPEC_FULL.md §10.5).

use super::{ClientError, McpClient, DEFAULT_INITIALIZE_TIMEOUT};
use async_trait::async_trait;
use conduit_wire::jsonrpc::{Id, Request};
use conduit_wire::mcp::{
    CallToolParams, CallToolResult, ClientInfo, InitializeParams, InitializeResult,
    ToolDescriptor, ToolsListResult, METHOD_INITIALIZE, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST,
};
use std::sync::atomic::{AtomicI64, Ordering};

pub struct HttpClient {
    base_url: String,
    http: reqwest::Client,
    next_id: AtomicI64,
    client_name: String,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>, client_name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
            next_id: AtomicI64::new(1),
            client_name: client_name.into(),
        }
    }

    async fn call(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, ClientError> {
        let id = Id::Number(self.next_id.fetch_add(1, Ordering::SeqCst));
        let request = Request::new(id, method, params);

        let response = self
            .http
            .post(&self.base_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let wire_response: conduit_wire::Response =
            response.json().await.map_err(|e| ClientError::Transport(e.to_string()))?;
        wire_response.into_result().map_err(ClientError::from)
    }
}

#[async_trait]
impl McpClient for HttpClient {
    async fn initialize(&self) -> Result<(), ClientError> {
        let params = InitializeParams {
            protocol_version: "2024-11-05".to_string(),
            capabilities: serde_json::json!({}),
            client_info: ClientInfo {
                name: self.client_name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };
        let params_json =
            serde_json::to_value(&params).map_err(|e| ClientError::Transport(e.to_string()))?;
        let result = tokio::time::timeout(
            DEFAULT_INITIALIZE_TIMEOUT,
            self.call(METHOD_INITIALIZE, Some(params_json)),
        )
        .await
        .map_err(|_| ClientError::InitializeTimeout(DEFAULT_INITIALIZE_TIMEOUT))?
        .map_err(|e| ClientError::InitializeFailed(e.to_string()))?;
        let _: InitializeResult = serde_json::from_value(result)
            .map_err(|e| ClientError::InitializeFailed(e.to_string()))?;
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ClientError> {
        let result = self.call(METHOD_TOOLS_LIST, None).await?;
        let parsed: ToolsListResult =
            serde_json::from_value(result).map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(parsed.tools)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult, ClientError> {
        let params = CallToolParams { name: name.to_string(), arguments };
        let params_json =
            serde_json::to_value(&params).map_err(|e| ClientError::Transport(e.to_string()))?;
        let result = self.call(METHOD_TOOLS_CALL, Some(params_json)).await?;
        serde_json::from_value(result).map_err(|e| ClientError::Transport(e.to_string()))
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_retained_verbatim() {
        let client = HttpClient::new("http://127.0.0.1:9100/mcp", "conduit-test");
        assert_eq!(client.base_url, "http://127.0.0.1:9100/mcp");
    }
}
