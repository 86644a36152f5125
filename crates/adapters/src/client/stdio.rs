// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stdio-bound `McpClient` (spec §4.4): speaks length-prefixed JSON-RPC
//! (`conduit_wire::framing`) over a child process's stdin/stdout, handed
//! over by `ProcessRunner::take_stdio` after `start`.

use super::{ClientError, McpClient, DEFAULT_INITIALIZE_TIMEOUT};
use async_trait::async_trait;
use conduit_wire::jsonrpc::{Id, Request};
use conduit_wire::mcp::{
    CallToolParams, CallToolResult, ClientInfo, InitializeParams, InitializeResult,
    ToolDescriptor, ToolsListResult, METHOD_INITIALIZE, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST,
};
use conduit_wire::{decode, encode, read_message, write_message};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;

pub struct StdioClient<R, W> {
    reader: Mutex<R>,
    writer: Mutex<W>,
    next_id: AtomicI64,
    client_name: String,
}

impl<R, W> StdioClient<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W, client_name: impl Into<String>) -> Self {
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            next_id: AtomicI64::new(1),
            client_name: client_name.into(),
        }
    }

    async fn call(&self, method: &str, params: Option<serde_json::Value>) -> Result<serde_json::Value, ClientError> {
        let id = Id::Number(self.next_id.fetch_add(1, Ordering::SeqCst));
        let request = Request::new(id, method, params);
        let payload = encode(&request).map_err(|e| ClientError::Transport(e.to_string()))?;

        {
            let mut writer = self.writer.lock().await;
            write_message(&mut *writer, &payload).await.map_err(|e| ClientError::Transport(e.to_string()))?;
        }

        let response_bytes = {
            let mut reader = self.reader.lock().await;
            read_message(&mut *reader).await.map_err(|e| ClientError::Transport(e.to_string()))?
        };
        let response: conduit_wire::Response =
            decode(&response_bytes).map_err(|e| ClientError::Transport(e.to_string()))?;
        response.into_result().map_err(ClientError::from)
    }
}

#[async_trait]
impl<R, W> McpClient for StdioClient<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn initialize(&self) -> Result<(), ClientError> {
        let params = InitializeParams {
            protocol_version: "2024-11-05".to_string(),
            capabilities: serde_json::json!({}),
            client_info: ClientInfo { name: self.client_name.clone(), version: env!("CARGO_PKG_VERSION").to_string() },
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
        let _: InitializeResult =
            serde_json::from_value(result).map_err(|e| ClientError::InitializeFailed(e.to_string()))?;
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

    async fn close(&self) {
        // Dropping the writer/reader closes the pipes; nothing further to
        // flush for the length-prefixed framing.
    }
}
