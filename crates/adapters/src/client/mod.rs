// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The MCP `Client` capability set (spec §4.4): `{initialize, list_tools,
//! call_tool, close}`, bound to either a child's stdio pipes or an
//! HTTP/SSE endpoint.

pub mod http;
pub mod stdio;

use async_trait::async_trait;
use conduit_wire::{CallToolResult, ToolDescriptor};
use std::time::Duration;
use thiserror::Error;

/// Handshake bound (spec §4.4 default 15s).
pub const DEFAULT_INITIALIZE_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("initialize timed out after {0:?}")]
    InitializeTimeout(Duration),
    #[error("initialize failed: {0}")]
    InitializeFailed(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("protocol error: {0}")]
    Protocol(#[from] conduit_wire::JsonRpcError),
    #[error("cancelled")]
    Cancelled,
}

/// Per-Service JSON-RPC peer (spec §4.4). A Service advances to Running
/// only after `initialize` succeeds *and* (for runners that use one) the
/// readiness sentinel has fired — both must hold (SPEC_FULL.md §12,
/// Open Question 2).
#[async_trait]
pub trait McpClient: Send + Sync {
    async fn initialize(&self) -> Result<(), ClientError>;
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ClientError>;
    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult, ClientError>;
    async fn close(&self);
}
