// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The narrow capability a Composite Service's runner needs from the
//! Aggregator (spec §4.10: "invokes a scripted sequence of aggregator
//! tools"). Living here, rather than as a direct dependency from
//! `conduit-engine` on `conduit-aggregator`, is what lets the Aggregator
//! depend on the engine's Registry (spec §4.8 dataflow) without a crate
//! cycle: the Aggregator implements this trait, and the engine's
//! Composite runner is handed only a `dyn ToolInvoker`.

use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone, thiserror::Error)]
pub enum InvocationError {
    #[error("tool '{0}' not found in the aggregated catalog")]
    NotFound(String),
    #[error("tool '{0}' unavailable: owning service left Running")]
    ServiceUnavailable(String),
    #[error("tool call failed: {0}")]
    Failed(String),
    #[error("cancelled")]
    Cancelled,
}

/// A caller's view of the Aggregator's re-exposed tool surface, scoped to
/// the final re-exposed name (`prefix + serverName + "_" + localName`).
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn call_tool(&self, exposed_name: &str, arguments: Value) -> Result<Value, InvocationError>;
}
