// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process test doubles for `Runner`/`McpClient`, used by
//! `conduit-engine`'s Orchestrator/Registry tests to exercise lifecycle
//! wiring without a real subprocess or container (spec §3 "Mock" kind).

use crate::client::{ClientError, McpClient};
use crate::runner::{Runner, RunnerError, RunnerSignal, RuntimeHandle};
use async_trait::async_trait;
use conduit_core::{Epoch, ServiceName};
use conduit_wire::mcp::{CallToolResult, ToolDescriptor};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A `Runner` that "starts" instantly, optionally emitting a Ready signal
/// on a delay, and fails to start if `fail_start` is set.
pub struct FakeRunner {
    name: ServiceName,
    next_pid: AtomicU32,
    running: Mutex<std::collections::HashSet<u32>>,
    pub fail_start: AtomicBool,
    pub start_delay: std::time::Duration,
}

impl FakeRunner {
    pub fn new(name: ServiceName) -> Self {
        Self {
            name,
            next_pid: AtomicU32::new(1),
            running: Mutex::new(std::collections::HashSet::new()),
            fail_start: AtomicBool::new(false),
            start_delay: std::time::Duration::ZERO,
        }
    }

    pub fn with_start_delay(mut self, delay: std::time::Duration) -> Self {
        self.start_delay = delay;
        self
    }
}

#[async_trait]
impl Runner for FakeRunner {
    async fn start(
        &self,
        _epoch: Epoch,
        signals: mpsc::Sender<RunnerSignal>,
        _cancel: CancellationToken,
    ) -> Result<RuntimeHandle, RunnerError> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(RunnerError::SpawnFailed("fake start failure".to_string()));
        }
        if !self.start_delay.is_zero() {
            tokio::time::sleep(self.start_delay).await;
        }
        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        self.running.lock().insert(pid);
        let _ = signals.send(RunnerSignal::Ready).await;
        Ok(RuntimeHandle::Pid(pid))
    }

    async fn stop(&self, handle: &RuntimeHandle, _timeout: std::time::Duration) -> Result<(), RunnerError> {
        if let RuntimeHandle::Pid(pid) = handle {
            self.running.lock().remove(pid);
        }
        Ok(())
    }

    async fn is_running(&self, handle: &RuntimeHandle) -> bool {
        matches!(handle, RuntimeHandle::Pid(pid) if self.running.lock().contains(pid))
    }

    fn service_name(&self) -> &ServiceName {
        &self.name
    }
}

/// A fixed-catalog `McpClient`: `initialize` always succeeds, `list_tools`
/// returns whatever was configured at construction.
pub struct FakeMcpClient {
    tools: Vec<ToolDescriptor>,
    pub fail_initialize: AtomicBool,
}

impl FakeMcpClient {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self { tools, fail_initialize: AtomicBool::new(false) }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl McpClient for FakeMcpClient {
    async fn initialize(&self) -> Result<(), ClientError> {
        if self.fail_initialize.load(Ordering::SeqCst) {
            return Err(ClientError::InitializeFailed("fake initialize failure".to_string()));
        }
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ClientError> {
        Ok(self.tools.clone())
    }

    async fn call_tool(
        &self,
        _name: &str,
        _arguments: serde_json::Value,
    ) -> Result<CallToolResult, ClientError> {
        Ok(CallToolResult { content: vec![], is_error: false })
    }

    async fn close(&self) {}
}

pub fn fake_tool(local_name: &str) -> ToolDescriptor {
    ToolDescriptor {
        name: local_name.to_string(),
        description: None,
        input_schema: serde_json::json!({"type": "object"}),
    }
}

/// Convenience: an `Arc<dyn Runner>`/`Arc<dyn McpClient>` pair for a Mock
/// Service, matching the shape `conduit-engine` expects when building a
/// live Service.
pub fn fake_pair(name: &str) -> (Arc<dyn Runner>, Arc<dyn McpClient>) {
    (Arc::new(FakeRunner::new(ServiceName::new(name))), Arc::new(FakeMcpClient::empty()))
}
