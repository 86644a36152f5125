// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composite Service / Service Class (spec §4.10): a Service whose
//! "runner" is not a child process but a small interpreter that scripts
//! create/verify/teardown as calls through the aggregator's routed tool
//! catalog, via the `ToolInvoker` capability set (`conduit-core::invoker`,
//! see DESIGN.md for why that trait lives in core rather than here).
//! Lifecycle states are identical to §4.1; `Service` drives this Runner
//! exactly as it drives the Process/Container ones.

use crate::service::ClientFactory;
use async_trait::async_trait;
use conduit_adapters::runner::{Runner, RunnerError, RunnerSignal, RuntimeHandle};
use conduit_adapters::{ClientError, McpClient};
use conduit_core::{Epoch, InvocationError, ServiceName, ToolInvoker};
use conduit_definitions::ServiceClassDefinition;
use conduit_wire::mcp::{CallToolResult, ToolDescriptor};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Per-instance arguments passed to the Service Class's lifecycle tools.
/// Distinct from the class definition itself so the same class can back
/// several composite instances with different create/delete payloads.
#[derive(Debug, Clone, Default)]
pub struct CompositeArgs {
    pub create: Value,
    pub delete: Value,
}

pub struct CompositeRunner {
    name: ServiceName,
    class: ServiceClassDefinition,
    args: CompositeArgs,
    invoker: Arc<dyn ToolInvoker>,
}

impl CompositeRunner {
    pub fn new(
        name: ServiceName,
        class: ServiceClassDefinition,
        args: CompositeArgs,
        invoker: Arc<dyn ToolInvoker>,
    ) -> Self {
        Self { name, class, args, invoker }
    }
}

#[async_trait]
impl Runner for CompositeRunner {
    async fn start(
        &self,
        _epoch: Epoch,
        signals: mpsc::Sender<RunnerSignal>,
        _cancel: CancellationToken,
    ) -> Result<RuntimeHandle, RunnerError> {
        // create
        self.invoker
            .call_tool(&self.class.create_tool, self.args.create.clone())
            .await
            .map_err(|e| RunnerError::ScriptFailed(format!("create: {e}")))?;

        // verify: an optional status probe before declaring Ready.
        if let Some(status_tool) = &self.class.status_tool {
            self.invoker
                .call_tool(status_tool, Value::Null)
                .await
                .map_err(|e| RunnerError::ScriptFailed(format!("verify: {e}")))?;
        }

        // mark running
        let _ = signals.send(RunnerSignal::Ready).await;
        Ok(RuntimeHandle::Composite)
    }

    async fn stop(&self, handle: &RuntimeHandle, _timeout: std::time::Duration) -> Result<(), RunnerError> {
        if !matches!(handle, RuntimeHandle::Composite) {
            return Err(RunnerError::HandleNotFound(handle.to_string()));
        }
        self.invoker
            .call_tool(&self.class.delete_tool, self.args.delete.clone())
            .await
            .map_err(|e| RunnerError::ScriptFailed(format!("delete: {e}")))
    }

    async fn is_running(&self, handle: &RuntimeHandle) -> bool {
        matches!(handle, RuntimeHandle::Composite)
    }

    fn service_name(&self) -> &ServiceName {
        &self.name
    }
}

/// A trivial `McpClient` for Composite Services: there is no MCP peer to
/// handshake with, so `initialize` always succeeds immediately; `list_tools`
/// is what the Health Monitor drives, here repurposed to call the class's
/// configured health-check tool (spec §4.10 "health is probed by calling a
/// configured health-check tool").
pub struct CompositeHealthClient {
    invoker: Arc<dyn ToolInvoker>,
    health_check_tool: Option<String>,
}

impl CompositeHealthClient {
    pub fn new(invoker: Arc<dyn ToolInvoker>, health_check_tool: Option<String>) -> Self {
        Self { invoker, health_check_tool }
    }
}

#[async_trait]
impl McpClient for CompositeHealthClient {
    async fn initialize(&self) -> Result<(), ClientError> {
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ClientError> {
        let Some(tool) = &self.health_check_tool else {
            return Ok(Vec::new());
        };
        self.invoker
            .call_tool(tool, Value::Null)
            .await
            .map(|_| Vec::new())
            .map_err(|e| ClientError::Transport(e.to_string()))
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, ClientError> {
        let result = self.invoker.call_tool(name, arguments).await.map_err(invocation_to_client_error)?;
        let content = conduit_wire::mcp::ToolContent {
            kind: "text".to_string(),
            body: serde_json::json!({ "text": result.to_string() }),
        };
        Ok(CallToolResult { content: vec![content], is_error: false })
    }

    async fn close(&self) {}
}

fn invocation_to_client_error(err: InvocationError) -> ClientError {
    match err {
        InvocationError::Cancelled => ClientError::Cancelled,
        other => ClientError::Transport(other.to_string()),
    }
}

/// Build the `ClientFactory` a Composite `Service` is constructed with:
/// always hands back the same `CompositeHealthClient`, ignoring the
/// `RuntimeHandle` the Runner produced (a Composite Service has no
/// transport to bind a handle to).
pub fn composite_client_factory(
    invoker: Arc<dyn ToolInvoker>,
    health_check_tool: Option<String>,
) -> ClientFactory {
    Arc::new(move |_handle| {
        let client: Arc<dyn McpClient> = Arc::new(CompositeHealthClient::new(Arc::clone(&invoker), health_check_tool.clone()));
        Box::pin(async move { Ok(client) })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_definitions::config::ServiceClassTimeouts;

    struct StubInvoker {
        fail_tool: Option<&'static str>,
    }

    #[async_trait]
    impl ToolInvoker for StubInvoker {
        async fn call_tool(&self, exposed_name: &str, _arguments: Value) -> Result<Value, InvocationError> {
            if Some(exposed_name) == self.fail_tool {
                return Err(InvocationError::Failed("boom".to_string()));
            }
            Ok(Value::Null)
        }
    }

    fn sample_class() -> ServiceClassDefinition {
        ServiceClassDefinition {
            name: "vm".to_string(),
            create_tool: "vm_create".to_string(),
            delete_tool: "vm_delete".to_string(),
            health_check_tool: Some("vm_status".to_string()),
            status_tool: Some("vm_status".to_string()),
            health_check_enabled: true,
            health_check_interval: std::time::Duration::from_secs(30),
            failure_threshold: 3,
            success_threshold: 1,
            timeouts: ServiceClassTimeouts::default(),
            depends_on: vec![],
        }
    }

    #[tokio::test]
    async fn start_calls_create_then_verify_then_signals_ready() {
        let invoker: Arc<dyn ToolInvoker> = Arc::new(StubInvoker { fail_tool: None });
        let runner = CompositeRunner::new(
            ServiceName::new("vm-1"),
            sample_class(),
            CompositeArgs::default(),
            invoker,
        );
        let (tx, mut rx) = mpsc::channel(4);
        let handle = runner.start(Epoch::ZERO, tx, CancellationToken::new()).await.expect("start");
        assert!(matches!(handle, RuntimeHandle::Composite));
        assert!(matches!(rx.try_recv(), Ok(RunnerSignal::Ready)));
    }

    #[tokio::test]
    async fn start_fails_when_create_tool_errors() {
        let invoker: Arc<dyn ToolInvoker> = Arc::new(StubInvoker { fail_tool: Some("vm_create") });
        let runner =
            CompositeRunner::new(ServiceName::new("vm-1"), sample_class(), CompositeArgs::default(), invoker);
        let (tx, _rx) = mpsc::channel(4);
        let err = runner.start(Epoch::ZERO, tx, CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, RunnerError::ScriptFailed(_)));
    }

    #[tokio::test]
    async fn stop_calls_delete_tool() {
        let invoker: Arc<dyn ToolInvoker> = Arc::new(StubInvoker { fail_tool: None });
        let runner =
            CompositeRunner::new(ServiceName::new("vm-1"), sample_class(), CompositeArgs::default(), invoker);
        runner.stop(&RuntimeHandle::Composite, std::time::Duration::from_secs(1)).await.expect("stop");
    }
}
