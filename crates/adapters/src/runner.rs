// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Runner` capability set (spec §9): `{start, stop, is_running,
//! handle_metadata}`. `conduit-engine`'s live `Service` object holds one of
//! these behind `Arc<dyn Runner>` — the "kind" discriminant lives on the
//! definition (spec §3, §9), never on the `Service` type itself.

use async_trait::async_trait;
use conduit_core::{Epoch, ServiceName};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("stop timed out after {0:?}")]
    StopTimeout(std::time::Duration),
    #[error("runtime handle not found: {0}")]
    HandleNotFound(String),
    #[error("container runtime error: {0}")]
    ContainerRuntime(#[from] crate::container::ContainerRuntimeError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("composite script failed: {0}")]
    ScriptFailed(String),
}

/// Opaque identifier for whatever medium a Runner drives — a PID for the
/// Process Runner, a container id for the Container Runner (spec §3
/// "opaque runtimeHandle").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeHandle {
    Pid(u32),
    Container(String),
    /// Composite Services (§4.10) have no OS-level handle; their "handle"
    /// is simply "the create script ran successfully".
    Composite,
}

impl std::fmt::Display for RuntimeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeHandle::Pid(pid) => write!(f, "pid:{pid}"),
            RuntimeHandle::Container(id) => write!(f, "container:{id}"),
            RuntimeHandle::Composite => write!(f, "composite"),
        }
    }
}

/// Events a Runner emits back to its owning Service's lifecycle task while
/// running (spec §4.2: "emits a discrete update that promotes the Service
/// from Starting to Running"; "emits a final state update carrying the
/// exit error if any").
#[derive(Debug, Clone)]
pub enum RunnerSignal {
    /// The readiness sentinel was observed in output (Process Runner) or
    /// the container's health probe first succeeded (Container Runner).
    Ready,
    /// A line of output was scraped, already classified (spec §4.2).
    Log { level: conduit_core::LogLevel, line: String },
    /// The runtime handle exited on its own (crash, not a requested Stop).
    /// `code` is the process exit code or container exit status if known.
    Exited { code: Option<i32>, error: Option<String> },
    /// A container's host port mapping resolved (spec §4.3 "emits it to
    /// the Service data").
    PortMapped { internal_port: u16, host_port: u16 },
}

/// The capability set a Service's lifecycle task drives to manage its
/// subprocess/container/composite-script runtime (spec §4.1 operations,
/// realized here as the non-MCP half of the contract; `McpClient` is the
/// other half).
#[async_trait]
pub trait Runner: Send + Sync {
    /// Launch the runtime. `signals` carries `RunnerSignal`s back to the
    /// owning lifecycle task for as long as the runtime lives; `cancel` is
    /// this Service's scope (spec §5) — cancelling it must make `stop`
    /// return promptly even if nobody calls it explicitly.
    async fn start(
        &self,
        epoch: Epoch,
        signals: mpsc::Sender<RunnerSignal>,
        cancel: CancellationToken,
    ) -> Result<RuntimeHandle, RunnerError>;

    /// Terminate the runtime and reap it, bounded by `timeout` (spec §4.1
    /// default 10s). Must be safe to call on a Runner that never started.
    async fn stop(
        &self,
        handle: &RuntimeHandle,
        timeout: std::time::Duration,
    ) -> Result<(), RunnerError>;

    /// Point-in-time liveness check, independent of the health-check tool
    /// a Composite Service might use (spec §4.1: "A Running service whose
    /// runtimeHandle exits unexpectedly transitions to Failed").
    async fn is_running(&self, handle: &RuntimeHandle) -> bool;

    /// Human-readable identity for logs (`subsystem` tag, spec §4.2).
    fn service_name(&self) -> &ServiceName;
}
