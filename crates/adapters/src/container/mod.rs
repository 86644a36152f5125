// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container Runner (spec §4.3): the same `Runner` contract as the Process
//! Runner, layered on a narrow `ContainerRuntime` capability set so the
//! lifecycle/port-discovery logic is shared across backends.

pub mod cli;
pub mod k8s;

use crate::runner::{Runner, RunnerError, RunnerSignal, RuntimeHandle};
use async_trait::async_trait;
use conduit_core::{Epoch, ServiceName};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum ContainerRuntimeError {
    #[error("pull image {image} failed: {cause}")]
    PullFailed { image: String, cause: String },
    #[error("start container failed: {0}")]
    StartFailed(String),
    #[error("stop container failed: {0}")]
    StopFailed(String),
    #[error("container {0} not found")]
    NotFound(String),
    #[error("port mapping for internal port {0} never resolved")]
    PortUnresolved(u16),
}

/// What to run. Carried on the Service's `container` definition (spec §6
/// `image`, `containerPorts[]`, `containerEnv{}`, `containerVolumes[]`).
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    pub image: String,
    pub ports: Vec<u16>,
    pub env: Vec<(String, String)>,
    pub volumes: Vec<String>,
}

/// The narrow capability set spec §4.3 names explicitly. Two backends
/// implement it: a `docker`-CLI-shelling one (`cli::DockerCli`) and a
/// Kubernetes one (`k8s::KubePods`), selected by
/// `globalSettings.defaultContainerRuntime` (SPEC_FULL.md §10.6).
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn pull_image(&self, image: &str) -> Result<(), ContainerRuntimeError>;
    async fn start_container(&self, spec: &ContainerSpec, name: &str)
        -> Result<String, ContainerRuntimeError>;
    async fn stop_container(&self, id: &str) -> Result<(), ContainerRuntimeError>;
    async fn remove_container(&self, id: &str) -> Result<(), ContainerRuntimeError>;
    async fn is_running(&self, id: &str) -> Result<bool, ContainerRuntimeError>;
    async fn get_container_logs(&self, id: &str) -> Result<String, ContainerRuntimeError>;
    async fn get_container_port(
        &self,
        id: &str,
        internal_port: u16,
    ) -> Result<Option<u16>, ContainerRuntimeError>;
}

/// Bounded retry for port-mapping discovery (spec §4.3: "probe port
/// mappings with bounded retry (10 x 200ms) until a host port is
/// resolved"). A freshly-started container's port mapping isn't always
/// visible to `inspect`/`get` the instant the runtime reports it started.
const PORT_PROBE_ATTEMPTS: usize = 10;
const PORT_PROBE_DELAY: Duration = Duration::from_millis(200);

pub struct ContainerRunner {
    name: ServiceName,
    spec: ContainerSpec,
    runtime: std::sync::Arc<dyn ContainerRuntime>,
}

impl ContainerRunner {
    pub fn new(name: ServiceName, spec: ContainerSpec, runtime: std::sync::Arc<dyn ContainerRuntime>) -> Self {
        Self { name, spec, runtime }
    }

    fn container_name(&self) -> String {
        format!("conduit-{}", self.name)
    }

    async fn resolve_ports(&self, id: &str, signals: &mpsc::Sender<RunnerSignal>) {
        for &internal_port in &self.spec.ports {
            for attempt in 0..PORT_PROBE_ATTEMPTS {
                match self.runtime.get_container_port(id, internal_port).await {
                    Ok(Some(host_port)) => {
                        let _ = signals
                            .send(RunnerSignal::PortMapped { internal_port, host_port })
                            .await;
                        break;
                    }
                    _ if attempt + 1 < PORT_PROBE_ATTEMPTS => {
                        tokio::time::sleep(PORT_PROBE_DELAY).await;
                    }
                    _ => {
                        tracing::warn!(
                            service = %self.name,
                            internal_port,
                            "container port mapping never resolved"
                        );
                    }
                }
            }
        }
    }
}

#[async_trait]
impl Runner for ContainerRunner {
    async fn start(
        &self,
        _epoch: Epoch,
        signals: mpsc::Sender<RunnerSignal>,
        cancel: CancellationToken,
    ) -> Result<RuntimeHandle, RunnerError> {
        self.runtime.pull_image(&self.spec.image).await?;
        let id = self.runtime.start_container(&self.spec, &self.container_name()).await?;

        self.resolve_ports(&id, &signals).await;
        let _ = signals.send(RunnerSignal::Ready).await;

        let runtime = self.runtime.clone();
        let id_for_watch = id.clone();
        tokio::spawn(watch_container(runtime, id_for_watch, signals, cancel));

        Ok(RuntimeHandle::Container(id))
    }

    async fn stop(&self, handle: &RuntimeHandle, timeout: Duration) -> Result<(), RunnerError> {
        let RuntimeHandle::Container(id) = handle else {
            return Err(RunnerError::HandleNotFound(handle.to_string()));
        };
        match tokio::time::timeout(timeout, self.runtime.stop_container(id)).await {
            Ok(result) => result.map_err(RunnerError::from),
            Err(_) => Err(RunnerError::StopTimeout(timeout)),
        }?;
        self.runtime.remove_container(id).await?;
        Ok(())
    }

    async fn is_running(&self, handle: &RuntimeHandle) -> bool {
        let RuntimeHandle::Container(id) = handle else { return false };
        self.runtime.is_running(id).await.unwrap_or(false)
    }

    fn service_name(&self) -> &ServiceName {
        &self.name
    }
}

async fn watch_container(
    runtime: std::sync::Arc<dyn ContainerRuntime>,
    id: String,
    signals: mpsc::Sender<RunnerSignal>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(2));
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = interval.tick() => {
                match runtime.is_running(&id).await {
                    Ok(true) => continue,
                    _ => {
                        let _ = signals
                            .send(RunnerSignal::Exited {
                                code: None,
                                error: Some(format!("container {id} is no longer running")),
                            })
                            .await;
                        return;
                    }
                }
            }
        }
    }
}
