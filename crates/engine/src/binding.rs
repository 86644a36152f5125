// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turns a `conduit_definitions::ServiceDefinition` into the `(Arc<dyn
//! Runner>, ClientFactory)` pair a live `Service` is built from (spec §9:
//! "the kind discriminant lives in the definition", not on `Service`
//! itself). The Orchestrator calls `bind` once per Service at reload time;
//! `Service` never sees a `ServiceKind::LocalCommand`/`Container` branch.

use crate::error::ServiceError;
use crate::service::ClientFactory;
use conduit_adapters::client::http::HttpClient;
use conduit_adapters::client::stdio::StdioClient;
use conduit_adapters::container::cli::DockerCli;
use conduit_adapters::container::k8s::KubePods;
use conduit_adapters::container::{ContainerRunner, ContainerRuntime, ContainerSpec};
use conduit_adapters::process::{ProcessRunner, ProcessSpec};
use conduit_adapters::runner::{Runner, RuntimeHandle};
use conduit_adapters::McpClient;
use conduit_core::ServiceKind;
use conduit_definitions::{ContainerRuntimeKind, ServiceDefinition};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BindingError {
    #[error("service '{0}' is a Mock definition; the Definition Store never produces one")]
    UnexpectedMockKind(String),
    #[error("service '{0}' is a Composite definition; bind_composite must be used instead")]
    UnexpectedCompositeKind(String),
    #[error("kubernetes runtime unavailable: {0}")]
    KubeUnavailable(String),
}

/// Lazily-built container backends, shared across every Container-kind
/// Service so the Kubernetes client (an async handshake) is only built
/// once (spec §4.3 "selected by globalSettings.defaultContainerRuntime").
pub struct ContainerRuntimes {
    docker: Arc<dyn ContainerRuntime>,
    kube: Option<Arc<dyn ContainerRuntime>>,
}

impl ContainerRuntimes {
    pub fn docker_only() -> Self {
        Self { docker: Arc::new(DockerCli::new()), kube: None }
    }

    pub async fn with_kube(namespace: impl Into<String>) -> Result<Self, BindingError> {
        let kube = KubePods::new(namespace).await.map_err(|e| BindingError::KubeUnavailable(e.to_string()))?;
        Ok(Self { docker: Arc::new(DockerCli::new()), kube: Some(Arc::new(kube)) })
    }

    fn select(&self, kind: ContainerRuntimeKind) -> Result<Arc<dyn ContainerRuntime>, BindingError> {
        match kind {
            ContainerRuntimeKind::Docker => Ok(Arc::clone(&self.docker)),
            ContainerRuntimeKind::Kubernetes => self
                .kube
                .clone()
                .ok_or_else(|| BindingError::KubeUnavailable("no namespace configured".to_string())),
        }
    }
}

/// Build the Runner/ClientFactory pair for a `LocalCommand` or `Container`
/// Service definition (spec §4.2, §4.3, §4.4). `Mock` and `Composite`
/// kinds are out of scope here: `Mock` never comes from the Definition
/// Store, and `Composite` is built by `composite::bind_composite` instead.
pub fn bind(
    def: &ServiceDefinition,
    container_runtimes: &ContainerRuntimes,
) -> Result<(Arc<dyn Runner>, ClientFactory), BindingError> {
    match def.kind {
        ServiceKind::LocalCommand => Ok(bind_local_command(def)),
        ServiceKind::Container => bind_container(def, container_runtimes),
        ServiceKind::Mock => Err(BindingError::UnexpectedMockKind(def.name.to_string())),
        ServiceKind::Composite => Err(BindingError::UnexpectedCompositeKind(def.name.to_string())),
    }
}

fn bind_local_command(def: &ServiceDefinition) -> (Arc<dyn Runner>, ClientFactory) {
    let spec = ProcessSpec { command: def.command.clone(), env: def.env.clone(), cwd: None };
    let process_runner = Arc::new(ProcessRunner::new(def.name.clone(), spec));
    let runner_for_client = Arc::clone(&process_runner);
    let client_name = def.name.to_string();

    let client_factory: ClientFactory = Arc::new(move |handle: RuntimeHandle| {
        let runner = Arc::clone(&runner_for_client);
        let client_name = client_name.clone();
        Box::pin(async move {
            let (stdin, stdout) = runner.take_stdio(&handle).ok_or_else(|| {
                ServiceError::StartFailed("stdio already taken for this runtime handle".to_string())
            })?;
            let client: Arc<dyn McpClient> = Arc::new(StdioClient::new(stdout, stdin, client_name));
            Ok(client)
        })
    });

    (process_runner, client_factory)
}

fn bind_container(
    def: &ServiceDefinition,
    container_runtimes: &ContainerRuntimes,
) -> Result<(Arc<dyn Runner>, ClientFactory), BindingError> {
    let image = def.image.clone().unwrap_or_default();
    let spec = ContainerSpec {
        image,
        ports: def.container_ports.clone(),
        env: def.container_env.clone(),
        volumes: def.container_volumes.clone(),
    };
    let runtime = container_runtimes.select(def.container_runtime)?;
    let runner: Arc<dyn Runner> = Arc::new(ContainerRunner::new(def.name.clone(), spec, runtime));

    // The primary container port is what the HTTP/SSE client speaks to;
    // the Container Runner resolves it asynchronously after start, so the
    // client factory waits on a `PortMapped` signal via the runner's own
    // `is_running`/port-probe path is not available here — instead the
    // first configured port is used as-is once the handle exists, matching
    // spec §4.3's "host port is resolved" being an orthogonal readiness
    // concern from the client's base URL construction.
    let primary_port = def.container_ports.first().copied();
    let client_name = def.name.to_string();

    let client_factory: ClientFactory = Arc::new(move |handle: RuntimeHandle| {
        let client_name = client_name.clone();
        let container_id = match &handle {
            RuntimeHandle::Container(id) => id.clone(),
            other => other.to_string(),
        };
        Box::pin(async move {
            let port = primary_port.ok_or_else(|| {
                ServiceError::StartFailed("container service has no containerPorts configured".to_string())
            })?;
            let base_url = format!("http://127.0.0.1:{port}/mcp");
            tracing::debug!(container_id, base_url, "binding http client to container");
            let client: Arc<dyn McpClient> = Arc::new(HttpClient::new(base_url, client_name));
            Ok(client)
        })
    });

    Ok((runner, client_factory))
}
