// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Aggregator (spec §4.8): subscribes to the Registry, maintains the
//! namespaced Catalog, and routes inbound `tools/call` to the owning
//! Service's `McpClient`. Also implements `ToolInvoker` so a Composite
//! Service's scripted lifecycle (§4.10) can route through the very same
//! catalog/routing path an external client uses — there is only one tool
//! surface in this system, not two.

use crate::catalog::Catalog;
use crate::error::AggregatorError;
use async_trait::async_trait;
use conduit_core::{Event, Health, InvocationError, ServiceName, ServiceState, Tool, ToolInvoker};
use conduit_engine::ServiceRegistry;
use conduit_wire::mcp::CallToolResult;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Aggregator {
    registry: Arc<ServiceRegistry>,
    catalog: Arc<Catalog>,
    prefix: String,
}

impl Aggregator {
    pub fn new(registry: Arc<ServiceRegistry>, prefix: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { registry, catalog: Arc::new(Catalog::new()), prefix: prefix.into() })
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Spawn the background task that drives the Catalog off Registry
    /// events (spec §4.8 "Subscribes to Registry events"). Runs until the
    /// Registry itself is dropped.
    pub fn spawn_driver(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let this = Arc::clone(self);
        let mut subscription = this.registry.subscribe();
        tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                this.handle_event(event).await;
            }
        })
    }

    async fn handle_event(&self, event: Event) {
        match event {
            Event::StateChanged { name, new_state, .. } => {
                if new_state == ServiceState::Running {
                    self.refresh_service(&name).await;
                } else {
                    self.catalog.purge_service(&name);
                }
            }
            Event::HealthChanged { name, new_health, .. } => {
                if new_health == Health::Unhealthy {
                    // Unhealthy Running services are "not ready" for
                    // catalog exposure (spec §4.1) even though the
                    // primary state stays Running.
                    self.catalog.purge_service(&name);
                } else if let Ok(service) = self.registry.get(&name) {
                    if service.snapshot().state == ServiceState::Running {
                        self.refresh_service(&name).await;
                    }
                }
            }
            Event::EventsDropped { count } => {
                warn!(count, "aggregator event subscription dropped events; catalog may be briefly stale");
            }
            Event::Log { .. } | Event::ToolNameConflict { .. } => {}
        }
    }

    /// Re-fetch a Service's catalog via `ListTools` and (re)insert it
    /// (spec §4.8 steps 1-3). Always purges first so a restarted
    /// Service's stale-epoch entries never linger alongside fresh ones.
    async fn refresh_service(&self, name: &ServiceName) {
        let Ok(service) = self.registry.get(name) else { return };
        let Some(client) = service.client() else { return };
        let epoch = service.snapshot().epoch;

        let tools = match client.list_tools().await {
            Ok(tools) => tools,
            Err(err) => {
                warn!(%name, %err, "failed to list tools for newly-running service");
                return;
            }
        };

        self.catalog.purge_service(name);
        let tools: Vec<Tool> = tools
            .into_iter()
            .map(|t| Tool { server_name: name.clone(), local_name: t.name, schema: t.input_schema })
            .collect();
        let conflicts = self.catalog.insert_batch(&self.prefix, name, &tools, epoch);

        for conflict in &conflicts {
            warn!(existing = %conflict.existing, owner = %conflict.owner, "tool name conflict; existing entry retained");
            let _ = self.registry.event_sink().send(Event::ToolNameConflict {
                existing: conflict.existing.clone(),
                incoming: conflict.incoming.clone(),
                owner: conflict.owner.clone(),
            });
        }
        info!(%name, inserted = tools.len() - conflicts.len(), conflicts = conflicts.len(), "catalog refreshed");
    }

    /// `tools/list` (spec §6 "Aggregator wire protocol"): the current
    /// catalog snapshot, stable within the returned slice.
    pub fn list_tools(&self) -> Arc<Vec<conduit_core::CatalogEntry>> {
        self.catalog.snapshot()
    }

    /// `tools/call` for re-exposed name `N` (spec §4.8): resolve the
    /// owner, re-check it is still Running right before dispatch, and
    /// forward. `ServiceUnavailable` if the Service left Running between
    /// resolution and dispatch.
    pub async fn call_tool(&self, exposed_name: &str, arguments: serde_json::Value) -> Result<CallToolResult, AggregatorError> {
        let entry = self.catalog.find(exposed_name).ok_or_else(|| AggregatorError::NotFound(exposed_name.to_string()))?;
        let service = self.registry.get(&entry.server_name)?;
        if service.snapshot().state != ServiceState::Running {
            return Err(AggregatorError::ServiceUnavailable(entry.server_name));
        }
        let client = service.client().ok_or_else(|| AggregatorError::ServiceUnavailable(entry.server_name.clone()))?;
        debug!(exposed_name, server = %entry.server_name, local = %entry.local_name, "routing tool call");
        client
            .call_tool(&entry.local_name, arguments)
            .await
            .map_err(|e| AggregatorError::CallFailed(e.to_string()))
    }
}

#[async_trait]
impl ToolInvoker for Aggregator {
    async fn call_tool(&self, exposed_name: &str, arguments: serde_json::Value) -> Result<serde_json::Value, InvocationError> {
        let result = Aggregator::call_tool(self, exposed_name, arguments).await.map_err(|e| match e {
            AggregatorError::NotFound(name) => InvocationError::NotFound(name),
            AggregatorError::ServiceUnavailable(name) => InvocationError::ServiceUnavailable(name.to_string()),
            AggregatorError::Cancelled => InvocationError::Cancelled,
            other => InvocationError::Failed(other.to_string()),
        })?;
        serde_json::to_value(&result).map_err(|e| InvocationError::Failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_adapters::test_support::{fake_tool, FakeMcpClient, FakeRunner};
    use conduit_adapters::{McpClient, Runner};
    use conduit_core::RetryPolicy;
    use conduit_engine::Service;
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn client_factory(client: Arc<dyn McpClient>) -> conduit_engine::ClientFactory {
        Arc::new(move |_handle| {
            let client = Arc::clone(&client);
            Box::pin(async move { Ok(client) })
                as Pin<Box<dyn Future<Output = Result<Arc<dyn McpClient>, conduit_engine::ServiceError>> + Send>>
        })
    }

    async fn running_service(registry: &Arc<ServiceRegistry>, name: &str, tools: Vec<&str>, cancel: &CancellationToken) -> Arc<Service> {
        let runner: Arc<dyn Runner> = Arc::new(FakeRunner::new(ServiceName::new(name)));
        let client: Arc<dyn McpClient> = Arc::new(FakeMcpClient::new(tools.into_iter().map(fake_tool).collect()));
        let service = Service::new(
            ServiceName::new(name),
            conduit_core::ServiceKind::Mock,
            vec![],
            runner,
            client_factory(client),
            RetryPolicy::DISABLED,
            registry.event_sink(),
            cancel,
        );
        registry.register(Arc::clone(&service)).expect("register");
        service.start().await.expect("start");
        service
    }

    #[tokio::test]
    async fn running_service_tools_appear_under_prefixed_namespace() {
        let registry = ServiceRegistry::new();
        let aggregator = Aggregator::new(Arc::clone(&registry), "x");
        let _driver = aggregator.spawn_driver();
        let cancel = CancellationToken::new();

        running_service(&registry, "alpha", vec!["hello"], &cancel).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let snapshot = aggregator.list_tools();
        assert!(snapshot.iter().any(|e| e.exposed_name == "xalpha_hello"));
    }

    #[tokio::test]
    async fn call_tool_routes_to_owning_service() {
        let registry = ServiceRegistry::new();
        let aggregator = Aggregator::new(Arc::clone(&registry), "x");
        let _driver = aggregator.spawn_driver();
        let cancel = CancellationToken::new();

        running_service(&registry, "alpha", vec!["hello"], &cancel).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let result = aggregator.call_tool("xalpha_hello", serde_json::json!({})).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn call_tool_unknown_name_is_not_found() {
        let registry = ServiceRegistry::new();
        let aggregator = Aggregator::new(Arc::clone(&registry), "x");
        let err = aggregator.call_tool("xghost_nope", serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, AggregatorError::NotFound(_)));
    }

    #[tokio::test]
    async fn service_leaving_running_purges_its_catalog_entries() {
        let registry = ServiceRegistry::new();
        let aggregator = Aggregator::new(Arc::clone(&registry), "x");
        let _driver = aggregator.spawn_driver();
        let cancel = CancellationToken::new();

        let service = running_service(&registry, "alpha", vec!["hello"], &cancel).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!aggregator.list_tools().is_empty());

        service.stop(Duration::from_secs(1)).await.expect("stop");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(aggregator.list_tools().is_empty());
    }

    #[tokio::test]
    async fn refresh_after_restart_replaces_stale_epoch_entries() {
        let registry = ServiceRegistry::new();
        let aggregator = Aggregator::new(Arc::clone(&registry), "x");
        let _driver = aggregator.spawn_driver();
        let cancel = CancellationToken::new();

        let service = running_service(&registry, "alpha", vec!["hello"], &cancel).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        let first_epoch = aggregator.list_tools()[0].server_epoch;

        service.restart().await.expect("restart");
        tokio::time::sleep(Duration::from_millis(50)).await;

        let snapshot = aggregator.list_tools();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[0].server_epoch > first_epoch);
    }
}
