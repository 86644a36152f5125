// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The DAG runner (spec §4.7): builds and validates the dependency graph,
//! starts Services in topologically consistent waves, stops them in
//! reverse, diffs definition revisions on `Reload`, and enforces
//! at-most-one concurrent lifecycle transition per Service (delegated to
//! `Service::start`/`stop` themselves, spec §4.1).

use crate::binding::{bind, ContainerRuntimes};
use crate::composite::{composite_client_factory, CompositeArgs, CompositeRunner};
use crate::error::OrchestratorError;
use crate::registry::ServiceRegistry;
use crate::service::Service;
use conduit_adapters::runner::Runner;
use conduit_core::{RetryPolicy, ServiceKind, ServiceName, ToolInvoker};
use conduit_definitions::{DefinitionRevision, ServiceClassDefinition, ServiceDefinition};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a Start sweep (spec §4.7 step 5: "reports a summary
/// `{started, failed, blocked}`").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartSummary {
    pub started: Vec<ServiceName>,
    pub failed: Vec<ServiceName>,
    pub blocked: Vec<ServiceName>,
}

/// Outcome of a `Reload` diff (spec §6 Control plane: "starts new, stops
/// removed, restarts mutated Services").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadSummary {
    pub added: Vec<ServiceName>,
    pub removed: Vec<ServiceName>,
    pub restarted: Vec<ServiceName>,
    pub unchanged: Vec<ServiceName>,
}

/// Owns the Registry and the current revision's definitions, and drives
/// the topological start/stop/reload algorithms over them. Holds the
/// process-wide root cancellation scope (spec §5 "children of the
/// Orchestrator's root scope").
pub struct Orchestrator {
    registry: Arc<ServiceRegistry>,
    container_runtimes: ContainerRuntimes,
    root_cancel: CancellationToken,
    definitions: parking_lot::Mutex<HashMap<ServiceName, ServiceDefinition>>,
}

impl Orchestrator {
    pub fn new(container_runtimes: ContainerRuntimes) -> Arc<Self> {
        Arc::new(Self {
            registry: ServiceRegistry::new(),
            container_runtimes,
            root_cancel: CancellationToken::new(),
            definitions: parking_lot::Mutex::new(HashMap::new()),
        })
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Build Services from a fresh revision and run the topological Start
    /// sweep (spec §4.7 steps 1-5). Intended for the first load; `reload`
    /// is what a running Orchestrator uses afterward.
    pub async fn start(&self, revision: &DefinitionRevision) -> Result<StartSummary, OrchestratorError> {
        let order = topological_order(&revision.services)?;
        for def in &revision.services {
            self.spawn_service(def)?;
        }
        self.definitions.lock().extend(revision.services.iter().map(|d| (d.name.clone(), d.clone())));
        Ok(self.start_waves(&order).await)
    }

    /// Re-evaluate the Definition Store's latest revision against the
    /// currently-running one: start Services that are new, stop ones that
    /// are gone, restart ones whose `ServiceDefinition` changed, and leave
    /// unchanged ones alone (spec §6 `Reload`).
    pub async fn reload(&self, revision: &DefinitionRevision) -> Result<ReloadSummary, OrchestratorError> {
        let new_order = topological_order(&revision.services)?;
        let new_by_name: HashMap<&str, &ServiceDefinition> =
            revision.services.iter().map(|d| (d.name.as_str(), d)).collect();

        let mut summary = ReloadSummary::default();
        let previous = self.definitions.lock().clone();

        let removed_names: Vec<ServiceName> =
            previous.keys().filter(|name| !new_by_name.contains_key(name.as_str())).cloned().collect();
        if !removed_names.is_empty() {
            self.stop_named(&removed_names).await;
            for name in &removed_names {
                self.registry.deregister(name);
            }
            summary.removed = removed_names;
        }

        for def in &revision.services {
            match previous.get(&def.name) {
                None => {
                    self.spawn_service(def)?;
                    summary.added.push(def.name.clone());
                }
                Some(old) if old != def => {
                    // Stop the old runtimeHandle (cancelling its health
                    // monitor and scope) before deregistering, the same
                    // way `removed_names` does above — otherwise the old
                    // subprocess/container is never reaped and a second
                    // one starts under the same name (spec §3 "at most
                    // one runtimeHandle per Service").
                    self.stop_named(std::slice::from_ref(&def.name)).await;
                    self.registry.deregister(&def.name);
                    self.spawn_service(def)?;
                    summary.restarted.push(def.name.clone());
                }
                Some(_) => summary.unchanged.push(def.name.clone()),
            }
        }

        *self.definitions.lock() =
            revision.services.iter().map(|d| (d.name.clone(), d.clone())).collect();

        let to_start: Vec<ServiceName> =
            summary.added.iter().chain(summary.restarted.iter()).cloned().collect();
        let order: Vec<ServiceName> = new_order.into_iter().filter(|n| to_start.contains(n)).collect();
        self.start_waves(&order).await;

        Ok(summary)
    }

    fn spawn_service(&self, def: &ServiceDefinition) -> Result<(), OrchestratorError> {
        let (runner, client_factory) = bind(def, &self.container_runtimes)
            .map_err(|e| OrchestratorError::Service(crate::error::ServiceError::StartFailed(e.to_string())))?;
        let service = Service::new(
            def.name.clone(),
            def.kind,
            def.depends_on.clone(),
            runner,
            client_factory,
            def.retry_policy,
            self.registry.event_sink(),
            &self.root_cancel,
        );
        self.registry.register(Arc::clone(&service))?;
        crate::health::spawn(service, def.health_check_interval);
        Ok(())
    }

    /// Start Services wave-by-wave: each wave is every Service whose
    /// dependencies are already Running, started concurrently; the
    /// Orchestrator waits on Registry events until the frontier stabilizes
    /// (spec §4.7 steps 3-5).
    async fn start_waves(&self, order: &[ServiceName]) -> StartSummary {
        let mut remaining: Vec<ServiceName> = order.to_vec();
        let mut summary = StartSummary::default();
        let mut subscription = self.registry.subscribe();

        loop {
            let ready: Vec<ServiceName> = remaining
                .iter()
                .filter(|name| self.dependencies_running(name))
                .cloned()
                .collect();
            if ready.is_empty() {
                break;
            }
            remaining.retain(|n| !ready.contains(n));

            let mut handles = Vec::with_capacity(ready.len());
            for name in &ready {
                if let Ok(service) = self.registry.get(name) {
                    let name = name.clone();
                    handles.push(tokio::spawn(async move {
                        let result = service.start().await;
                        (name, result)
                    }));
                }
            }
            for handle in handles {
                if let Ok((name, result)) = handle.await {
                    match result {
                        Ok(()) => summary.started.push(name),
                        Err(_) => summary.failed.push(name),
                    }
                }
            }

            if remaining.is_empty() {
                break;
            }
            // Wait for the next state change before re-evaluating the
            // frontier; a Service that just failed won't unblock anything,
            // but one that reached Running might.
            let _ = tokio::time::timeout(Duration::from_secs(1), subscription.recv()).await;
        }

        // Anything left never had its dependencies satisfied: blocked
        // (spec §4.7 step 5 "dependents remain Blocked").
        summary.blocked = remaining;
        summary
    }

    fn dependencies_running(&self, name: &ServiceName) -> bool {
        let Ok(service) = self.registry.get(name) else { return false };
        service
            .dependencies()
            .iter()
            .all(|dep| self.registry.get(dep).map(|d| d.snapshot().is_ready()).unwrap_or(false))
    }

    /// Stop every Service in reverse topological order, waiting for each
    /// layer to settle before proceeding to its dependents' dependencies
    /// (spec §4.7 "Stop algorithm"). Returns `false` if any Service's Stop
    /// timed out (spec §6 "Exit behavior": "exit 1 if Stop timed out on
    /// any Service").
    pub async fn stop_all(&self) -> bool {
        let names: Vec<ServiceName> = self.registry.list().iter().map(|s| s.name().clone()).collect();
        self.stop_named(&names).await
    }

    /// Every caller of this method is retiring the `Arc<Service>` for
    /// good (full shutdown, a reload removal, or a reload-driven
    /// mutated-definition replacement) — never a plain restart — so each
    /// Service's whole-Service scope is cancelled alongside `stop()`,
    /// ending its Health Monitor task instead of leaking it.
    async fn stop_named(&self, names: &[ServiceName]) -> bool {
        let services: Vec<Arc<Service>> =
            names.iter().filter_map(|n| self.registry.get(n).ok()).collect();
        let order = reverse_topological(&services);
        let mut clean = true;
        for layer in order {
            let mut handles = Vec::with_capacity(layer.len());
            for service in layer {
                handles.push(tokio::spawn(async move {
                    let result = service.stop(DEFAULT_STOP_TIMEOUT).await;
                    service.cancellation().cancel();
                    result
                }));
            }
            for handle in handles {
                match handle.await {
                    Ok(Ok(())) => {}
                    Ok(Err(_)) | Err(_) => clean = false,
                }
            }
        }
        clean
    }

    /// Build and register a Composite Service from a Service Class
    /// definition (spec §4.10). Unlike `LocalCommand`/`Container`
    /// Services, Composite Services don't go through `bind`: their
    /// Runner scripts aggregator tool calls through `invoker` instead of
    /// spawning a process or container, so the caller (`conduit-daemon`,
    /// which constructs the Aggregator before wiring any Composite
    /// Services) supplies the `ToolInvoker` handle directly.
    pub fn spawn_composite(
        &self,
        name: ServiceName,
        class: ServiceClassDefinition,
        args: CompositeArgs,
        depends_on: Vec<ServiceName>,
        invoker: Arc<dyn ToolInvoker>,
    ) -> Result<Arc<Service>, OrchestratorError> {
        let interval = class.health_check_interval;
        let health_check_tool = if class.health_check_enabled { class.health_check_tool.clone() } else { None };
        let runner: Arc<dyn Runner> =
            Arc::new(CompositeRunner::new(name.clone(), class, args, Arc::clone(&invoker)));
        let client_factory = composite_client_factory(invoker, health_check_tool);
        let service = Service::new(
            name,
            ServiceKind::Composite,
            depends_on,
            runner,
            client_factory,
            RetryPolicy::default(),
            self.registry.event_sink(),
            &self.root_cancel,
        );
        self.registry.register(Arc::clone(&service))?;
        crate::health::spawn(Arc::clone(&service), interval);
        Ok(service)
    }

    /// `RestartService(name)` (spec §6 Control plane).
    pub async fn restart_service(&self, name: &ServiceName) -> Result<(), OrchestratorError> {
        let service = self.registry.get(name)?;
        service.restart().await?;
        Ok(())
    }

    /// `GetState()` (spec §6 Control plane): a snapshot of every Service's
    /// state. The catalog summary half lives on the Aggregator; callers
    /// that need both compose this with `Aggregator::catalog_summary`.
    pub fn get_state(&self) -> Vec<conduit_core::ServiceSnapshot> {
        self.registry.list_snapshots()
    }

    /// Cancel the root scope: every Service's scope cancels in turn (spec
    /// §5 "cancelling the Orchestrator scope triggers a full reverse-
    /// topological Stop"), then wait for all Services to settle. Returns
    /// `false` if any Service's Stop timed out, for the caller's exit code
    /// (spec §6 "Exit behavior").
    pub async fn shutdown(&self) -> bool {
        self.root_cancel.cancel();
        self.stop_all().await
    }

    pub fn subscribe(&self) -> crate::registry::Subscription {
        self.registry.subscribe()
    }
}

/// Kahn's algorithm over `depends_on` edges, returning a flat start order
/// (not grouped into waves — `start_waves` re-derives waves dynamically
/// from live Registry state since Failed Services must not unblock
/// dependents). `CyclicDependencies` names every Service left with
/// unresolved in-edges once the queue drains (spec §4.7 step 1).
fn topological_order(defs: &[ServiceDefinition]) -> Result<Vec<ServiceName>, OrchestratorError> {
    let names: HashSet<&str> = defs.iter().map(|d| d.name.as_str()).collect();
    let mut in_degree: HashMap<&str, usize> = defs.iter().map(|d| (d.name.as_str(), 0)).collect();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for def in defs {
        for dep in &def.depends_on {
            if !names.contains(dep.as_str()) {
                continue; // unresolved deps are a Definition Store validation concern, not ours
            }
            if let Some(degree) = in_degree.get_mut(def.name.as_str()) {
                *degree += 1;
            }
            dependents.entry(dep.as_str()).or_default().push(def.name.as_str());
        }
    }

    let mut queue: Vec<&str> = in_degree.iter().filter(|(_, &d)| d == 0).map(|(&n, _)| n).collect();
    queue.sort_unstable();
    let mut order = Vec::with_capacity(defs.len());
    let mut cursor = 0;
    while cursor < queue.len() {
        let name = queue[cursor];
        cursor += 1;
        order.push(ServiceName::new(name));
        if let Some(children) = dependents.get(name) {
            let mut next_ready = Vec::new();
            for &child in children {
                if let Some(degree) = in_degree.get_mut(child) {
                    *degree -= 1;
                    if *degree == 0 {
                        next_ready.push(child);
                    }
                }
            }
            next_ready.sort_unstable();
            queue.extend(next_ready);
        }
    }

    if order.len() != defs.len() {
        let resolved: HashSet<&str> = order.iter().map(|n| n.as_str()).collect();
        let cyclic = defs
            .iter()
            .map(|d| d.name.clone())
            .filter(|n| !resolved.contains(n.as_str()))
            .collect();
        return Err(OrchestratorError::CyclicDependencies(cyclic));
    }

    Ok(order)
}

/// Group live Services into reverse-topological layers: leaves (nothing
/// depends on them) first, working back toward roots, so Stop can be
/// issued per-layer and awaited before the next (spec §4.7 "wait for each
/// layer to reach Stopped ... before proceeding to its parents").
fn reverse_topological(services: &[Arc<Service>]) -> Vec<Vec<Arc<Service>>> {
    let mut remaining: Vec<Arc<Service>> = services.to_vec();
    let mut layers = Vec::new();

    while !remaining.is_empty() {
        let remaining_names: HashSet<ServiceName> = remaining.iter().map(|s| s.name().clone()).collect();
        let depended_upon: HashSet<ServiceName> = remaining
            .iter()
            .flat_map(|s| s.dependencies().iter().cloned())
            .filter(|dep| remaining_names.contains(dep))
            .collect();

        let (leaves, rest): (Vec<_>, Vec<_>) =
            remaining.into_iter().partition(|s| !depended_upon.contains(s.name()));

        if leaves.is_empty() {
            // Cycles are rejected at definition-load time (spec §4.7 step
            // 1); if one somehow survives to here, stop everything in one
            // layer rather than looping forever.
            layers.push(rest);
            break;
        }
        layers.push(leaves);
        remaining = rest;
    }

    layers
}
