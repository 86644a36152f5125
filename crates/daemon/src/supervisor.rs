// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ties the Definition Store, Orchestrator, and Aggregator together into
//! the single object `conduit-daemon`'s control plane and signal handler
//! drive (spec §6 Control plane, §4.10 Composite Service instantiation).
//!
//! Composite Services (spec §4.10) sit outside the core `mcpServers` DAG
//! the Orchestrator schedules directly (spec §4.9's Definition Store
//! produces `services`/`service_classes` as separate lists) — this is
//! the layer that threads a Service Class's `dependsOn` through a bounded
//! wait against already-running Services before instantiating it, since
//! `Orchestrator::spawn_composite` itself, like `Service::start`, applies
//! no dependency gate of its own (spec §4.1: dependency gating belongs to
//! the caller driving the DAG, not the Service).

use conduit_aggregator::Aggregator;
use conduit_core::{ServiceName, ServiceState, ToolInvoker};
use conduit_definitions::{DefinitionRevision, DefinitionStore};
use conduit_engine::{CompositeArgs, Orchestrator, ReloadSummary, StartSummary};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::error::LifecycleError;

const COMPOSITE_DEPENDENCY_WAIT: Duration = Duration::from_secs(30);

pub struct Supervisor {
    store: DefinitionStore,
    orchestrator: Arc<Orchestrator>,
    aggregator: Arc<Aggregator>,
}

impl Supervisor {
    pub fn new(store: DefinitionStore, orchestrator: Arc<Orchestrator>, aggregator: Arc<Aggregator>) -> Self {
        Self { store, orchestrator, aggregator }
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    /// First load: reads the current revision, runs the topological
    /// Start sweep, then instantiates any Composite Services.
    pub async fn bootstrap(&self) -> Result<StartSummary, LifecycleError> {
        let revision = self.store.reload()?;
        let summary = self.orchestrator.start(&revision).await?;
        self.spawn_composites(&revision).await;
        Ok(summary)
    }

    /// `Reload` (spec §6): re-evaluate the Definition Store and diff.
    /// Composite Services are re-scanned the same way — any class not
    /// already registered is instantiated; already-registered ones are
    /// left alone (their lifecycle tools have no notion of "mutated
    /// definition" the way `ServiceDefinition` does).
    pub async fn reload(&self) -> Result<ReloadSummary, LifecycleError> {
        let revision = self.store.reload()?;
        for violation in &revision.validation_errors {
            warn!(%violation, "definition validation error; entry excluded");
        }
        let summary = self.orchestrator.reload(&revision).await?;
        self.spawn_composites(&revision).await;
        Ok(summary)
    }

    async fn spawn_composites(&self, revision: &DefinitionRevision) {
        for class in &revision.service_classes {
            let name = ServiceName::new(class.name.clone());
            if self.orchestrator.registry().get(&name).is_ok() {
                continue;
            }

            for dep in &class.depends_on {
                if !self.wait_for_running(dep).await {
                    warn!(class = %class.name, dependency = %dep, "composite service dependency never reached Running; instantiating anyway");
                }
            }

            let invoker: Arc<dyn ToolInvoker> = Arc::clone(&self.aggregator) as Arc<dyn ToolInvoker>;
            let depends_on = class.depends_on.clone();
            match self.orchestrator.spawn_composite(
                name.clone(),
                class.clone(),
                CompositeArgs::default(),
                depends_on,
                invoker,
            ) {
                Ok(service) => {
                    if let Err(err) = service.start().await {
                        warn!(class = %class.name, %err, "composite service failed to start");
                    }
                }
                Err(err) => warn!(class = %class.name, %err, "failed to instantiate composite service"),
            }
        }
    }

    async fn wait_for_running(&self, name: &ServiceName) -> bool {
        let deadline = tokio::time::Instant::now() + COMPOSITE_DEPENDENCY_WAIT;
        loop {
            if let Ok(service) = self.orchestrator.registry().get(name) {
                if service.snapshot().state == ServiceState::Running {
                    return true;
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }
}
