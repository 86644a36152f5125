// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The live Service object (spec §4.1): owns a `Runner`/`McpClient` pair,
//! drives the lifecycle state machine, and emits events through a
//! message-passing sink rather than a direct reference back to the
//! Registry (spec §9 "Cyclic references").

use crate::error::ServiceError;
use conduit_adapters::runner::{Runner, RunnerError, RunnerSignal, RuntimeHandle};
use conduit_adapters::McpClient;
use conduit_core::{EpochCounter, Event, Health, RetryPolicy, ServiceKind, ServiceName, ServiceSnapshot, ServiceState};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Builds the `McpClient` bound to a freshly-started runtime handle.
/// Boxed rather than a concrete per-kind type so `Service` stays kind-
/// agnostic (spec §9 "the kind discriminant lives in the definition").
pub type ClientFactory = Arc<
    dyn Fn(RuntimeHandle) -> Pin<Box<dyn Future<Output = Result<Arc<dyn McpClient>, ServiceError>> + Send>>
        + Send
        + Sync,
>;

const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_RESTART_DELAY: Duration = Duration::from_secs(1);

struct ServiceInner {
    state: ServiceState,
    health: Health,
    last_error: Option<String>,
    last_health_error: Option<String>,
    runtime_handle: Option<RuntimeHandle>,
    client: Option<Arc<dyn McpClient>>,
    /// The current attempt's scope: a fresh child of `Service::cancel`
    /// created by every `start_inner`, and what `watch_exit`'s crash
    /// detection and `fail_and_maybe_retry`'s backoff wait are bound to.
    /// `stop()` cancels this, not `Service::cancel` — so a subsequent
    /// `start()` (via `restart()`) gets its own live scope instead of an
    /// already-cancelled one, and the Health Monitor (bound to
    /// `Service::cancel`) keeps running across the restart.
    run_cancel: CancellationToken,
}

/// A uniformly supervised unit (spec §3). Owned for its entire lifetime
/// by the Registry; other components only ever see it through `Arc`.
pub struct Service {
    name: ServiceName,
    kind: ServiceKind,
    pub(crate) dependencies: Vec<ServiceName>,
    runner: Arc<dyn Runner>,
    client_factory: ClientFactory,
    retry_policy: RetryPolicy,
    epoch: EpochCounter,
    inner: parking_lot::Mutex<ServiceInner>,
    /// Enforces "at-most-one concurrent lifecycle transition" (spec §4.1
    /// `AlreadyRunning`). A plain bool flag rather than an async mutex:
    /// Start must *fail fast*, not queue behind a pending Start.
    transitioning: AtomicBool,
    events: mpsc::UnboundedSender<Event>,
    /// The whole-Service teardown scope (spec §5 "children of the
    /// Orchestrator's root scope"): parent of every attempt's
    /// `ServiceInner::run_cancel`, and what the Health Monitor (spawned
    /// once per Service, not per attempt) is bound to. Only cancelled
    /// when this Service is being permanently torn down — by the
    /// Orchestrator's reverse-topological shutdown cascading from
    /// `root_cancel`, or explicitly when `reload` removes or replaces it
    /// — never by a plain `stop()`/`restart()`.
    cancel: CancellationToken,
    retry_attempt: std::sync::atomic::AtomicU32,
}

impl Service {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: ServiceName,
        kind: ServiceKind,
        dependencies: Vec<ServiceName>,
        runner: Arc<dyn Runner>,
        client_factory: ClientFactory,
        retry_policy: RetryPolicy,
        events: mpsc::UnboundedSender<Event>,
        parent_cancel: &CancellationToken,
    ) -> Arc<Self> {
        let cancel = parent_cancel.child_token();
        let run_cancel = cancel.child_token();
        Arc::new(Self {
            name,
            kind,
            dependencies,
            runner,
            client_factory,
            retry_policy,
            epoch: EpochCounter::new(),
            inner: parking_lot::Mutex::new(ServiceInner {
                state: ServiceState::Unknown,
                health: Health::Unknown,
                last_error: None,
                last_health_error: None,
                runtime_handle: None,
                client: None,
                run_cancel,
            }),
            transitioning: AtomicBool::new(false),
            events,
            cancel,
            retry_attempt: std::sync::atomic::AtomicU32::new(0),
        })
    }

    pub fn name(&self) -> &ServiceName {
        &self.name
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn dependencies(&self) -> &[ServiceName] {
        &self.dependencies
    }

    /// The whole-Service teardown scope (not the current attempt's scope
    /// — see `ServiceInner::run_cancel`). Used by the Health Monitor and
    /// by the Orchestrator to tear a Service down permanently.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn snapshot(&self) -> ServiceSnapshot {
        let inner = self.inner.lock();
        ServiceSnapshot {
            name: self.name.clone(),
            kind: self.kind,
            state: inner.state,
            health: inner.health,
            epoch: self.epoch.current(),
            last_error: inner.last_error.clone(),
            last_health_error: inner.last_health_error.clone(),
            has_runtime_handle: inner.runtime_handle.is_some(),
        }
    }

    pub fn client(&self) -> Option<Arc<dyn McpClient>> {
        self.inner.lock().client.clone()
    }

    fn set_state(&self, new_state: ServiceState, error: Option<String>) {
        let (old_state, health, epoch) = {
            let mut inner = self.inner.lock();
            let old_state = inner.state;
            inner.state = new_state;
            inner.last_error = error.clone();
            (old_state, inner.health, self.epoch.current())
        };
        if old_state != new_state {
            let _ = self.events.send(Event::StateChanged {
                name: self.name.clone(),
                kind: self.kind,
                old_state,
                new_state,
                health,
                error,
                epoch,
            });
        }
    }

    pub(crate) fn set_health(&self, new_health: Health, error: Option<String>) {
        let old_health = {
            let mut inner = self.inner.lock();
            let old = inner.health;
            inner.health = new_health;
            inner.last_health_error = error.clone();
            old
        };
        if old_health != new_health {
            let _ = self.events.send(Event::HealthChanged {
                name: self.name.clone(),
                old_health,
                new_health,
                error,
            });
        }
    }

    /// Start(ctx) — spec §4.1. Idempotent if already Starting/Running;
    /// `AlreadyRunning` if a prior Start hasn't settled.
    pub async fn start(self: &Arc<Self>) -> Result<(), ServiceError> {
        {
            let state = self.inner.lock().state;
            if matches!(state, ServiceState::Starting | ServiceState::Running) {
                return Ok(());
            }
        }
        if self.transitioning.swap(true, Ordering::SeqCst) {
            return Err(ServiceError::AlreadyRunning);
        }
        let result = self.start_inner().await;
        self.transitioning.store(false, Ordering::SeqCst);
        result
    }

    async fn start_inner(self: &Arc<Self>) -> Result<(), ServiceError> {
        self.set_state(ServiceState::Starting, None);
        let epoch = self.epoch.advance();

        let (signal_tx, mut signal_rx) = mpsc::channel(32);
        // A fresh scope for this attempt, a child of the whole-Service
        // scope rather than of any previous attempt's (already-cancelled,
        // once `stop()` has run) scope.
        let run_cancel = self.cancel.child_token();
        self.inner.lock().run_cancel = run_cancel.clone();

        let handle = match self.runner.start(epoch, signal_tx, run_cancel).await {
            Ok(handle) => handle,
            Err(err) => {
                self.fail_and_maybe_retry(format!("start failed: {err}"));
                return Err(ServiceError::StartFailed(err.to_string()));
            }
        };
        self.inner.lock().runtime_handle = Some(handle.clone());

        // Per SPEC_FULL.md §12 Open Question 2: both the readiness sentinel
        // (if the runner uses one) and Client.Initialize must hold before
        // Starting -> Running.
        let ready = wait_for_ready(&mut signal_rx, &self.name, &self.events).await;
        if !ready {
            let message = "runner exited before reporting ready".to_string();
            self.fail_and_maybe_retry(message.clone());
            return Err(ServiceError::StartFailed(message));
        }

        let client = match (self.client_factory)(handle.clone()).await {
            Ok(client) => client,
            Err(err) => {
                self.fail_and_maybe_retry(format!("client build failed: {err}"));
                return Err(err);
            }
        };
        if let Err(err) = client.initialize().await {
            self.fail_and_maybe_retry(format!("initialize failed: {err}"));
            return Err(ServiceError::InitializeFailed(err.to_string()));
        }

        self.inner.lock().client = Some(client);
        self.retry_attempt.store(0, Ordering::SeqCst);
        self.set_state(ServiceState::Running, None);
        self.spawn_signal_forwarder(signal_rx);
        Ok(())
    }

    fn fail_and_maybe_retry(self: &Arc<Self>, message: String) {
        self.set_state(ServiceState::Failed, Some(message));
        if !self.retry_policy.enabled {
            return;
        }
        let attempt = self.retry_attempt.fetch_add(1, Ordering::SeqCst);
        let backoff = self.retry_policy.backoff_for_attempt(attempt);
        let this = Arc::clone(self);
        let cancel = self.inner.lock().run_cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(backoff) => {}
                _ = cancel.cancelled() => return,
            }
            this.set_state(ServiceState::Retrying, None);
            let _ = this.start().await;
        });
    }

    /// Forward Log/Exited signals that arrive after Running, for as long
    /// as the runtime lives; an unexpected Exited flips the Service to
    /// Failed (spec §4.1: "runtimeHandle exits unexpectedly").
    fn spawn_signal_forwarder(self: &Arc<Self>, mut signal_rx: mpsc::Receiver<RunnerSignal>) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(signal) = signal_rx.recv().await {
                match signal {
                    RunnerSignal::Log { level, line } => {
                        let _ = this.events.send(Event::Log { name: this.name.clone(), level, line });
                    }
                    RunnerSignal::Exited { code, error } => {
                        if this.inner.lock().state == ServiceState::Running {
                            let detail = error.unwrap_or_else(|| format!("exited with code {code:?}"));
                            this.inner.lock().runtime_handle = None;
                            this.fail_and_maybe_retry(detail);
                        }
                        return;
                    }
                    RunnerSignal::PortMapped { .. } | RunnerSignal::Ready => {}
                }
            }
        });
    }

    /// Stop(ctx) — spec §4.1. Idempotent if already Stopped; safe from any
    /// state. Bounded by `timeout` (default 10s), returning `StopTimeout`
    /// if the runner doesn't reap within it.
    pub async fn stop(self: &Arc<Self>, timeout: Duration) -> Result<(), ServiceError> {
        let (handle, run_cancel) = {
            let inner = self.inner.lock();
            if inner.state == ServiceState::Stopped {
                return Ok(());
            }
            (inner.runtime_handle.clone(), inner.run_cancel.clone())
        };
        // Cancel this attempt's scope only — not the whole-Service
        // `self.cancel` the Health Monitor runs under, so it survives a
        // `restart()` instead of dying after the first `stop()`.
        run_cancel.cancel();
        self.set_state(ServiceState::Stopping, None);

        if let Some(client) = self.inner.lock().client.take() {
            client.close().await;
        }

        if let Some(handle) = handle {
            let stop_timeout = if timeout.is_zero() { DEFAULT_STOP_TIMEOUT } else { timeout };
            match self.runner.stop(&handle, stop_timeout).await {
                Ok(()) => {}
                Err(RunnerError::StopTimeout(d)) => {
                    self.set_state(ServiceState::Failed, Some(format!("stop timed out after {d:?}")));
                    return Err(ServiceError::StopTimeout(d));
                }
                Err(err) => {
                    self.set_state(ServiceState::Failed, Some(err.to_string()));
                    return Err(ServiceError::StartFailed(err.to_string()));
                }
            }
        }

        self.inner.lock().runtime_handle = None;
        self.set_state(ServiceState::Stopped, None);
        Ok(())
    }

    /// Restart(ctx) — Stop then Start with a bounded inter-step delay
    /// (spec §4.1 default 1s). Epoch increments once, inside `start`.
    pub async fn restart(self: &Arc<Self>) -> Result<(), ServiceError> {
        self.stop(DEFAULT_STOP_TIMEOUT).await?;
        tokio::time::sleep(DEFAULT_RESTART_DELAY).await;
        self.start().await
    }

    /// CheckHealth(ctx) — synchronous probe (spec §4.5). Only valid to
    /// call while Running; the Health Monitor suspends otherwise.
    pub async fn check_health(self: &Arc<Self>) -> Health {
        let client = self.client();
        let Some(client) = client else {
            return Health::Unknown;
        };
        match client.list_tools().await {
            Ok(_) => Health::Healthy,
            Err(err) => {
                self.set_health(Health::Checking, Some(err.to_string()));
                Health::Unhealthy
            }
        }
    }
}

/// Wait on the signal channel for `Ready`, or for the channel to close
/// (runner exited before reporting ready). Logs are forwarded as they
/// arrive so a slow-starting child's output isn't lost.
async fn wait_for_ready(
    signal_rx: &mut mpsc::Receiver<RunnerSignal>,
    name: &ServiceName,
    events: &mpsc::UnboundedSender<Event>,
) -> bool {
    while let Some(signal) = signal_rx.recv().await {
        match signal {
            RunnerSignal::Ready => return true,
            RunnerSignal::Log { level, line } => {
                let _ = events.send(Event::Log { name: name.clone(), level, line });
            }
            RunnerSignal::Exited { .. } => return false,
            RunnerSignal::PortMapped { .. } => {}
        }
    }
    false
}

/// Test-only convenience kept off the public surface: lets
/// `conduit-engine`'s own tests construct a `Service` without going
/// through `conduit-definitions`/`conduit-adapters` factories.
#[cfg(test)]
pub(crate) fn test_service(
    name: &str,
    dependencies: Vec<ServiceName>,
    runner: Arc<dyn Runner>,
    client_factory: ClientFactory,
    events: mpsc::UnboundedSender<Event>,
    parent_cancel: &CancellationToken,
) -> Arc<Service> {
    Service::new(
        ServiceName::new(name),
        ServiceKind::Mock,
        dependencies,
        runner,
        client_factory,
        RetryPolicy::DISABLED,
        events,
        parent_cancel,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_adapters::test_support::{FakeMcpClient, FakeRunner};

    fn mock_client_factory(client: Arc<dyn McpClient>) -> ClientFactory {
        Arc::new(move |_handle| {
            let client = Arc::clone(&client);
            Box::pin(async move { Ok(client) })
        })
    }

    #[tokio::test]
    async fn start_then_stop_reaches_running_then_stopped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let runner: Arc<dyn Runner> = Arc::new(FakeRunner::new(ServiceName::new("svc")));
        let client: Arc<dyn McpClient> = Arc::new(FakeMcpClient::empty());
        let cancel = CancellationToken::new();
        let service = test_service("svc", vec![], runner, mock_client_factory(client), tx, &cancel);

        service.start().await.expect("start");
        assert_eq!(service.snapshot().state, ServiceState::Running);
        assert_eq!(service.snapshot().epoch.0, 1);

        service.stop(Duration::from_secs(1)).await.expect("stop");
        assert_eq!(service.snapshot().state, ServiceState::Stopped);

        let mut saw_running = false;
        while let Ok(event) = rx.try_recv() {
            if let Event::StateChanged { new_state: ServiceState::Running, .. } = event {
                saw_running = true;
            }
        }
        assert!(saw_running);
    }

    #[tokio::test]
    async fn concurrent_start_calls_fail_with_already_running() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let runner: Arc<dyn Runner> =
            Arc::new(FakeRunner::new(ServiceName::new("svc")).with_start_delay(Duration::from_millis(50)));
        let client: Arc<dyn McpClient> = Arc::new(FakeMcpClient::empty());
        let cancel = CancellationToken::new();
        let service = test_service("svc", vec![], runner, mock_client_factory(client), tx, &cancel);

        let service_clone = Arc::clone(&service);
        let first = tokio::spawn(async move { service_clone.start().await });
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = service.start().await;

        assert!(matches!(second, Err(ServiceError::AlreadyRunning)));
        first.await.expect("join").expect("first start");
    }

    #[tokio::test]
    async fn failed_start_without_retry_policy_stays_failed() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let fake = FakeRunner::new(ServiceName::new("svc"));
        fake.fail_start.store(true, Ordering::SeqCst);
        let runner: Arc<dyn Runner> = Arc::new(fake);
        let client: Arc<dyn McpClient> = Arc::new(FakeMcpClient::empty());
        let cancel = CancellationToken::new();
        let service = Service::new(
            ServiceName::new("svc"),
            ServiceKind::Mock,
            vec![],
            runner,
            mock_client_factory(client),
            RetryPolicy::DISABLED,
            tx,
            &cancel,
        );

        let result = service.start().await;
        assert!(result.is_err());
        assert_eq!(service.snapshot().state, ServiceState::Failed);
    }

    #[tokio::test]
    async fn failed_initialize_transitions_to_failed_with_message() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let runner: Arc<dyn Runner> = Arc::new(FakeRunner::new(ServiceName::new("svc")));
        let fake_client = FakeMcpClient::empty();
        fake_client.fail_initialize.store(true, Ordering::SeqCst);
        let client: Arc<dyn McpClient> = Arc::new(fake_client);
        let cancel = CancellationToken::new();
        let service = test_service("svc", vec![], runner, mock_client_factory(client), tx, &cancel);

        let result = service.start().await;
        assert!(matches!(result, Err(ServiceError::InitializeFailed(_))));
        assert_eq!(service.snapshot().state, ServiceState::Failed);
    }
}
