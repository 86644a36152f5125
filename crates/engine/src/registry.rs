// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service Registry (spec §4.6): in-process index of all Services plus a
//! pub/sub fan-out of lifecycle/log events. Single writer for the map
//! (spec §5 "Registry map: single writer at a time"); readers take a
//! cheap snapshot.

use crate::error::RegistryError;
use crate::service::Service;
use conduit_core::{Event, ServiceName, ServiceSnapshot};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Bound on a subscriber's event queue (spec §4.6 default 256). Past
/// this, the oldest events are dropped and a drop-count is surfaced on
/// the next delivered event rather than blocking the publisher.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 256;

pub struct ServiceRegistry {
    services: parking_lot::RwLock<HashMap<ServiceName, Arc<Service>>>,
    publisher: broadcast::Sender<Event>,
    /// Fed by every Service's own event sink (spec §9: Services talk to
    /// the Registry only by emitting events, never by holding a
    /// reference back to it); forwarded onto `publisher` by `run_relay`.
    relay_tx: mpsc::UnboundedSender<Event>,
}

pub struct Subscription {
    inner: broadcast::Receiver<Event>,
    dropped_before_next: u64,
}

impl Subscription {
    /// Receive the next event, or `None` once the Registry itself is
    /// gone. A `Lagged` broadcast error is turned into a synthetic
    /// `EventsDropped` delivered ahead of the next real event (spec §4.6
    /// "a dropped-count is surfaced on the next delivered event").
    pub async fn recv(&mut self) -> Option<Event> {
        if self.dropped_before_next > 0 {
            let count = self.dropped_before_next;
            self.dropped_before_next = 0;
            return Some(Event::EventsDropped { count });
        }
        loop {
            match self.inner.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    self.dropped_before_next = 0;
                    return Some(Event::EventsDropped { count: n });
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl ServiceRegistry {
    pub fn new() -> Arc<Self> {
        let (publisher, _) = broadcast::channel(DEFAULT_SUBSCRIBER_BUFFER);
        let (relay_tx, relay_rx) = mpsc::unbounded_channel();
        let registry = Arc::new(Self { services: parking_lot::RwLock::new(HashMap::new()), publisher, relay_tx });
        registry.clone().spawn_relay(relay_rx);
        registry
    }

    fn spawn_relay(self: Arc<Self>, mut relay_rx: mpsc::UnboundedReceiver<Event>) {
        tokio::spawn(async move {
            while let Some(event) = relay_rx.recv().await {
                // A broadcast send error just means there are currently no
                // subscribers; that's not a failure for the publisher.
                let _ = self.publisher.send(event);
            }
        });
    }

    /// The sink every new Service is constructed with (spec §9 message-
    /// passing back reference).
    pub fn event_sink(&self) -> mpsc::UnboundedSender<Event> {
        self.relay_tx.clone()
    }

    pub fn register(&self, service: Arc<Service>) -> Result<(), RegistryError> {
        let mut services = self.services.write();
        if services.contains_key(service.name()) {
            return Err(RegistryError::DuplicateName(service.name().clone()));
        }
        services.insert(service.name().clone(), service);
        Ok(())
    }

    pub fn deregister(&self, name: &ServiceName) {
        self.services.write().remove(name);
    }

    pub fn get(&self, name: &ServiceName) -> Result<Arc<Service>, RegistryError> {
        self.services.read().get(name).cloned().ok_or_else(|| RegistryError::NotFound(name.clone()))
    }

    pub fn list(&self) -> Vec<Arc<Service>> {
        self.services.read().values().cloned().collect()
    }

    pub fn list_snapshots(&self) -> Vec<ServiceSnapshot> {
        self.services.read().values().map(|s| s.snapshot()).collect()
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription { inner: self.publisher.subscribe(), dropped_before_next: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_service;
    use conduit_adapters::test_support::{FakeMcpClient, FakeRunner};
    use conduit_adapters::{McpClient, Runner};
    use tokio_util::sync::CancellationToken;

    fn client_factory(client: Arc<dyn McpClient>) -> crate::service::ClientFactory {
        Arc::new(move |_handle| {
            let client = Arc::clone(&client);
            Box::pin(async move { Ok(client) })
        })
    }

    #[tokio::test]
    async fn register_rejects_duplicate_name() {
        let registry = ServiceRegistry::new();
        let runner: Arc<dyn Runner> = Arc::new(FakeRunner::new(ServiceName::new("svc")));
        let client: Arc<dyn McpClient> = Arc::new(FakeMcpClient::empty());
        let cancel = CancellationToken::new();
        let service =
            test_service("svc", vec![], runner.clone(), client_factory(client.clone()), registry.event_sink(), &cancel);
        registry.register(service).expect("first register");

        let duplicate =
            test_service("svc", vec![], runner, client_factory(client), registry.event_sink(), &cancel);
        let err = registry.register(duplicate).expect_err("duplicate rejected");
        assert!(matches!(err, RegistryError::DuplicateName(_)));
    }

    #[tokio::test]
    async fn subscribers_see_state_changed_events() {
        let registry = ServiceRegistry::new();
        let mut sub = registry.subscribe();
        let runner: Arc<dyn Runner> = Arc::new(FakeRunner::new(ServiceName::new("svc")));
        let client: Arc<dyn McpClient> = Arc::new(FakeMcpClient::empty());
        let cancel = CancellationToken::new();
        let service = test_service("svc", vec![], runner, client_factory(client), registry.event_sink(), &cancel);
        registry.register(service.clone()).expect("register");

        service.start().await.expect("start");

        let event = tokio::time::timeout(std::time::Duration::from_secs(1), sub.recv())
            .await
            .expect("timely event")
            .expect("event present");
        assert_eq!(event.name(), "service:state_changed");
    }

    #[tokio::test]
    async fn get_unknown_service_is_not_found() {
        let registry = ServiceRegistry::new();
        let err = registry.get(&ServiceName::new("ghost")).expect_err("not found");
        assert!(matches!(err, RegistryError::NotFound(_)));
    }
}
