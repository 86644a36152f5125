// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! conduit-engine: the live Service Orchestration Core (spec §4.1,
//! §4.5–§4.7, §4.10).
//!
//! `conduit-core` carries the data model; `conduit-adapters` carries the
//! Runner/Client capability traits; this crate is where they come
//! together into a supervised, running `Service` (§4.1), its Health
//! Monitor (§4.5), the `ServiceRegistry` pub/sub index (§4.6), the DAG
//! `Orchestrator` (§4.7), and the Composite/Service-Class runner (§4.10).
//! `conduit-aggregator` depends on this crate for the Registry and Service
//! handles it routes tool calls through.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod binding;
pub mod composite;
pub mod error;
pub mod health;
pub mod orchestrator;
pub mod registry;
pub mod service;

pub use binding::{bind, BindingError, ContainerRuntimes};
pub use composite::{composite_client_factory, CompositeArgs, CompositeHealthClient, CompositeRunner};
pub use error::{OrchestratorError, RegistryError, ServiceError};
pub use health::spawn as spawn_health_monitor;
pub use orchestrator::{Orchestrator, ReloadSummary, StartSummary};
pub use registry::{ServiceRegistry, Subscription, DEFAULT_SUBSCRIBER_BUFFER};
pub use service::{ClientFactory, Service};
