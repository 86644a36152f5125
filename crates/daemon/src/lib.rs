// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! conduit-daemon: the embedding process that wires a `DefinitionStore`,
//! an `Orchestrator`, and an `Aggregator` together and serves the
//! control plane and tool surface over HTTP (spec §6).

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod control;
pub mod error;
pub mod logging;
pub mod paths;
pub mod shutdown;
pub mod supervisor;

pub use error::LifecycleError;
pub use supervisor::Supervisor;

use axum::Router;
use conduit_aggregator::Aggregator;
use conduit_definitions::config::AggregatorConfig;
use std::sync::Arc;

/// Merge the Aggregator's tool-surface router with the control-plane
/// router under one listener (spec §6: one process, one external
/// surface). The Aggregator owns `/`; control-plane operations live
/// under `/control`.
pub fn app(supervisor: Arc<Supervisor>, aggregator: Arc<Aggregator>, aggregator_config: &AggregatorConfig) -> Router {
    let tool_surface = conduit_aggregator::router(aggregator, aggregator_config.transport);
    let control_plane = control::router(supervisor);
    Router::new().merge(tool_surface).nest("/control", control_plane)
}
