// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency edge data type (spec §3 "Dependency Edge").
//!
//! The graph-build/cycle-detection/topological-order algorithms that
//! consume these edges live in `conduit-engine::graph` — this crate only
//! carries the edge shape so `conduit-definitions` can produce them without
//! depending on the Orchestrator.

use crate::service::ServiceName;
use serde::{Deserialize, Serialize};

/// Directed edge `from -> to` meaning "`from` cannot be Starting until `to`
/// is Running" (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: ServiceName,
    pub to: ServiceName,
}

impl DependencyEdge {
    pub fn new(from: impl Into<ServiceName>, to: impl Into<ServiceName>) -> Self {
        Self { from: from.into(), to: to.into() }
    }
}
