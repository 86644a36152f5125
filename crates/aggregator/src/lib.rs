// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! conduit-aggregator: the single external tool surface (spec §4.8).
//!
//! Wraps a `conduit_engine::ServiceRegistry` with a namespaced `Catalog`
//! kept live off Registry events, and serves it over whichever inbound
//! transport the configuration names (streamable-HTTP by default, or
//! SSE) as one JSON-RPC `initialize`/`tools/list`/`tools/call` surface
//! (spec §6). `conduit-daemon` owns the HTTP listener; this crate only
//! builds the `axum::Router` it binds.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod aggregator;
pub mod catalog;
pub mod error;
pub mod rpc;
pub mod transport;

pub use aggregator::Aggregator;
pub use catalog::{Catalog, ToolNameConflict};
pub use error::AggregatorError;
pub use transport::router;
