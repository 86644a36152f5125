// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound transport bindings for the Aggregator (spec §4.8 "Inbound
//! transport", §6 `aggregator.transport`). Both variants share the exact
//! same JSON-RPC dispatch (`crate::rpc::dispatch`); they differ only in
//! how the response is framed onto the wire.

pub mod http;
pub mod sse;

use crate::aggregator::Aggregator;
use axum::Router;
use conduit_definitions::config::TransportKind;
use std::sync::Arc;

/// Build the axum `Router` matching the configured transport (spec §6
/// `aggregator.transport`, default `streamable-http`). `Stdio` is served
/// by `conduit-daemon` directly over the process's own stdio, not over
/// HTTP, so it has no router here; callers that reach this branch with
/// `Stdio` configured have nothing to bind and fall back to the
/// streamable-HTTP router so the daemon's health port still answers.
pub fn router(aggregator: Arc<Aggregator>, transport: TransportKind) -> Router {
    match transport {
        TransportKind::Sse => sse::router(aggregator),
        TransportKind::StreamableHttp | TransportKind::Stdio => http::router(aggregator),
    }
}
