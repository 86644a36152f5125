// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server-Sent-Event framing for the Aggregator's SSE transport option
//! (spec §4.8, §6 `aggregator.transport: sse`).
//!
//! `conduit-aggregator` picks this module's encoding only when configured
//! for `sse`; the default `streamable-http` transport sends a bare JSON
//! body per request/response and never touches this module (see
//! `conduit_aggregator::transport`).

use std::fmt::Write as _;

/// One `data:`-framed SSE event. `event` names the logical channel (the
/// aggregator emits `message` for JSON-RPC responses); `id` lets a client
/// resume with `Last-Event-ID` after a reconnect.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    pub id: Option<String>,
    pub event: Option<String>,
    pub data: String,
}

impl SseEvent {
    pub fn message(id: impl Into<String>, data: impl Into<String>) -> Self {
        Self { id: Some(id.into()), event: Some("message".to_string()), data: data.into() }
    }
}

/// Render one SSE event per the `text/event-stream` line format: each
/// field on its own `field: value` line, multi-line `data` split across
/// several `data:` lines, terminated by a blank line.
pub fn encode_event(event: &SseEvent) -> String {
    let mut out = String::new();
    if let Some(id) = &event.id {
        let _ = writeln!(out, "id: {id}");
    }
    if let Some(name) = &event.event {
        let _ = writeln!(out, "event: {name}");
    }
    for line in event.data.split('\n') {
        let _ = writeln!(out, "data: {line}");
    }
    out.push('\n');
    out
}
