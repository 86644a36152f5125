// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry/observer event types (spec §3 "Subscription", §4.6, §5).

use crate::epoch::Epoch;
use crate::service::{ServiceKind, ServiceName};
use crate::state::{Health, ServiceState};
use serde::{Deserialize, Serialize};

/// Classification applied to a Process Runner's scraped output lines
/// (spec §4.2: "classifies each line ... into one of {info, warn, error}").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Heuristic classification matching spec §4.2's fixed rule: lines
    /// containing `ERROR`/`FATAL` are Error, `WARN` is Warn, else Info.
    pub fn classify(line: &str) -> LogLevel {
        if line.contains("ERROR") || line.contains("FATAL") {
            LogLevel::Error
        } else if line.contains("WARN") {
            LogLevel::Warn
        } else {
            LogLevel::Info
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        })
    }
}

/// Everything the Registry fans out to subscribers, and everything the
/// Aggregator reacts to. One flat enum (rather than separate state/log
/// buses) so a single bounded per-subscriber channel (spec §4.6) carries
/// both without ordering races between them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// A Service's primary lifecycle state changed (spec §4.6: "(name,
    /// oldState, newState, health, error, epoch)").
    StateChanged {
        name: ServiceName,
        kind: ServiceKind,
        old_state: ServiceState,
        new_state: ServiceState,
        health: Health,
        error: Option<String>,
        epoch: Epoch,
    },
    /// A Service's health sub-state changed without a primary state
    /// transition (spec §4.1: "Health never drives the primary state").
    HealthChanged { name: ServiceName, old_health: Health, new_health: Health, error: Option<String> },
    /// A line scraped from a Process Runner's stdout/stderr, or an
    /// equivalent line surfaced by the Container Runner's log capture
    /// (spec §4.2).
    Log { name: ServiceName, level: LogLevel, line: String },
    /// Two Services advertise the same re-exposed tool name (spec §4.8
    /// step 2). The Service carrying `incoming` stays Running; its
    /// conflicting tool is hidden, not its whole catalog.
    ToolNameConflict { existing: String, incoming: String, owner: ServiceName },
    /// Emitted once when the Registry's bounded per-subscriber buffer
    /// overflowed and dropped events before this one was delivered (spec
    /// §4.6, §8 invariant 4: "a dropped-count is surfaced on the next
    /// delivered event").
    EventsDropped { count: u64 },
}

impl Event {
    /// Short, stable name used as a tracing field and in log lines —
    /// mirrors the dispatch-table idiom the teacher uses for its much
    /// larger `Event` enum.
    pub fn name(&self) -> &'static str {
        match self {
            Event::StateChanged { .. } => "service:state_changed",
            Event::HealthChanged { .. } => "service:health_changed",
            Event::Log { .. } => "service:log",
            Event::ToolNameConflict { .. } => "aggregator:tool_name_conflict",
            Event::EventsDropped { .. } => "registry:events_dropped",
        }
    }

    /// The Service this event concerns, if any (`EventsDropped` has none —
    /// it's a bus-wide signal, not tied to one Service).
    pub fn service_name(&self) -> Option<&ServiceName> {
        match self {
            Event::StateChanged { name, .. }
            | Event::HealthChanged { name, .. }
            | Event::Log { name, .. } => Some(name),
            Event::ToolNameConflict { owner, .. } => Some(owner),
            Event::EventsDropped { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_detects_error_before_warn() {
        assert_eq!(LogLevel::classify("FATAL: disk full"), LogLevel::Error);
        assert_eq!(LogLevel::classify("ERROR something broke"), LogLevel::Error);
        assert_eq!(LogLevel::classify("WARN: retrying"), LogLevel::Warn);
        assert_eq!(LogLevel::classify("listening on :8080"), LogLevel::Info);
    }

    #[test]
    fn event_name_is_stable_for_tracing() {
        let event = Event::EventsDropped { count: 3 };
        assert_eq!(event.name(), "registry:events_dropped");
        assert!(event.service_name().is_none());
    }
}
