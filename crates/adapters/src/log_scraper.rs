// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared stdout/stderr line handling for the Process and Container
//! Runners (spec §4.2): classify each line, re-emit it to the logging
//! sink tagged with the Service's subsystem, and watch for a readiness
//! sentinel.

use conduit_core::{LogLevel, ServiceName};

/// Fixed readiness-sentinel phrase set (spec §4.2: "scanning output for
/// any of a fixed phrase set"). Matched as a substring, case-sensitively,
/// against each scraped line.
pub const READY_SENTINELS: &[&str] = &[
    "Application startup complete",
    "Server started successfully",
    "Ready to accept connections",
];

/// Whether `line` contains one of the fixed readiness sentinels.
pub fn is_ready_sentinel(line: &str) -> bool {
    READY_SENTINELS.iter().any(|sentinel| line.contains(sentinel))
}

/// Classify `line` and re-emit it as a `tracing` event tagged with the
/// owning Service's name as a `subsystem` field (spec §4.2 "re-emits them
/// to the logging sink under a subsystem label derived from the Service
/// name"). Returns the classification so the caller can also forward it
/// as a `RunnerSignal::Log` to the Service's lifecycle task.
pub fn classify_and_emit(service: &ServiceName, line: &str) -> LogLevel {
    let level = LogLevel::classify(line);
    match level {
        LogLevel::Error => tracing::error!(subsystem = %service, "{line}"),
        LogLevel::Warn => tracing::warn!(subsystem = %service, "{line}"),
        LogLevel::Info => tracing::info!(subsystem = %service, "{line}"),
    }
    level
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_each_fixed_sentinel_phrase() {
        assert!(is_ready_sentinel("2026-01-01 INFO Application startup complete."));
        assert!(is_ready_sentinel("Server started successfully on :8080"));
        assert!(is_ready_sentinel("Ready to accept connections"));
        assert!(!is_ready_sentinel("still booting..."));
    }

    #[test]
    fn classify_and_emit_returns_the_same_classification_as_core() {
        let name = ServiceName::new("alpha");
        assert_eq!(classify_and_emit(&name, "ERROR disk full"), LogLevel::Error);
        assert_eq!(classify_and_emit(&name, "WARN retrying"), LogLevel::Warn);
        assert_eq!(classify_and_emit(&name, "listening"), LogLevel::Info);
    }
}
