// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service lifecycle state machine.
//!
//! See the Service Orchestration Core spec §4.1. `ServiceState` never
//! carries data — per-transition detail (exit codes, error causes) lives on
//! `Service::last_error`, not in the state itself, so the state can be
//! compared and matched cheaply everywhere (Registry events, catalog
//! invalidation, control-plane snapshots).

use serde::{Deserialize, Serialize};

/// Primary lifecycle state of a Service.
///
/// Transitions are driven by the Orchestrator and the Service's own runner;
/// see `Service::transition` for the only place legal transitions are
/// enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceState {
    /// Initial state. Also the terminal rest-state for a Service whose
    /// dependency never became Running (spec §4.7 step 5: "Blocked").
    Unknown,
    /// Start has been issued; runner is spawning and/or the MCP Client is
    /// performing its handshake.
    Starting,
    /// Runtime handle is live and the MCP Client has initialized.
    Running,
    /// Stop has been issued; runner is terminating the runtime handle.
    Stopping,
    /// Runtime handle released and reaped (or a bounded stop wait expired).
    Stopped,
    /// The most recent Start or an in-Running runtime handle exited
    /// unexpectedly. `Service::last_error` carries the cause.
    Failed,
    /// Scheduled to retry a Start after the Failed retry-policy backoff.
    Retrying,
}

impl ServiceState {
    /// Whether a Service in this state counts as "ready" for dependents and
    /// catalog exposure — i.e. `Running`. Health is evaluated separately
    /// (spec §4.1: "health never drives the primary state").
    pub fn is_running(self) -> bool {
        matches!(self, ServiceState::Running)
    }

    /// Whether this is a stable rest-state the Orchestrator's start sweep
    /// can treat as "no further transition pending without external input".
    pub fn is_settled(self) -> bool {
        matches!(
            self,
            ServiceState::Unknown
                | ServiceState::Running
                | ServiceState::Stopped
                | ServiceState::Failed
        )
    }

    /// Whether a runtime handle is expected to be present in this state
    /// (Data Model invariant: non-null handle only in
    /// `{Running, Stopping, Retrying}`... Retrying itself has none yet, it
    /// is re-entering Starting).
    pub fn expects_runtime_handle(self) -> bool {
        matches!(self, ServiceState::Running | ServiceState::Stopping)
    }
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ServiceState::Unknown => "unknown",
            ServiceState::Starting => "starting",
            ServiceState::Running => "running",
            ServiceState::Stopping => "stopping",
            ServiceState::Stopped => "stopped",
            ServiceState::Failed => "failed",
            ServiceState::Retrying => "retrying",
        })
    }
}

/// Health sub-state (spec §4.1). Never feeds back into `ServiceState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Health {
    #[default]
    Unknown,
    Checking,
    Healthy,
    Unhealthy,
}

impl std::fmt::Display for Health {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Health::Unknown => "unknown",
            Health::Checking => "checking",
            Health::Healthy => "healthy",
            Health::Unhealthy => "unhealthy",
        })
    }
}

/// A Service is "ready" — ok for dependents to treat as satisfied, ok to
/// expose in the aggregator catalog — only when Running *and* not known
/// Unhealthy. Matches spec §4.1 ("not ready for catalog exposure and
/// dependency satisfaction") and §4.7 step 4 (re-evaluating the DAG).
pub fn is_ready(state: ServiceState, health: Health) -> bool {
    state.is_running() && !matches!(health, Health::Unhealthy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unhealthy_running_service_is_not_ready() {
        assert!(!is_ready(ServiceState::Running, Health::Unhealthy));
    }

    #[test]
    fn healthy_or_unknown_health_running_service_is_ready() {
        assert!(is_ready(ServiceState::Running, Health::Healthy));
        assert!(is_ready(ServiceState::Running, Health::Unknown));
    }

    #[test]
    fn non_running_states_are_never_ready_regardless_of_health() {
        for state in [
            ServiceState::Unknown,
            ServiceState::Starting,
            ServiceState::Stopping,
            ServiceState::Stopped,
            ServiceState::Failed,
            ServiceState::Retrying,
        ] {
            assert!(!is_ready(state, Health::Healthy));
        }
    }
}
