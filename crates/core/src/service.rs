// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service identity, kind, and the read-only snapshot shape (spec §3 "Service").
//!
//! The live `Service` object — the lifecycle task, its Runner/Client handles,
//! the state machine transitions of §4.1 — lives in `conduit-engine`, which
//! depends on this crate for the identity/data types. Keeping the data model
//! here (rather than alongside the lifecycle task) is what lets
//! `conduit-definitions` and `conduit-aggregator` depend only on the shapes
//! they need without pulling in the Orchestrator.

use crate::epoch::Epoch;
use crate::state::{Health, ServiceState};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::time::Duration;

/// A Service's name. Unique within its kind at definition-load time (spec
/// §4.9 validation rule); names are user-chosen (YAML `name:` field), not
/// generated, so this is a thin string newtype rather than a `define_id!`
/// random id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ServiceName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ServiceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for ServiceName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ServiceName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Discriminant for which Runner/Client binding drives a Service.
///
/// Per spec §9 design note: "The 'kind' discriminant lives in the
/// definition, not in the Service type" — this enum is carried on
/// `ServiceSnapshot`/definitions, not used for inheritance-style dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceKind {
    /// A local command run as a subprocess (§4.2 Process Runner).
    LocalCommand,
    /// A container run through the narrow `ContainerRuntime` capability set
    /// (§4.3 Container Runner).
    Container,
    /// A synthetic Service whose "runner" is a scripted sequence of
    /// aggregator tool calls (§4.10 Composite Service).
    Composite,
    /// A fixed in-process test double. Never produced by the Definition
    /// Store; exists so adapters/engine tests can exercise real lifecycle
    /// wiring without a subprocess or container.
    Mock,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServiceKind::LocalCommand => "localCommand",
            ServiceKind::Container => "container",
            ServiceKind::Composite => "composite",
            ServiceKind::Mock => "mock",
        })
    }
}

/// Per-Service restart policy (spec §4.1 Failure semantics).
///
/// §9 Open Question 3 pins the defaults: exponential backoff, initial 1s,
/// factor 2, cap 30s, reset on success — used unconditionally rather than
/// varying per definition source as the teacher's original does.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub enabled: bool,
    pub initial_backoff: Duration,
    pub factor: f64,
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_backoff: Duration::from_secs(1),
            factor: 2.0,
            cap: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub const DISABLED: RetryPolicy =
        RetryPolicy { enabled: false, initial_backoff: Duration::ZERO, factor: 1.0, cap: Duration::ZERO };

    /// Backoff delay for the given zero-based retry attempt, capped.
    /// Attempt 0 is the first Retrying transition after the initial Failed.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        if !self.enabled {
            return Duration::ZERO;
        }
        let scaled = self.initial_backoff.as_secs_f64() * self.factor.powi(attempt as i32);
        Duration::from_secs_f64(scaled.min(self.cap.as_secs_f64()))
    }
}

/// Minimum health-check interval (spec §4.5: "minimum 5s"); intervals below
/// this are clamped, not rejected (spec §8 boundary behavior).
pub const MIN_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Clamp a configured health-check interval to the minimum (spec §8).
pub fn clamp_health_check_interval(interval: Duration) -> Duration {
    if interval < MIN_HEALTH_CHECK_INTERVAL {
        MIN_HEALTH_CHECK_INTERVAL
    } else {
        interval
    }
}

/// Immutable, cheaply-cloned point-in-time view of a Service, handed out by
/// the Registry's `Get`/`List` and embedded in control-plane snapshots
/// (spec §6 `GetState`). Never mutated in place — a new snapshot is
/// produced each time the Service's lifecycle task updates its state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    pub name: ServiceName,
    pub kind: ServiceKind,
    pub state: ServiceState,
    pub health: Health,
    pub epoch: Epoch,
    pub last_error: Option<String>,
    /// Structured health-check failure detail, surfaced alongside
    /// `last_error` so an embedding TUI can explain *why* Unhealthy (see
    /// SPEC_FULL.md §11 "Supplemented features").
    pub last_health_error: Option<String>,
    pub has_runtime_handle: bool,
}

impl ServiceSnapshot {
    pub fn is_ready(&self) -> bool {
        crate::state::is_ready(self.state, self.health)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for_attempt(0), Duration::from_secs(1));
        assert_eq!(policy.backoff_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_for_attempt(2), Duration::from_secs(4));
        assert_eq!(policy.backoff_for_attempt(10), Duration::from_secs(30));
    }

    #[test]
    fn disabled_policy_never_backs_off() {
        assert_eq!(RetryPolicy::DISABLED.backoff_for_attempt(5), Duration::ZERO);
    }

    #[test]
    fn interval_below_minimum_is_clamped() {
        assert_eq!(clamp_health_check_interval(Duration::from_secs(1)), MIN_HEALTH_CHECK_INTERVAL);
        assert_eq!(clamp_health_check_interval(Duration::from_secs(60)), Duration::from_secs(60));
    }
}
