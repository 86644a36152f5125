// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test builders shared across crates (enabled via the `test-support` feature).

use crate::epoch::Epoch;
use crate::service::{ServiceKind, ServiceName, ServiceSnapshot};
use crate::state::{Health, ServiceState};

crate::builder! {
    pub struct ServiceSnapshotBuilder => ServiceSnapshot {
        into { name: ServiceName = "test-service" }
        set {
            kind: ServiceKind = ServiceKind::LocalCommand,
            state: ServiceState = ServiceState::Unknown,
            health: Health = Health::Unknown,
            epoch: Epoch = Epoch::ZERO,
            has_runtime_handle: bool = false
        }
        option {
            last_error: String = None,
            last_health_error: String = None
        }
    }
}
