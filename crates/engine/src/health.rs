// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health Monitor (spec §4.5): per-Service periodic `CheckHealth`, driven
//! by a cooperative timer that suspends while the Service is not
//! Running. Three consecutive failures flip health to Unhealthy; one
//! success flips back to Healthy.

use crate::service::Service;
use conduit_core::{Health, ServiceState};
use std::sync::Arc;
use std::time::Duration;

const FAILURE_THRESHOLD: u32 = 3;

/// Spawn the monitor task for one Service. Returns immediately; the task
/// runs until `service.cancellation()` fires (spec §4.5 "cancellation of
/// the Service's scheduling context stops the monitor promptly").
pub fn spawn(service: Arc<Service>, interval: Duration) -> tokio::task::JoinHandle<()> {
    // Intervals are already clamped to `MIN_HEALTH_CHECK_INTERVAL` when the
    // `ServiceDefinition` is built (`conduit-definitions::factory`); the
    // monitor trusts the value it's handed.
    tokio::spawn(async move {
        let mut consecutive_failures = 0u32;
        let cancel = service.cancellation().clone();
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.cancelled() => return,
            }

            if service.snapshot().state != ServiceState::Running {
                // Cooperative suspend: no point probing a Service that
                // isn't Running; re-check next tick.
                continue;
            }

            match service.check_health().await {
                Health::Healthy => {
                    consecutive_failures = 0;
                    service.set_health(Health::Healthy, None);
                }
                Health::Unhealthy => {
                    consecutive_failures += 1;
                    if consecutive_failures >= FAILURE_THRESHOLD {
                        service.set_health(Health::Unhealthy, None);
                    }
                }
                _ => {}
            }
        }
    })
}
