// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Graceful `SIGTERM`/`SIGINT` handling (spec §6 "Exit behavior"),
//! grounded on `oj-daemon`'s signal-driven teardown
//! (`crates/daemon/src/engine/runtime/signal.rs`'s best-effort,
//! non-blocking capture-before-kill shape, generalized here to the whole
//! Orchestrator rather than one job's agent).

use conduit_engine::Orchestrator;
use std::sync::Arc;
use tracing::{error, info};

/// Waits for `SIGTERM` or `SIGINT`, then cancels the Orchestrator's root
/// scope and awaits the reverse-topological Stop. Returns the process
/// exit code: `0` if every Service stopped cleanly within its
/// `StopTimeout`, `1` if any did not (spec §6).
pub async fn wait_and_shutdown(orchestrator: Arc<Orchestrator>) -> i32 {
    wait_for_signal().await;
    info!("received shutdown signal, stopping all services");
    if orchestrator.shutdown().await {
        info!("clean shutdown");
        0
    } else {
        error!("one or more services failed to stop within their timeout");
        1
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(err) => {
            error!(%err, "failed to install SIGTERM handler; falling back to Ctrl-C only");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = sigterm.recv() => {}
        _ = tokio::signal::ctrl_c() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
