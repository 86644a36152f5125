// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured logging setup (SPEC_FULL.md §10.1): a `fmt` layer to stderr
//! for interactive runs, plus a non-blocking rolling file writer under
//! the state directory, exactly as `oj-daemon` wires `tracing` in its
//! startup path.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber. The returned `WorkerGuard` must be
/// held for the process lifetime — dropping it flushes and stops the
/// background writer thread, so `main` keeps it alive until shutdown.
pub fn init(state_dir: &Path) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(state_dir)?;
    let file_appender = tracing_appender::rolling::daily(state_dir, "daemon.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry().with(filter).with(stderr_layer).with(file_layer).init();

    Ok(guard)
}
