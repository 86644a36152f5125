// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `conduitd`: the binary entry point. Resolves configuration
//! directories, boots the Orchestrator and Aggregator, serves the merged
//! HTTP surface, and shuts down cleanly on signal (spec §6).

use clap::Parser;
use conduit_aggregator::Aggregator;
use conduit_daemon::{app, logging, paths, shutdown, Supervisor};
use conduit_definitions::DefinitionStore;
use conduit_engine::{ContainerRuntimes, Orchestrator};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "conduitd", about = "Orchestrates MCP tool servers and serves the aggregated catalog")]
struct Args {
    /// Project-layer configuration directory (default: ./.conduit).
    #[arg(long)]
    config_dir: Option<PathBuf>,
    /// Directory for logs and other runtime state.
    #[arg(long)]
    state_dir: Option<PathBuf>,
    /// Use the Kubernetes container runtime, in the given namespace,
    /// instead of the Docker CLI (spec §4.3, §6 `defaultContainerRuntime`).
    #[arg(long)]
    kube_namespace: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let state_dir = paths::state_dir(args.state_dir);
    let _log_guard = match logging::init(&state_dir) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("failed to initialize logging: {err}");
            return ExitCode::FAILURE;
        }
    };

    match run(args).await {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            error!(%err, "daemon exited with error");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<i32, conduit_daemon::LifecycleError> {
    let project_dir = paths::project_config_dir(args.config_dir);
    let user_dir = paths::user_config_dir();
    let store = DefinitionStore::new(user_dir, project_dir);

    let container_runtimes = match args.kube_namespace {
        Some(namespace) => ContainerRuntimes::with_kube(namespace).await?,
        None => ContainerRuntimes::docker_only(),
    };
    let orchestrator = Orchestrator::new(container_runtimes);

    let initial = store.reload()?;
    for violation in &initial.validation_errors {
        tracing::warn!(%violation, "definition validation error; entry excluded");
    }
    let aggregator_config = initial.aggregator.clone();
    let aggregator = Aggregator::new(Arc::clone(orchestrator.registry()), aggregator_config.tool_prefix.clone());
    aggregator.spawn_driver();

    let supervisor = Arc::new(Supervisor::new(store, Arc::clone(&orchestrator), Arc::clone(&aggregator)));
    let summary = supervisor.bootstrap().await?;
    info!(
        started = summary.started.len(),
        failed = summary.failed.len(),
        blocked = summary.blocked.len(),
        "initial start sweep complete"
    );

    if !aggregator_config.enabled {
        info!("aggregator disabled in configuration; running orchestrator only");
        let code = shutdown::wait_and_shutdown(orchestrator).await;
        return Ok(code);
    }

    let router = app(Arc::clone(&supervisor), Arc::clone(&aggregator), &aggregator_config);
    let addr = format!("{}:{}", aggregator_config.host, aggregator_config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "aggregator listening");

    let orchestrator_for_shutdown = Arc::clone(&orchestrator);
    let (exit_code_tx, exit_code_rx) = tokio::sync::oneshot::channel();
    let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
        let code = shutdown::wait_and_shutdown(orchestrator_for_shutdown).await;
        let _ = exit_code_tx.send(code);
    });

    if let Err(err) = serve.await {
        error!(%err, "http server error");
    }
    Ok(exit_code_rx.await.unwrap_or(0))
}
