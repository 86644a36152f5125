// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `conduit`: a minimal embedding harness for the daemon's control
//! plane. Exposes `reload`, `restart-service`, and `get-state` — the
//! three control-plane verbs spec.md §6 names. The "real" CLI/TUI for
//! operators is out of scope (spec.md §1 Non-goals); this crate is a
//! thin, scriptable client over the aggregator's HTTP control plane,
//! grounded on oj-cli's command structure
//! (`crates/cli/src/commands/mod.rs`) but reduced to these three verbs.

mod client;
mod error;
mod output;

use client::DaemonClient;
use clap::{Parser, Subcommand};
use error::ExitError;
use output::OutputFormat;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "conduit", about = "Control-plane client for a running conduitd")]
struct Args {
    /// Base URL of the daemon's aggregator listener.
    #[arg(long, global = true, default_value = "http://127.0.0.1:8765")]
    daemon_url: String,
    /// Output format for command results.
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Re-read definitions and apply the diff (spec §6 `Reload`).
    Reload,
    /// Restart a single named Service (spec §6 `RestartService`).
    RestartService {
        /// Name of the Service to restart.
        name: String,
    },
    /// Print a snapshot of every known Service and the catalog's tool
    /// count (spec §6 `GetState`).
    GetState,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.code as u8)
        }
    }
}

async fn run(args: Args) -> Result<(), ExitError> {
    let client = DaemonClient::new(args.daemon_url);
    match args.command {
        Command::Reload => {
            let summary = client.reload().await?;
            output::print_reload(&summary, args.format);
        }
        Command::RestartService { name } => {
            client.restart_service(&name).await?;
            if args.format == OutputFormat::Text {
                println!("restarted {name}");
            }
        }
        Command::GetState => {
            let state = client.get_state().await?;
            output::print_state(&state, args.format);
        }
    }
    Ok(())
}
